use super::*;

/// RequireObjectCoercible followed by ToString on `this`.
fn this_string(interp: &mut Interpreter, this: &JsValue, method: &str) -> Result<JsString, JsValue> {
    if this.is_nullish() {
        return Err(interp.create_type_error(&format!(
            "String.prototype.{method} called on null or undefined"
        )));
    }
    interp.to_jsstring_value(this)
}

fn position_arg(interp: &mut Interpreter, args: &[JsValue], i: usize) -> Result<f64, JsValue> {
    match arg(args, i) {
        JsValue::Undefined => Ok(0.0),
        v => Ok(to_integer_or_infinity(interp.to_number_value(&v)?)),
    }
}

/// Clamps a relative index (negative counts from the end) into `0..=len`.
fn relative_index(pos: f64, len: usize) -> usize {
    let len_f = len as f64;
    if pos < 0.0 {
        (len_f + pos).max(0.0) as usize
    } else {
        pos.min(len_f) as usize
    }
}

impl Interpreter {
    pub(super) fn setup_string(&mut self, proto: &ObjectRef) {
        self.define_constructor("String", 1, proto, |interp, _this, args| {
            let constructing = interp.new_target.take().is_some();
            let s = match args.first() {
                Some(v) => JsValue::String(try_result!(interp.to_jsstring_value(v))),
                None => JsValue::str(""),
            };
            if constructing {
                Completion::Normal(interp.create_wrapper(&s))
            } else {
                Completion::Normal(s)
            }
        });

        self.define_method(proto, "charAt", 1, |interp, this, args| {
            let s = try_result!(this_string(interp, this, "charAt"));
            let pos = try_result!(position_arg(interp, args, 0));
            if pos < 0.0 || pos >= s.len() as f64 {
                return Completion::Normal(JsValue::str(""));
            }
            let i = pos as usize;
            Completion::Normal(JsValue::String(s.slice_utf16(i, i + 1)))
        });
        self.define_method(proto, "charCodeAt", 1, |interp, this, args| {
            let s = try_result!(this_string(interp, this, "charCodeAt"));
            let pos = try_result!(position_arg(interp, args, 0));
            if pos < 0.0 || pos >= s.len() as f64 {
                return Completion::Normal(JsValue::Number(f64::NAN));
            }
            Completion::Normal(JsValue::Number(s.code_units[pos as usize] as f64))
        });
        self.define_method(proto, "indexOf", 1, |interp, this, args| {
            let s = try_result!(this_string(interp, this, "indexOf"));
            let search = try_result!(interp.to_jsstring_value(&arg(args, 0)));
            let pos = try_result!(position_arg(interp, args, 1));
            let start = pos.clamp(0.0, s.len() as f64) as usize;
            let found = s.index_of(&search, start).map_or(-1.0, |i| i as f64);
            Completion::Normal(JsValue::Number(found))
        });
        self.define_method(proto, "slice", 2, |interp, this, args| {
            let s = try_result!(this_string(interp, this, "slice"));
            let len = s.len();
            let start = relative_index(try_result!(position_arg(interp, args, 0)), len);
            let end = match arg(args, 1) {
                JsValue::Undefined => len,
                v => relative_index(
                    to_integer_or_infinity(try_result!(interp.to_number_value(&v))),
                    len,
                ),
            };
            if start >= end {
                return Completion::Normal(JsValue::str(""));
            }
            Completion::Normal(JsValue::String(s.slice_utf16(start, end)))
        });
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            match this_primitive(interp, this, "String") {
                Some(v) => Completion::Normal(v),
                None => interp.throw_type_error("String.prototype.toString requires a String"),
            }
        });
        self.define_method(proto, "valueOf", 0, |interp, this, _args| {
            match this_primitive(interp, this, "String") {
                Some(v) => Completion::Normal(v),
                None => interp.throw_type_error("String.prototype.valueOf requires a String"),
            }
        });
    }
}
