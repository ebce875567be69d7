use super::*;

fn length_of_array_like(interp: &mut Interpreter, o: &JsValue) -> Result<usize, JsValue> {
    let len_val = match interp.get_member(o, "length") {
        Completion::Normal(v) => v,
        Completion::Throw(e) => return Err(e),
        _ => JsValue::Undefined,
    };
    let len = to_integer_or_infinity(interp.to_number_value(&len_val)?);
    if len <= 0.0 {
        return Ok(0);
    }
    Ok(len.min(9007199254740991.0) as usize)
}

fn obj_get(interp: &mut Interpreter, o: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    match interp.get_member(o, key) {
        Completion::Normal(v) => Ok(v),
        Completion::Throw(e) => Err(e),
        _ => Ok(JsValue::Undefined),
    }
}

fn obj_set(interp: &mut Interpreter, o: &JsValue, key: &str, value: JsValue) -> Result<(), JsValue> {
    match interp.set_member(o, key, value, true) {
        Completion::Throw(e) => Err(e),
        _ => Ok(()),
    }
}

/// Elements `0..length` of an array-like, for `apply`.
pub(crate) fn list_from_array_like(
    interp: &mut Interpreter,
    o: &JsValue,
) -> Result<Vec<JsValue>, JsValue> {
    let len = length_of_array_like(interp, o)?;
    (0..len).map(|i| obj_get(interp, o, &i.to_string())).collect()
}

fn join(interp: &mut Interpreter, this: &JsValue, separator: &JsValue) -> Result<JsValue, JsValue> {
    let o = interp.to_object(this)?;
    let len = length_of_array_like(interp, &o)?;
    let sep = match separator {
        JsValue::Undefined => JsString::from_str(","),
        v => interp.to_jsstring_value(v)?,
    };
    let mut out: Vec<u16> = Vec::new();
    for i in 0..len {
        if i > 0 {
            out.extend_from_slice(&sep.code_units);
        }
        let elem = obj_get(interp, &o, &i.to_string())?;
        if !elem.is_nullish() {
            out.extend(interp.to_jsstring_value(&elem)?.code_units);
        }
    }
    Ok(JsValue::String(JsString { code_units: out }))
}

impl Interpreter {
    pub(super) fn setup_array(&mut self, proto: &ObjectRef) {
        let Some(ctor) = self.define_constructor("Array", 1, proto, |interp, _this, args| {
            interp.new_target.take();
            if let [JsValue::Number(n)] = args {
                let len = *n;
                if len < 0.0 || len.fract() != 0.0 || len > u32::MAX as f64 {
                    return Completion::Throw(interp.create_range_error("Invalid array length"));
                }
                return Completion::Normal(interp.create_array_with_holes(vec![None; len as usize]));
            }
            Completion::Normal(interp.create_array(args.to_vec()))
        }) else {
            return;
        };

        self.define_method(&ctor, "isArray", 1, |interp, _this, args| {
            let is_array = interp
                .object_of(&arg(args, 0))
                .is_some_and(|o| o.borrow().class_name == "Array");
            Completion::Normal(JsValue::Boolean(is_array))
        });

        self.define_method(proto, "push", 1, |interp, this, args| {
            let o = try_result!(interp.to_object(this));
            let mut len = try_result!(length_of_array_like(interp, &o));
            for v in args {
                try_result!(obj_set(interp, &o, &len.to_string(), v.clone()));
                len += 1;
            }
            let new_len = JsValue::Number(len as f64);
            try_result!(obj_set(interp, &o, "length", new_len.clone()));
            Completion::Normal(new_len)
        });
        self.define_method(proto, "pop", 0, |interp, this, _args| {
            let o = try_result!(interp.to_object(this));
            let len = try_result!(length_of_array_like(interp, &o));
            if len == 0 {
                try_result!(obj_set(interp, &o, "length", JsValue::Number(0.0)));
                return Completion::Normal(JsValue::Undefined);
            }
            let key = (len - 1).to_string();
            let elem = try_result!(obj_get(interp, &o, &key));
            if let Some(obj) = interp.object_of(&o) {
                obj.borrow_mut().delete_property(&key);
            }
            try_result!(obj_set(interp, &o, "length", JsValue::Number((len - 1) as f64)));
            Completion::Normal(elem)
        });
        self.define_method(proto, "join", 1, |interp, this, args| {
            Completion::Normal(try_result!(join(interp, this, &arg(args, 0))))
        });
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            Completion::Normal(try_result!(join(interp, this, &JsValue::Undefined)))
        });
        self.define_method(proto, "indexOf", 1, |interp, this, args| {
            let o = try_result!(interp.to_object(this));
            let len = try_result!(length_of_array_like(interp, &o));
            let target = arg(args, 0);
            let mut start = match arg(args, 1) {
                JsValue::Undefined => 0.0,
                v => to_integer_or_infinity(try_result!(interp.to_number_value(&v))),
            };
            if start < 0.0 {
                start = (len as f64 + start).max(0.0);
            }
            let Some(obj) = interp.object_of(&o) else {
                return Completion::Normal(JsValue::Number(-1.0));
            };
            let mut i = start;
            while i < len as f64 {
                let key = (i as usize).to_string();
                if obj.borrow().has_property(&key) {
                    let elem = try_result!(obj_get(interp, &o, &key));
                    if strict_equality(&elem, &target) {
                        return Completion::Normal(JsValue::Number(i));
                    }
                }
                i += 1.0;
            }
            Completion::Normal(JsValue::Number(-1.0))
        });
    }
}
