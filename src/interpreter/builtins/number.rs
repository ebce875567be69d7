use super::*;

/// `parseInt`: leading whitespace and sign, optional `0x` prefix, then as
/// many digits of `radix` as are present.
pub(crate) fn parse_int(input: &str, radix: f64) -> f64 {
    let mut radix = if radix.is_nan() || radix.is_infinite() {
        0
    } else {
        number_ops::to_int32(radix)
    };
    let s = input.trim_start_matches(is_js_whitespace);
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let has_hex_prefix = s.starts_with("0x") || s.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let s = if radix == 16 && has_hex_prefix { &s[2..] } else { s };

    let mut result = 0.0;
    let mut found_digit = false;
    for ch in s.chars() {
        let Some(digit) = ch.to_digit(36).filter(|d| (*d as i32) < radix) else {
            break;
        };
        found_digit = true;
        result = result * radix as f64 + digit as f64;
    }
    if !found_digit {
        return f64::NAN;
    }
    if negative { -result } else { result }
}

/// `parseFloat`: the longest prefix that reads as a decimal literal.
pub(crate) fn parse_float(input: &str) -> f64 {
    let s = input.trim_start_matches(is_js_whitespace);
    let unsigned = s.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") && s.len() - unsigned.len() <= 1 {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number_radix(n: f64, radix: u32) -> String {
    let negative = n < 0.0;
    let x = n.abs();
    let mut int_part = x.trunc();
    let mut frac = x - int_part;

    let mut digits = Vec::new();
    loop {
        let d = (int_part % radix as f64) as u32;
        digits.push(char::from_digit(d, radix).unwrap_or('0'));
        int_part = (int_part / radix as f64).trunc();
        if int_part < 1.0 {
            break;
        }
    }
    let mut result: String = digits.into_iter().rev().collect();

    if frac != 0.0 {
        result.push('.');
        for _ in 0..20 {
            frac *= radix as f64;
            let digit = frac.trunc() as u32;
            result.push(char::from_digit(digit, radix).unwrap_or('0'));
            frac -= digit as f64;
            if frac < 1e-10 {
                break;
            }
        }
    }

    if negative { format!("-{result}") } else { result }
}

fn this_number_value(interp: &Interpreter, this: &JsValue) -> Option<f64> {
    match this_primitive(interp, this, "Number")? {
        JsValue::Number(n) => Some(n),
        _ => None,
    }
}

impl Interpreter {
    pub(super) fn setup_number(&mut self, proto: &ObjectRef) {
        let Some(ctor) = self.define_constructor("Number", 1, proto, |interp, _this, args| {
            let constructing = interp.new_target.take().is_some();
            let n = match args.first() {
                Some(v) => try_result!(interp.to_number_value(v)),
                None => 0.0,
            };
            if constructing {
                Completion::Normal(interp.create_wrapper(&JsValue::Number(n)))
            } else {
                Completion::Normal(JsValue::Number(n))
            }
        }) else {
            return;
        };
        {
            let mut c = ctor.borrow_mut();
            for (name, value) in [
                ("MAX_VALUE", f64::MAX),
                ("MIN_VALUE", 5e-324),
                ("NaN", f64::NAN),
                ("POSITIVE_INFINITY", f64::INFINITY),
                ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
                ("MAX_SAFE_INTEGER", 9007199254740991.0),
                ("MIN_SAFE_INTEGER", -9007199254740991.0),
            ] {
                c.insert_property(
                    name.to_string(),
                    PropertyDescriptor::data(JsValue::Number(value), false, false, false),
                );
            }
        }

        self.define_method(proto, "toString", 1, |interp, this, args| {
            let Some(n) = this_number_value(interp, this) else {
                return interp.throw_type_error("Number.prototype.toString requires a Number");
            };
            let radix = match arg(args, 0) {
                JsValue::Undefined => 10.0,
                v => to_integer_or_infinity(try_result!(interp.to_number_value(&v))),
            };
            if !(2.0..=36.0).contains(&radix) {
                return Completion::Throw(
                    interp.create_range_error("toString() radix must be between 2 and 36"),
                );
            }
            let text = if radix == 10.0 || !n.is_finite() || n == 0.0 {
                number_ops::to_string(n)
            } else {
                format_number_radix(n, radix as u32)
            };
            Completion::Normal(JsValue::str(&text))
        });
        self.define_method(proto, "valueOf", 0, |interp, this, _args| {
            match this_number_value(interp, this) {
                Some(n) => Completion::Normal(JsValue::Number(n)),
                None => interp.throw_type_error("Number.prototype.valueOf requires a Number"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_prefixes_and_radix() {
        assert_eq!(parse_int("  42px", f64::NAN), 42.0);
        assert_eq!(parse_int("-0x1F", 0.0), -31.0);
        assert_eq!(parse_int("0x1F", 16.0), 31.0);
        assert_eq!(parse_int("101", 2.0), 5.0);
        assert_eq!(parse_int("z", 36.0), 35.0);
        assert!(parse_int("9", 8.0).is_nan());
        assert!(parse_int("12", 1.0).is_nan());
        assert!(parse_int("", 10.0).is_nan());
    }

    #[test]
    fn parse_float_takes_longest_prefix() {
        assert_eq!(parse_float("3.25abc"), 3.25);
        assert_eq!(parse_float("  -.5"), -0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("-Infinityx"), f64::NEG_INFINITY);
        assert!(parse_float(".").is_nan());
        assert!(parse_float("abc").is_nan());
    }

    #[test]
    fn radix_formatting() {
        assert_eq!(format_number_radix(255.0, 16), "ff");
        assert_eq!(format_number_radix(-5.0, 2), "-101");
        assert_eq!(format_number_radix(0.5, 2), "0.1");
    }
}
