use std::fmt;

/// A script value. Objects are handles into the interpreter's object table.
#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObject),
}

// Strings are sequences of UTF-16 code units so that `length` and indexing
// agree with the language's string model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        let mut code_units = Vec::with_capacity(self.len() + other.len());
        code_units.extend_from_slice(&self.code_units);
        code_units.extend_from_slice(&other.code_units);
        JsString { code_units }
    }

    pub fn index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let s_len = self.code_units.len();
        let search_len = search.code_units.len();
        if search_len == 0 {
            return if from <= s_len { Some(from) } else { None };
        }
        if from + search_len > s_len {
            return None;
        }
        (from..=(s_len - search_len))
            .find(|&i| self.code_units[i..i + search_len] == search.code_units[..])
    }

    pub fn slice_utf16(&self, start: usize, end: usize) -> JsString {
        let s = start.min(self.code_units.len());
        let e = end.min(self.code_units.len());
        if s >= e {
            return JsString { code_units: vec![] };
        }
        JsString {
            code_units: self.code_units[s..e].to_vec(),
        }
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::from_str(s)
    }
}

/// Handle to an object record; identity is the slot id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsObject {
    pub id: u64,
}

impl JsValue {
    pub fn str(s: &str) -> Self {
        JsValue::String(JsString::from_str(s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsValue::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, JsValue::Number(n) if n.is_nan())
    }

    pub fn as_object_id(&self) -> Option<u64> {
        match self {
            JsValue::Object(o) => Some(o.id),
            _ => None,
        }
    }
}

/// Number operations. Every bitwise operator goes through
/// `to_int32`/`to_uint32`, which reduce modulo 2^32.
pub mod number_ops {
    const TWO_32: f64 = 4294967296.0;

    pub fn unary_minus(x: f64) -> f64 {
        -x
    }

    pub fn bitwise_not(x: f64) -> f64 {
        f64::from(!to_int32(x))
    }

    pub fn exponentiate(base: f64, exp: f64) -> f64 {
        if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
            return f64::NAN;
        }
        base.powf(exp)
    }

    pub fn remainder(x: f64, y: f64) -> f64 {
        // Rust's `%` on f64 is fmod, which keeps the dividend's sign.
        x % y
    }

    /// `<<` shifts the Int32 operand in 64-bit space without wrapping, so
    /// `1 << 31` is 2147483648 while `-1 << 1` stays -2.
    pub fn left_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        (i64::from(to_int32(x)) << shift) as f64
    }

    pub fn signed_right_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        f64::from(to_int32(x).wrapping_shr(shift))
    }

    pub fn unsigned_right_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        f64::from(to_uint32(x).wrapping_shr(shift))
    }

    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        if x.is_nan() || y.is_nan() {
            None
        } else {
            Some(x < y)
        }
    }

    pub fn same_value(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        if x == 0.0 && y == 0.0 {
            return x.is_sign_positive() == y.is_sign_positive();
        }
        x == y
    }

    pub fn bitwise_and(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) & to_int32(y))
    }

    pub fn bitwise_xor(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) ^ to_int32(y))
    }

    pub fn bitwise_or(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) | to_int32(y))
    }

    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }

    pub fn to_uint32(x: f64) -> u32 {
        if !x.is_finite() {
            return 0;
        }
        // rem_euclid keeps the result in [0, 2^32) for negative inputs too
        x.trunc().rem_euclid(TWO_32) as u32
    }

    pub fn to_int32(x: f64) -> i32 {
        to_uint32(x) as i32
    }

    /// Canonical array index (`"0"`, `"17"`, never `"01"` or `"-1"`).
    pub fn parse_array_index(key: &str) -> Option<u32> {
        if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
            return None;
        }
        if !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        key.parse::<u32>().ok().filter(|&n| n != u32::MAX)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}
