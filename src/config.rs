/// Interpreter settings. The CLI fills these from its flags; embedders use
/// `Config::default()` and override what they need.
#[derive(Debug, Clone)]
pub struct Config {
    /// Nested calls allowed before a RangeError is thrown.
    pub max_call_depth: usize,
    /// Install `assert`, `assert_throws` and `println`.
    pub harness: bool,
    /// Treat global code as strict.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 400,
            harness: true,
            strict: false,
        }
    }
}
