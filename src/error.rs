use crate::parser::ParseError;
use crate::types::JsValue;
use thiserror::Error;

/// Failures surfaced to the host. Script-level errors stay inside the
/// engine as thrown values until they escape the top level.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Uncaught {rendered}")]
    Uncaught { value: JsValue, rendered: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::Uncaught { .. } => 1,
            EngineError::Parse(_) | EngineError::Io(_) => 2,
        }
    }
}
