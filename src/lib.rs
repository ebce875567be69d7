//! Evaluation core for a small prototype-based scripting language: value
//! model and coercions, operators, environments and a statement executor
//! with completion records.

pub mod ast;
pub mod config;
pub mod error;
pub mod harness;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use config::Config;
pub use error::EngineError;
pub use interpreter::{Completion, Interpreter};
pub use types::JsValue;
