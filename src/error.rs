/// Lexing and parsing errors.
///
/// Defines the error types raised before evaluation starts: lexical errors
/// (unrecognized characters, malformed numerals) and syntax errors
/// (structurally invalid token sequences from either parser). Both carry
/// precise source positions.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation, such as
/// unknown identifiers, wrong operand types, division by zero, or calling
/// something that is not a function.
pub mod runtime_error;

pub use parse_error::{LexicalError, SyntaxError};
pub use runtime_error::RuntimeError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Any error the pipeline can produce, tagged by phase.
///
/// Each phase keeps its own error type; this enum exists for the drivers
/// and entry points, which need a single type with a stable status code.
pub enum Error {
    /// The tokenizer rejected the raw input. Status code 1.
    Lexical(LexicalError),
    /// A parser rejected the token sequence. Status code 2.
    Syntax(SyntaxError),
    /// Evaluation failed. Status code 3.
    Runtime(RuntimeError),
}

impl Error {
    /// Gets the process status code this error maps to.
    ///
    /// The codes are part of the external contract: 1 for lexical errors,
    /// 2 for syntax errors, 3 for runtime errors.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Lexical(_) => 1,
            Self::Syntax(_) => 2,
            Self::Runtime(_) => 3,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexical(e) => write!(f, "{e}"),
            Self::Syntax(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexicalError> for Error {
    fn from(e: LexicalError) -> Self {
        Self::Lexical(e)
    }
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}
