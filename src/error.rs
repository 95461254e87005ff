/// Parsing errors.
///
/// Defines all error types that can occur during tokenizing and parsing of
/// source code: syntax mistakes, unexpected or invalid tokens, static type
/// mismatches, unresolved names and include/import failures.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during execution. Runtime
/// errors carry a catchable name used by exception handlers.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Any failure surfaced by the top-level drivers.
#[derive(Debug)]
pub enum Error {
    /// The source did not parse.
    Parse(ParseError),
    /// Execution failed with an error no handler caught.
    Runtime(RuntimeError),
    /// Reading the source or flushing output failed.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Runtime(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
