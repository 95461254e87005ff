use crate::interpreter::lexer::Position;

#[derive(Debug, Clone, PartialEq)]
/// Represents all errors that can occur during tokenizing or parsing.
///
/// Every variant carries the source position at which the problem was
/// detected. A parse error aborts the statement being parsed; nothing it
/// registered in the symbol table survives.
pub enum ParseError {
    /// Found an unexpected token while parsing.
    UnexpectedToken {
        /// The token encountered, or a description of what was expected.
        token: String,
        /// Where the error occurred.
        pos:   Position,
    },
    /// Reached the end of input unexpectedly.
    UnexpectedEndOfInput {
        /// Where the error occurred.
        pos: Position,
    },
    /// The tokenizer produced an invalid token (malformed literal, stray
    /// character, unterminated string).
    InvalidToken {
        /// The offending text.
        text: String,
        /// Where the error occurred.
        pos:  Position,
    },
    /// Operand or assignment types do not agree.
    TypeMismatch {
        /// The type that was expected.
        expected: String,
        /// The type that was found.
        found:    String,
        /// Where the error occurred.
        pos:      Position,
    },
    /// A name that is neither a variable, a builtin nor a function.
    UnknownSymbol {
        /// The unresolved name.
        name: String,
        /// Where the error occurred.
        pos:  Position,
    },
    /// A method that the receiver type does not provide.
    UnknownMethod {
        /// The method name.
        name:     String,
        /// The receiver type.
        receiver: String,
        /// Where the error occurred.
        pos:      Position,
    },
    /// The wrong number of arguments was supplied to a function.
    ArgumentCount {
        /// The function or method name.
        name:     String,
        /// The number of parameters declared.
        expected: usize,
        /// The number of arguments supplied.
        found:    usize,
        /// Where the error occurred.
        pos:      Position,
    },
    /// Tried to use a reserved word as a variable or function name.
    IdentifierReserved {
        /// The reserved name.
        name: String,
        /// Where the error occurred.
        pos:  Position,
    },
    /// Two relational operators at the same level (`a < b < c`).
    ChainedRelational {
        /// Where the error occurred.
        pos: Position,
    },
    /// A `forall` body mutates the collection being iterated.
    ForbiddenMutation {
        /// The iterated collection.
        name:      String,
        /// The mutating operation.
        operation: String,
        /// Where the error occurred.
        pos:       Position,
    },
    /// `include` used without the trust flag.
    UntrustedInclude {
        /// The requested path.
        path: String,
        /// Where the error occurred.
        pos:  Position,
    },
    /// `include` nesting exceeded the configured depth.
    IncludeTooDeep {
        /// The configured limit.
        limit: usize,
        /// Where the error occurred.
        pos:   Position,
    },
    /// Expressions or statements nested deeper than the parser accepts.
    NestingTooDeep {
        /// The nesting limit.
        limit: usize,
        /// Where the error occurred.
        pos:   Position,
    },
    /// The include resolver could not open the requested source.
    IncludeFailed {
        /// The requested path.
        path:    String,
        /// The reason reported by the resolver.
        details: String,
        /// Where the error occurred.
        pos:     Position,
    },
    /// `import` named a module the registry does not provide.
    ModuleNotFound {
        /// The module name.
        name: String,
        /// Where the error occurred.
        pos:  Position,
    },
    /// `return` with a value in a function that declares none, or without one
    /// in a function that declares a return type.
    InvalidReturn {
        /// Details about the mismatch.
        details: String,
        /// Where the error occurred.
        pos:     Position,
    },
    /// Some other kind of parse error, with a custom message.
    Other {
        /// Details about the parse error.
        message: String,
        /// Where the error occurred.
        pos:     Position,
    },
}

impl ParseError {
    /// Returns the position at which the error was detected.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::UnexpectedToken { pos, .. }
            | Self::UnexpectedEndOfInput { pos }
            | Self::InvalidToken { pos, .. }
            | Self::TypeMismatch { pos, .. }
            | Self::UnknownSymbol { pos, .. }
            | Self::UnknownMethod { pos, .. }
            | Self::ArgumentCount { pos, .. }
            | Self::IdentifierReserved { pos, .. }
            | Self::ChainedRelational { pos }
            | Self::ForbiddenMutation { pos, .. }
            | Self::UntrustedInclude { pos, .. }
            | Self::IncludeTooDeep { pos, .. }
            | Self::NestingTooDeep { pos, .. }
            | Self::IncludeFailed { pos, .. }
            | Self::ModuleNotFound { pos, .. }
            | Self::InvalidReturn { pos, .. }
            | Self::Other { pos, .. } => *pos,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken { token, pos } => {
                write!(f, "Error at {pos}: Unexpected token: {token}.")
            },
            Self::UnexpectedEndOfInput { pos } => {
                write!(f, "Error at {pos}: Unexpected end of input.")
            },
            Self::InvalidToken { text, pos } => write!(f, "Error at {pos}: Invalid token '{text}'."),
            Self::TypeMismatch { expected,
                                 found,
                                 pos, } => write!(f,
                                                  "Error at {pos}: Type mismatch: expected {expected}, found {found}."),
            Self::UnknownSymbol { name, pos } => {
                write!(f, "Error at {pos}: Unknown symbol '{name}'.")
            },
            Self::UnknownMethod { name,
                                  receiver,
                                  pos, } => write!(f,
                                                   "Error at {pos}: Type {receiver} has no method '{name}'."),
            Self::ArgumentCount { name,
                                  expected,
                                  found,
                                  pos, } => write!(f,
                                                   "Error at {pos}: '{name}' takes {expected} argument(s) but {found} were supplied."),
            Self::IdentifierReserved { name, pos } => {
                write!(f, "Error at {pos}: Identifier {name} is reserved.")
            },
            Self::ChainedRelational { pos } => write!(f,
                                                      "Error at {pos}: Relational operators cannot be chained; use parentheses."),
            Self::ForbiddenMutation { name,
                                      operation,
                                      pos, } => write!(f,
                                                       "Error at {pos}: '{operation}' cannot modify '{name}' while it is being iterated."),
            Self::UntrustedInclude { path, pos } => write!(f,
                                                           "Error at {pos}: Including '{path}' requires trusted mode."),
            Self::IncludeTooDeep { limit, pos } => {
                write!(f, "Error at {pos}: Includes nested deeper than {limit} levels.")
            },
            Self::NestingTooDeep { limit, pos } => {
                write!(f, "Error at {pos}: Nesting exceeds {limit} levels.")
            },
            Self::IncludeFailed { path,
                                  details,
                                  pos, } => {
                write!(f, "Error at {pos}: Cannot include '{path}': {details}.")
            },
            Self::ModuleNotFound { name, pos } => {
                write!(f, "Error at {pos}: Module '{name}' is not available.")
            },
            Self::InvalidReturn { details, pos } => {
                write!(f, "Error at {pos}: Invalid return: {details}.")
            },
            Self::Other { message, pos } => write!(f, "Error at {pos}: {message}"),
        }
    }
}

impl std::error::Error for ParseError {}
