#[derive(Debug, Clone, PartialEq)]
/// Represents all errors that can occur during execution.
///
/// Every error except [`RuntimeError::Internal`] has a catchable name (see
/// [`RuntimeError::name`]) that exception handlers match against.
pub enum RuntimeError {
    /// Attempted division (or remainder) by zero.
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to access an element outside the container bounds.
    IndexOutOfRange {
        /// The index that was requested.
        index: i64,
        /// The size of the container.
        size:  usize,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// A value had a type that the operation or the target cannot accept.
    TypeMismatch {
        /// The type that was expected.
        expected: String,
        /// The type that was found.
        found:    String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// An operation needed a value but found null.
    NullValue {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Arithmetic overflowed or a conversion lost its value.
    Overflow {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An argument was invalid (bad regular expression, negative step, ...).
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// The operation is not available for the given operands.
    NotImplemented {
        /// What was attempted.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A function without a result was used where a value is required.
    NoReturnValue {
        /// The function name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// The call depth exceeded the configured ceiling.
    RecursionLimit {
        /// The configured ceiling.
        limit: usize,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// An `assert()` failed.
    AssertionFailed {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A native plugin reported a failure.
    PluginFailure {
        /// The message reported by the module.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A named exception raised by `raise`.
    UserException {
        /// The exception name, lower-cased.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A broken interpreter invariant or an I/O failure. Never catchable.
    Internal {
        /// Details about the failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
}

impl RuntimeError {
    /// Returns the name handlers use to catch this error, or `None` for
    /// internal errors.
    ///
    /// # Example
    /// ```
    /// use plume::error::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::DivisionByZero { line: 1 }.name(),
    ///            Some("divide_by_zero"));
    /// assert_eq!(RuntimeError::UserException { name: "oops".into(),
    ///                                          line: 1, }.name(),
    ///            Some("oops"));
    /// assert_eq!(RuntimeError::Internal { details: "x".into(),
    ///                                     line:    1, }.name(),
    ///            None);
    /// ```
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::DivisionByZero { .. } => Some("divide_by_zero"),
            Self::IndexOutOfRange { .. } => Some("out_of_range"),
            Self::TypeMismatch { .. } => Some("type_mismatch"),
            Self::NullValue { .. } => Some("null_value"),
            Self::Overflow { .. } => Some("overflow"),
            Self::InvalidArgument { .. } => Some("invalid_argument"),
            Self::NotImplemented { .. } => Some("not_implemented"),
            Self::NoReturnValue { .. } => Some("no_return_value"),
            Self::RecursionLimit { .. } => Some("recursion_limit"),
            Self::AssertionFailed { .. } => Some("assertion_failed"),
            Self::PluginFailure { .. } => Some("plugin_error"),
            Self::UserException { name, .. } => Some(name),
            Self::Internal { .. } => None,
        }
    }

    /// Returns the source line at which the error was raised.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::DivisionByZero { line }
            | Self::IndexOutOfRange { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::NullValue { line }
            | Self::Overflow { line }
            | Self::InvalidArgument { line, .. }
            | Self::NotImplemented { line, .. }
            | Self::NoReturnValue { line, .. }
            | Self::RecursionLimit { line, .. }
            | Self::AssertionFailed { line }
            | Self::PluginFailure { line, .. }
            | Self::UserException { line, .. }
            | Self::Internal { line, .. } => *line,
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DivisionByZero { line } => write!(f, "Error on line {line}: Division by zero."),
            Self::IndexOutOfRange { index, size, line } => write!(f,
                                                                  "Error on line {line}: Index {index} is out of range for a size of {size}."),
            Self::TypeMismatch { expected,
                                 found,
                                 line, } => write!(f,
                                                   "Error on line {line}: Type mismatch: expected {expected}, found {found}."),
            Self::NullValue { line } => write!(f, "Error on line {line}: Value is null."),
            Self::Overflow { line } => write!(f,
                                              "Error on line {line}: Integer overflow while trying to compute result."),
            Self::InvalidArgument { details, line } => {
                write!(f, "Error on line {line}: Invalid argument: {details}.")
            },
            Self::NotImplemented { details, line } => {
                write!(f, "Error on line {line}: Not implemented: {details}.")
            },
            Self::NoReturnValue { name, line } => {
                write!(f, "Error on line {line}: Function '{name}' returned no value.")
            },
            Self::RecursionLimit { limit, line } => write!(f,
                                                           "Error on line {line}: Recursion limit of {limit} calls exceeded."),
            Self::AssertionFailed { line } => write!(f, "Error on line {line}: Assertion failed."),
            Self::PluginFailure { details, line } => {
                write!(f, "Error on line {line}: Plugin failure: {details}.")
            },
            Self::UserException { name, line } => {
                write!(f, "Error on line {line}: Unhandled exception '{name}'.")
            },
            Self::Internal { details, line } => {
                write!(f, "Error on line {line}: Internal error: {details}.")
            },
        }
    }
}

impl std::error::Error for RuntimeError {}
