/// Dispatch of binary operations.
///
/// Evaluates both operands (short-circuiting `and` and `or`) and routes the
/// values to the arithmetic, comparison or logic handlers.
pub mod core;

/// Arithmetic on numbers and concatenation of strings and bytes.
pub mod scalar;

/// Exponentiation.
pub mod power;

/// Equality, ordering and regular expression matching.
pub mod comparison;

/// Logical, bitwise and shift operators.
pub mod logic;
