/// Binary operator evaluation logic.
///
/// Handles arithmetic, concatenation, comparisons, regular expression
/// matching, logical and bitwise operators.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Implements arithmetic negation and identity, logical NOT and bitwise
/// complement.
pub mod unary;

/// Core evaluation logic.
///
/// Contains the `EvalResult` alias, the expression dispatcher on `Context`
/// and native object construction.
pub mod core;

/// Element access and method calls.
///
/// Reads `@` elements in place, applies the mutating collection methods to
/// storage and dispatches native object methods to their module.
pub mod member;

/// Builtin functions.
///
/// Handles the builtin function keywords, their static result types and
/// argument checking.
pub mod function;
