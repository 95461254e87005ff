/// Builtin function implementations.
///
/// Constructors (`tab`, `tup`, `imag`, `bytes`), conversions, numeric
/// helpers, `typeof`, `error`, `readln` and `assert`.
pub mod builtin;

/// The builtin table: names, arities, static result types and dispatch.
pub mod core;
