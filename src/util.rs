/// Numeric conversion helpers.
///
/// This module provides safe functions for converting between integer and
/// floating-point types and for turning script indices into container
/// positions without risking silent data loss or wrap-around.
///
/// All functions return a `Result`, which is `Ok` if the conversion is lossless
/// and valid, or an error if the value is out of range.
pub mod num;
/// Native stack growth for the recursive parser and evaluator.
pub mod stack;
