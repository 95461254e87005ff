use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Widens an integer to a decimal.
///
/// This is the integer-to-decimal widening used by mixed arithmetic and by
/// stores into decimal slots. It never fails; magnitudes above `2^53` round
/// to the nearest representable decimal.
///
/// ## Example
/// ```
/// use plume::util::num::widen_integer;
///
/// assert_eq!(widen_integer(42), 42.0);
/// assert_eq!(widen_integer(1 << 60), 1_152_921_504_606_846_976.0);
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub const fn widen_integer(value: i64) -> f64 {
    value as f64
}

/// Converts an `f64` to `i64`, discarding the fractional part.
///
/// Used by the `int()` conversion. Non-finite values and values outside the
/// `i64` range are rejected instead of saturating.
///
/// ## Errors
/// Returns `RuntimeError::Overflow` for non-finite or out-of-range values.
///
/// ## Example
/// ```
/// use plume::{error::RuntimeError, util::num::f64_to_i64_truncated};
///
/// assert_eq!(f64_to_i64_truncated(2.75, 1).unwrap(), 2);
/// assert_eq!(f64_to_i64_truncated(-2.75, 1).unwrap(), -2);
///
/// let err = f64_to_i64_truncated(1e20, 5).unwrap_err();
/// assert!(matches!(err, RuntimeError::Overflow { line: 5 }));
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
pub fn f64_to_i64_truncated(value: f64, line: usize) -> EvalResult<i64> {
    if !value.is_finite() {
        return Err(RuntimeError::Overflow { line });
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(RuntimeError::Overflow { line });
    }
    Ok(truncated as i64)
}

/// Converts a script index to a `usize` position inside a container of
/// `size` elements.
///
/// `base` is the index of the first element (0 for collections, strings and
/// bytes; 1 for tuples).
///
/// ## Errors
/// Returns `RuntimeError::IndexOutOfRange` if the index falls outside
/// `base..base + size`.
///
/// ## Example
/// ```
/// use plume::{error::RuntimeError, util::num::checked_index};
///
/// assert_eq!(checked_index(0, 3, 0, 1).unwrap(), 0);
/// assert_eq!(checked_index(3, 3, 1, 1).unwrap(), 2);
///
/// let err = checked_index(3, 3, 0, 9).unwrap_err();
/// assert!(matches!(err, RuntimeError::IndexOutOfRange { index: 3, size: 3, line: 9 }));
/// ```
pub fn checked_index(index: i64, size: usize, base: i64, line: usize) -> EvalResult<usize> {
    let out_of_range = || RuntimeError::IndexOutOfRange { index, size, line };

    let position = index.checked_sub(base).ok_or_else(out_of_range)?;
    let position = usize::try_from(position).map_err(|_| out_of_range())?;
    if position >= size {
        return Err(out_of_range());
    }
    Ok(position)
}

/// Converts a container length to a script integer.
///
/// ## Errors
/// Returns `RuntimeError::Overflow` if the length does not fit in an `i64`.
pub fn usize_to_i64_checked(value: usize, line: usize) -> EvalResult<i64> {
    i64::try_from(value).map_err(|_| RuntimeError::Overflow { line })
}

/// Converts a script integer to a `usize` count or position.
///
/// Unlike [`checked_index`] no upper bound is applied; used for insertion
/// points and substring lengths, which may equal the container size.
///
/// ## Errors
/// Returns `RuntimeError::IndexOutOfRange` for negative values.
pub fn i64_to_usize_checked(value: i64, size: usize, line: usize) -> EvalResult<usize> {
    usize::try_from(value).map_err(|_| RuntimeError::IndexOutOfRange { index: value,
                                                                         size,
                                                                         line })
}
