use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use regex::Regex;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{binary::scalar::as_imaginary, core::EvalResult},
        value::core::{Payload, Value},
    },
};

/// Structural equality.
///
/// Two nulls are equal and a null never equals a non-null value. Numbers
/// compare by value across integer, decimal and imaginary. Collections and
/// tuples compare element by element, native objects by identity. Values of
/// unrelated kinds are unequal.
///
/// # Example
/// ```
/// use plume::interpreter::{
///     evaluator::binary::comparison::values_equal,
///     value::{core::Value, types::Type},
/// };
///
/// assert!(values_equal(&Value::from(2), &Value::from(2.0), 1).unwrap());
/// assert!(values_equal(&Value::null(Type::INTEGER), &Value::null(Type::AUTO), 1).unwrap());
/// assert!(!values_equal(&Value::from("a"), &Value::null(Type::LITERAL), 1).unwrap());
/// ```
pub fn values_equal(left: &Value, right: &Value, line: usize) -> EvalResult<bool> {
    let equal = match (left.payload(), right.payload()) {
        (Payload::Null, Payload::Null) => true,
        (Payload::Null, _) | (_, Payload::Null) => false,
        (Payload::Integer(a), Payload::Integer(b)) => a == b,
        (Payload::Imaginary(_), Payload::Integer(_) | Payload::Numeric(_) | Payload::Imaginary(_))
        | (Payload::Integer(_) | Payload::Numeric(_), Payload::Imaginary(_)) => {
            as_imaginary(left, line)? == as_imaginary(right, line)?
        },
        (Payload::Integer(_) | Payload::Numeric(_), Payload::Integer(_) | Payload::Numeric(_)) => {
            left.numeric(line)? == right.numeric(line)?
        },
        (Payload::Boolean(a), Payload::Boolean(b)) => a == b,
        (Payload::Literal(a), Payload::Literal(b)) => a == b,
        (Payload::Tabchar(a), Payload::Tabchar(b)) => a == b,
        (Payload::Collection(a), Payload::Collection(b)) => {
            a.len() == b.len() && all_equal(a.iter(), b.iter(), line)?
        },
        (Payload::Tuple(a), Payload::Tuple(b)) => {
            a.len() == b.len() && all_equal(a.items().iter(), b.items().iter(), line)?
        },
        (Payload::Complex(a), Payload::Complex(b)) => a.same_object(b),
        _ => false,
    };
    Ok(equal)
}

fn all_equal<'a>(left: impl Iterator<Item = &'a Value>,
                 right: impl Iterator<Item = &'a Value>,
                 line: usize)
                 -> EvalResult<bool> {
    for (l, r) in left.zip(right) {
        if !values_equal(l, r, line)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The order of two numbers, two strings or two byte arrays.
///
/// # Errors
/// `TypeMismatch` for operands that have no common order.
pub fn ordering(left: &Value, right: &Value, line: usize) -> EvalResult<Ordering> {
    match (left.payload(), right.payload()) {
        (Payload::Integer(a), Payload::Integer(b)) => Ok(a.cmp(b)),
        (Payload::Integer(_) | Payload::Numeric(_), Payload::Integer(_) | Payload::Numeric(_)) => {
            let a = left.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            let b = right.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            Ok(OrderedFloat(a).cmp(&OrderedFloat(b)))
        },
        (Payload::Literal(a), Payload::Literal(b)) => Ok(a.cmp(b)),
        (Payload::Tabchar(a), Payload::Tabchar(b)) => Ok(a.cmp(b)),
        _ => Err(RuntimeError::TypeMismatch { expected: "an ordered type".to_string(),
                                              found: format!("{} and {}", left.ty(), right.ty()),
                                              line }),
    }
}

/// Evaluates `< <= > >=` and `matches`.
///
/// `matches` searches the left string for the regular expression on the
/// right.
///
/// # Errors
/// - `TypeMismatch` for operands without a common order.
/// - `InvalidArgument` for a malformed regular expression.
///
/// # Example
/// ```
/// use plume::{
///     ast::BinaryOperator,
///     interpreter::{evaluator::binary::comparison::compare, value::core::Value},
/// };
///
/// let less = compare(BinaryOperator::Less, &Value::from(1), &Value::from(1.5), 1).unwrap();
/// assert_eq!(less.to_string(), "true");
///
/// let m = compare(BinaryOperator::Matches, &Value::from("abc123"), &Value::from("[0-9]+$"), 1);
/// assert_eq!(m.unwrap().to_string(), "true");
/// ```
pub fn compare(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Matches => {
            let text = left.literal(line)?.ok_or(RuntimeError::NullValue { line })?;
            let pattern = right.literal(line)?.ok_or(RuntimeError::NullValue { line })?;
            let regex = Regex::new(pattern).map_err(|e| {
                                               RuntimeError::InvalidArgument { details: format!("bad pattern '{pattern}': {e}"),
                                                                               line }
                                           })?;
            regex.is_match(text)
        },
        BinaryOperator::Less => ordering(left, right, line)?.is_lt(),
        BinaryOperator::LessEqual => ordering(left, right, line)?.is_le(),
        BinaryOperator::Greater => ordering(left, right, line)?.is_gt(),
        BinaryOperator::GreaterEqual => ordering(left, right, line)?.is_ge(),
        _ => {
            return Err(RuntimeError::Internal { details: format!("'{op}' is not a comparison"),
                                                line });
        },
    };
    Ok(Value::from(result))
}
