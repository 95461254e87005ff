use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::core::{Payload, Value},
    },
};

fn mismatch(expected: &str, left: &Value, right: &Value, line: usize) -> RuntimeError {
    RuntimeError::TypeMismatch { expected: expected.to_string(),
                                 found: format!("{} and {}", left.ty(), right.ty()),
                                 line }
}

/// Evaluates `and`, `or` and `xor` on two evaluated booleans.
///
/// The short-circuiting forms are handled before the right operand is
/// evaluated; this is the plain truth table.
pub fn logical(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    let (Payload::Boolean(a), Payload::Boolean(b)) = (left.payload(), right.payload()) else {
        return Err(mismatch("boolean", left, right, line));
    };
    let result = match op {
        BinaryOperator::And => *a && *b,
        BinaryOperator::Or => *a || *b,
        _ => a ^ b,
    };
    Ok(Value::from(result))
}

/// Evaluates `& | ^` on two integers or two booleans.
///
/// # Example
/// ```
/// use plume::{
///     ast::BinaryOperator,
///     interpreter::{evaluator::binary::logic::bitwise, value::core::Value},
/// };
///
/// let v = bitwise(BinaryOperator::BitAnd, &Value::from(12), &Value::from(10), 1).unwrap();
/// assert_eq!(v.to_string(), "8");
/// let v = bitwise(BinaryOperator::BitXor, &Value::from(true), &Value::from(true), 1).unwrap();
/// assert_eq!(v.to_string(), "false");
/// ```
pub fn bitwise(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    match (left.payload(), right.payload()) {
        (Payload::Integer(a), Payload::Integer(b)) => Ok(Value::from(match op {
                                                               BinaryOperator::BitAnd => a & b,
                                                               BinaryOperator::BitOr => a | b,
                                                               _ => a ^ b,
                                                           })),
        (Payload::Boolean(a), Payload::Boolean(b)) => Ok(Value::from(match op {
                                                               BinaryOperator::BitAnd => a & b,
                                                               BinaryOperator::BitOr => a | b,
                                                               _ => a ^ b,
                                                           })),
        _ => Err(mismatch("integer or boolean", left, right, line)),
    }
}

/// Evaluates `<<` and `>>`. Right shifts are arithmetic.
///
/// # Errors
/// `InvalidArgument` for a shift amount outside `0..=63`.
pub fn shift(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    let (Payload::Integer(a), Payload::Integer(n)) = (left.payload(), right.payload()) else {
        return Err(mismatch("integer", left, right, line));
    };
    let amount = u32::try_from(*n).ok()
                                  .filter(|n| *n < i64::BITS)
                                  .ok_or_else(|| RuntimeError::InvalidArgument { details: format!("shift amount {n}"),
                                                                                 line })?;
    Ok(Value::from(if op == BinaryOperator::ShiftLeft {
                       a << amount
                   } else {
                       a >> amount
                   }))
}
