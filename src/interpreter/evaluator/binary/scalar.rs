use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{
            core::{Payload, Value},
            imaginary::Imaginary,
        },
    },
};

/// Evaluates `+ - * / %`.
///
/// Two integers use checked integer arithmetic, with truncating division.
/// An imaginary operand turns the other number imaginary; otherwise a
/// decimal operand widens the integer. `+` also concatenates two strings or
/// two byte arrays.
///
/// # Errors
/// - `DivisionByZero` for a zero divisor of `/` or `%`.
/// - `Overflow` when an integer result does not fit or a decimal result is
///   not finite.
/// - `NotImplemented` for an operator the operands' kind does not support,
///   such as `%` on imaginary numbers.
/// - `TypeMismatch` for operands of incompatible kinds.
///
/// # Example
/// ```
/// use plume::{
///     ast::BinaryOperator,
///     error::RuntimeError,
///     interpreter::{evaluator::binary::scalar::arithmetic, value::core::Value},
/// };
///
/// let q = arithmetic(BinaryOperator::Div, &Value::from(7), &Value::from(2), 1).unwrap();
/// assert_eq!(q.to_string(), "3");
///
/// let err = arithmetic(BinaryOperator::Mod, &Value::from(7), &Value::from(0), 4).unwrap_err();
/// assert!(matches!(err, RuntimeError::DivisionByZero { line: 4 }));
/// ```
pub fn arithmetic(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    match (left.payload(), right.payload()) {
        (Payload::Integer(a), Payload::Integer(b)) => integer_op(op, *a, *b, line),
        (Payload::Literal(a), Payload::Literal(b)) if op == BinaryOperator::Add => {
            Ok(Value::from(format!("{a}{b}")))
        },
        (Payload::Tabchar(a), Payload::Tabchar(b)) if op == BinaryOperator::Add => {
            let mut joined = a.clone();
            joined.extend_from_slice(b);
            Ok(Value::from(joined))
        },
        (Payload::Imaginary(_), _) | (_, Payload::Imaginary(_)) => {
            imaginary_op(op, as_imaginary(left, line)?, as_imaginary(right, line)?, line)
        },
        (Payload::Integer(_) | Payload::Numeric(_), Payload::Integer(_) | Payload::Numeric(_)) => {
            let a = left.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            let b = right.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            decimal_op(op, a, b, line)
        },
        _ if left.ty() == right.ty() => {
            Err(RuntimeError::NotImplemented { details: format!("'{op}' on {}", left.ty()),
                                               line })
        },
        _ => Err(RuntimeError::TypeMismatch { expected: left.ty().to_string(),
                                              found: right.ty().to_string(),
                                              line }),
    }
}

/// Reads a number as an imaginary number with a zero imaginary part.
pub(crate) fn as_imaginary(value: &Value, line: usize) -> EvalResult<Imaginary> {
    if let Payload::Imaginary(z) = value.payload() {
        return Ok(*z);
    }
    let re = value.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
    Ok(Imaginary::new(re, 0.0))
}

fn integer_op(op: BinaryOperator, a: i64, b: i64, line: usize) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        BinaryOperator::Div | BinaryOperator::Mod if b == 0 => {
            return Err(RuntimeError::DivisionByZero { line });
        },
        BinaryOperator::Div => a.checked_div(b),
        BinaryOperator::Mod => a.checked_rem(b),
        _ => return Err(unsupported(op, line)),
    };
    result.map(Value::from).ok_or(RuntimeError::Overflow { line })
}

fn decimal_op(op: BinaryOperator, a: f64, b: f64, line: usize) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::Mod if b == 0.0 => {
            return Err(RuntimeError::DivisionByZero { line });
        },
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => return Err(unsupported(op, line)),
    };
    finite(result, line).map(Value::from)
}

fn imaginary_op(op: BinaryOperator, a: Imaginary, b: Imaginary, line: usize) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a.checked_div(b, line)?,
        _ => {
            return Err(RuntimeError::NotImplemented { details: format!("'{op}' on imaginary numbers"),
                                                      line });
        },
    };
    finite(result.re, line)?;
    finite(result.im, line)?;
    Ok(Value::from(result))
}

/// Rejects infinite and NaN results as overflows.
pub(crate) fn finite(n: f64, line: usize) -> EvalResult<f64> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(RuntimeError::Overflow { line })
    }
}

fn unsupported(op: BinaryOperator, line: usize) -> RuntimeError {
    RuntimeError::Internal { details: format!("'{op}' is not an arithmetic operator"),
                             line }
}
