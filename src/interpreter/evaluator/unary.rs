use crate::{
    ast::{Expr, UnaryOperator},
    error::RuntimeError,
    interpreter::{
        context::Context,
        evaluator::core::EvalResult,
        value::core::{Payload, Value},
    },
};

impl Context {
    /// Evaluates the operand and applies a unary operator to it.
    pub(crate) fn eval_unary(&mut self, op: UnaryOperator, operand: &Expr, line: usize) -> EvalResult<Value> {
        let value = self.evaluate(operand)?;
        apply_unary(op, &value, line)
    }
}

/// Applies a unary operator to a value.
///
/// Supported operators:
/// - `Negate`: checked negation of integers, decimals and imaginary numbers.
/// - `Plus`: the identity on numbers.
/// - `Not`: boolean negation.
/// - `Complement`: bitwise complement of an integer.
///
/// # Parameters
/// - `op`: Unary operator.
/// - `value`: Input value.
/// - `line`: Line number for error reporting.
///
/// # Errors
/// - `NullValue` for a null operand.
/// - `Overflow` when negating `i64::MIN`.
/// - `TypeMismatch` for an operand the operator does not support.
///
/// # Example
/// ```
/// use plume::{
///     ast::UnaryOperator,
///     interpreter::{evaluator::unary::apply_unary, value::core::Value},
/// };
///
/// let v = apply_unary(UnaryOperator::Negate, &Value::from(5), 1).unwrap();
/// assert_eq!(v.to_string(), "-5");
///
/// let v = apply_unary(UnaryOperator::Not, &Value::from(false), 1).unwrap();
/// assert_eq!(v.to_string(), "true");
///
/// assert!(apply_unary(UnaryOperator::Negate, &Value::from(i64::MIN), 1).is_err());
/// ```
pub fn apply_unary(op: UnaryOperator, value: &Value, line: usize) -> EvalResult<Value> {
    match (op, value.payload()) {
        (_, Payload::Null) => Err(RuntimeError::NullValue { line }),
        (UnaryOperator::Negate, Payload::Integer(i)) => i.checked_neg()
                                                         .map(Value::from)
                                                         .ok_or(RuntimeError::Overflow { line }),
        (UnaryOperator::Negate, Payload::Numeric(n)) => Ok(Value::from(-n)),
        (UnaryOperator::Negate, Payload::Imaginary(z)) => Ok(Value::from(-*z)),
        (UnaryOperator::Plus, Payload::Integer(_) | Payload::Numeric(_) | Payload::Imaginary(_)) => {
            Ok(value.clone())
        },
        (UnaryOperator::Not, Payload::Boolean(b)) => Ok(Value::from(!b)),
        (UnaryOperator::Complement, Payload::Integer(i)) => Ok(Value::from(!i)),
        _ => {
            let expected = match op {
                UnaryOperator::Negate | UnaryOperator::Plus => "a number",
                UnaryOperator::Not => "boolean",
                UnaryOperator::Complement => "integer",
            };
            Err(RuntimeError::TypeMismatch { expected: expected.to_string(),
                                             found: value.ty().to_string(),
                                             line })
        },
    }
}
