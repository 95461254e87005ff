use crate::{
    ast::{BinaryOperator, Expr},
    error::RuntimeError,
    interpreter::{
        context::Context,
        evaluator::{
            binary::{
                comparison::{compare, values_equal},
                logic::{bitwise, logical, shift},
                power::power,
                scalar::arithmetic,
            },
            core::EvalResult,
        },
        value::core::Value,
    },
};

impl Context {
    /// Evaluates a binary operation.
    ///
    /// `and` and `or` evaluate their right operand only when the left one
    /// does not decide the result. Every other operator evaluates both
    /// operands, left first, and hands them to [`binary_values`].
    ///
    /// # Parameters
    /// - `op`: The operator.
    /// - `left`: Left operand expression.
    /// - `right`: Right operand expression.
    /// - `line`: Line number for error reporting.
    pub(crate) fn eval_binary(&mut self,
                              op: BinaryOperator,
                              left: &Expr,
                              right: &Expr,
                              line: usize)
                              -> EvalResult<Value> {
        if matches!(op, BinaryOperator::And | BinaryOperator::Or) {
            let decided = op == BinaryOperator::Or;
            let l = self.evaluate(left)?
                        .boolean(line)?
                        .ok_or(RuntimeError::NullValue { line })?;
            if l == decided {
                return Ok(Value::from(l));
            }
            let r = self.evaluate(right)?
                        .boolean(line)?
                        .ok_or(RuntimeError::NullValue { line })?;
            return Ok(Value::from(r));
        }

        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;
        binary_values(op, &l, &r, line)
    }
}

/// Applies a binary operator to two evaluated operands.
///
/// Equality compares any two values, nulls included. Every other operator
/// fails with `NullValue` on a null operand.
///
/// # Parameters
/// - `op`: The operator.
/// - `left`: Left operand.
/// - `right`: Right operand.
/// - `line`: Line number for error reporting.
///
/// # Returns
/// An `EvalResult<Value>` containing the evaluated result.
///
/// # Example
/// ```
/// use plume::{
///     ast::BinaryOperator,
///     interpreter::{evaluator::binary::core::binary_values, value::core::Value},
/// };
///
/// let sum = binary_values(BinaryOperator::Add, &Value::from(3), &Value::from(4), 1);
/// assert_eq!(sum.unwrap().to_string(), "7");
///
/// let mixed = binary_values(BinaryOperator::Mul, &Value::from(2), &Value::from(1.5), 1);
/// assert_eq!(mixed.unwrap().to_string(), "3.0");
///
/// let joined = binary_values(BinaryOperator::Add, &Value::from("ab"), &Value::from("c"), 1);
/// assert_eq!(joined.unwrap().to_string(), "abc");
/// ```
pub fn binary_values(op: BinaryOperator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
    use BinaryOperator::{
        Add, And, BitAnd, BitOr, BitXor, Div, Equal, Greater, GreaterEqual, Less, LessEqual,
        Matches, Mod, Mul, NotEqual, Or, Pow, ShiftLeft, ShiftRight, Sub, Xor,
    };

    match op {
        Equal => return Ok(Value::from(values_equal(left, right, line)?)),
        NotEqual => return Ok(Value::from(!values_equal(left, right, line)?)),
        _ if left.is_null() || right.is_null() => return Err(RuntimeError::NullValue { line }),
        _ => {},
    }

    match op {
        And | Or | Xor => logical(op, left, right, line),
        Less | LessEqual | Greater | GreaterEqual | Matches => compare(op, left, right, line),
        BitAnd | BitOr | BitXor => bitwise(op, left, right, line),
        ShiftLeft | ShiftRight => shift(op, left, right, line),
        Add | Sub | Mul | Div | Mod => arithmetic(op, left, right, line),
        Pow => power(left, right, line),
        Equal | NotEqual => Ok(Value::from(values_equal(left, right, line)? == (op == Equal))),
    }
}
