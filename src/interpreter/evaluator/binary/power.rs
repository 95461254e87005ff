use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::scalar::{as_imaginary, finite},
            core::EvalResult,
        },
        value::{
            core::{Payload, Value},
            imaginary::{Imaginary, ONE},
        },
    },
};

/// Evaluates an exponentiation.
///
/// Integer–integer exponentiation uses checked arithmetic and rejects
/// negative exponents. An imaginary base with an integer exponent uses
/// repeated squaring; other imaginary operands use the polar form. In all
/// other cases both operands are widened to decimals and `powf` is used.
///
/// # Parameters
/// - `base`: The base value.
/// - `exponent`: The exponent value.
/// - `line`: Line number for error reporting.
///
/// # Returns
/// An `EvalResult<Value>` containing the result of `base ** exponent`.
///
/// # Example
/// ```
/// use plume::interpreter::{evaluator::binary::power::power, value::core::Value};
///
/// assert_eq!(power(&Value::from(2), &Value::from(10), 1).unwrap().to_string(), "1024");
/// assert_eq!(power(&Value::from(4.0), &Value::from(0.5), 1).unwrap().to_string(), "2.0");
/// assert!(power(&Value::from(2), &Value::from(-1), 1).is_err());
/// assert!(power(&Value::from(2), &Value::from(64), 1).is_err());
/// ```
pub fn power(base: &Value, exponent: &Value, line: usize) -> EvalResult<Value> {
    match (base.payload(), exponent.payload()) {
        (Payload::Integer(b), Payload::Integer(e)) => {
            if *e < 0 {
                return Err(RuntimeError::InvalidArgument { details: format!("negative integer exponent {e}"),
                                                           line });
            }
            let e = u32::try_from(*e).map_err(|_| RuntimeError::Overflow { line })?;
            b.checked_pow(e)
             .map(Value::from)
             .ok_or(RuntimeError::Overflow { line })
        },
        (Payload::Imaginary(b), Payload::Integer(e)) => b.checked_powi(*e, line).map(Value::from),
        (Payload::Imaginary(_), _) | (_, Payload::Imaginary(_)) => {
            let z = polar_pow(as_imaginary(base, line)?, as_imaginary(exponent, line)?, line)?;
            finite(z.re, line)?;
            finite(z.im, line)?;
            Ok(Value::from(z))
        },
        _ => {
            let b = base.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            let e = exponent.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
            finite(b.powf(e), line).map(Value::from)
        },
    }
}

/// `z ** w` as `exp(w * ln z)`.
fn polar_pow(z: Imaginary, w: Imaginary, line: usize) -> EvalResult<Imaginary> {
    if w.is_zero() {
        return Ok(ONE);
    }
    if z.is_zero() {
        return if w.re > 0.0 {
            Ok(Imaginary::new(0.0, 0.0))
        } else {
            Err(RuntimeError::DivisionByZero { line })
        };
    }
    let ln = Imaginary::new(z.abs().ln(), z.im.atan2(z.re));
    let exponent = w * ln;
    let magnitude = exponent.re.exp();
    Ok(Imaginary::new(magnitude * exponent.im.cos(), magnitude * exponent.im.sin()))
}
