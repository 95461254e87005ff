use rand::Rng;

use crate::{
    error::RuntimeError,
    interpreter::{
        context::Context,
        evaluator::core::EvalResult,
        value::{
            collection::Collection,
            core::{Payload, Value},
            imaginary::Imaginary,
            tuple::Tuple,
            types::Type,
        },
    },
    util::num::{f64_to_i64_truncated, widen_integer},
};

/// Takes the single argument of a one-argument builtin.
fn single(args: Vec<Value>, line: usize) -> EvalResult<Value> {
    args.into_iter()
        .next()
        .ok_or_else(|| RuntimeError::Internal { details: "missing builtin argument".to_string(),
                                                line })
}

fn type_mismatch(expected: &str, value: &Value, line: usize) -> RuntimeError {
    RuntimeError::TypeMismatch { expected: expected.to_string(),
                                 found: value.ty().to_string(),
                                 line }
}

/// `tab(e, ...)`: a collection of the arguments.
///
/// The element type is the common type of the non-null arguments, a
/// decimal when integers and decimals are mixed.
pub fn tab(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let mut elem = Type::AUTO;
    for arg in &args {
        let ty = arg.ty();
        elem = if ty.is_untyped() || elem.accepts(ty) {
            elem
        } else if elem.is_untyped() || ty.accepts(elem) {
            ty
        } else {
            return Err(RuntimeError::TypeMismatch { expected: elem.to_string(),
                                                    found: ty.to_string(),
                                                    line });
        };
    }
    Collection::from_values(elem, args, line).map(Value::from)
}

/// `tup(e, ...)`: a tuple of the arguments. Its row shape is registered so
/// `typeof` can name the fields.
pub fn tup(ctx: &mut Context, args: Vec<Value>, _: usize) -> EvalResult<Value> {
    let fields: Vec<Type> = args.iter().map(Value::ty).collect();
    ctx.shared().register_row(&fields);
    Ok(Value::from(Tuple::new(args)))
}

/// `imag(re, im)`
pub fn imag(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let mut parts = args.into_iter();
    let mut part = || -> EvalResult<f64> {
        let value = parts.next().ok_or(RuntimeError::NullValue { line })?;
        value.numeric(line)?.ok_or(RuntimeError::NullValue { line })
    };
    let re = part()?;
    let im = part()?;
    Ok(Value::from(Imaginary::new(re, im)))
}

/// `bytes(s)`: the UTF-8 encoding of a string.
pub fn to_bytes(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    Ok(match arg.literal(line)? {
        Some(s) => Value::from(s.as_bytes().to_vec()),
        None => Value::null(Type::TABCHAR),
    })
}

/// `str(x)`: the display form of any value.
pub fn to_str(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    if arg.is_null() {
        return Ok(Value::null(Type::LITERAL));
    }
    Ok(Value::from(arg.to_string()))
}

/// `int(x)`: truncates decimals, parses strings, maps booleans to 0 and 1.
pub fn to_int(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    let i = match arg.payload() {
        Payload::Null => return Ok(Value::null(Type::INTEGER)),
        Payload::Integer(i) => *i,
        Payload::Numeric(n) => f64_to_i64_truncated(*n, line)?,
        Payload::Boolean(b) => i64::from(*b),
        Payload::Literal(s) => {
            let text = s.trim();
            match text.parse::<i64>() {
                Ok(i) => i,
                Err(_) => {
                    let n = text.parse::<f64>().map_err(|_| {
                                                   RuntimeError::InvalidArgument { details: format!("'{s}' is not a number"),
                                                                                   line }
                                               })?;
                    f64_to_i64_truncated(n, line)?
                },
            }
        },
        _ => return Err(type_mismatch("a number, string or boolean", &arg, line)),
    };
    Ok(Value::from(i))
}

/// `num(x)`: converts to a decimal.
pub fn to_num(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    let n = match arg.payload() {
        Payload::Null => return Ok(Value::null(Type::NUMERIC)),
        Payload::Integer(i) => widen_integer(*i),
        Payload::Numeric(n) => *n,
        Payload::Boolean(b) => f64::from(u8::from(*b)),
        Payload::Literal(s) => s.trim().parse::<f64>().map_err(|_| {
                                                           RuntimeError::InvalidArgument { details: format!("'{s}' is not a number"),
                                                                                           line }
                                                       })?,
        _ => return Err(type_mismatch("a number, string or boolean", &arg, line)),
    };
    Ok(Value::from(n))
}

/// `abs(x)`: absolute value of a number, modulus of an imaginary number.
pub fn abs(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    match arg.payload() {
        Payload::Integer(i) => i.checked_abs()
                                .map(Value::from)
                                .ok_or(RuntimeError::Overflow { line }),
        Payload::Numeric(n) => Ok(Value::from(n.abs())),
        Payload::Imaginary(z) => Ok(Value::from(z.abs())),
        Payload::Null => Err(RuntimeError::NullValue { line }),
        _ => Err(type_mismatch("a number", &arg, line)),
    }
}

/// `sqrt(x)`
pub fn sqrt(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    let n = arg.numeric(line)?.ok_or(RuntimeError::NullValue { line })?;
    if n < 0.0 {
        return Err(RuntimeError::InvalidArgument { details: format!("square root of negative number {n}"),
                                                   line });
    }
    Ok(Value::from(n.sqrt()))
}

/// `random()`: a decimal in `[0, 1)`.
pub fn random(_: &mut Context, _: Vec<Value>, _: usize) -> EvalResult<Value> {
    Ok(Value::from(rand::thread_rng().gen_range(0.0..1.0)))
}

/// `isnull(x)`
pub fn isnull(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    Ok(Value::from(single(args, line)?.is_null()))
}

/// `typeof(x)`: the type name of a value, e.g. `integer[]` or
/// `row(integer, string)`.
pub fn type_of(ctx: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    Ok(Value::from(ctx.type_name(arg.ty())))
}

/// `error()`: the name of the error being handled, or null outside a
/// handler.
pub fn error(ctx: &mut Context, _: Vec<Value>, _: usize) -> EvalResult<Value> {
    Ok(ctx.current_error()
          .and_then(RuntimeError::name)
          .map_or_else(|| Value::null(Type::LITERAL), Value::from))
}

/// `readln()`: one line of input, or null at end of input.
pub fn readln(ctx: &mut Context, _: Vec<Value>, line: usize) -> EvalResult<Value> {
    Ok(ctx.shared()
          .read_line(line)?
          .map_or_else(|| Value::null(Type::LITERAL), Value::from))
}

/// `assert(cond)`: fails with `assertion_failed` unless `cond` is true.
pub fn assert_fn(_: &mut Context, args: Vec<Value>, line: usize) -> EvalResult<Value> {
    let arg = single(args, line)?;
    match arg.boolean(line)? {
        Some(true) => Ok(Value::from(true)),
        Some(false) => Err(RuntimeError::AssertionFailed { line }),
        None => Err(RuntimeError::NullValue { line }),
    }
}
