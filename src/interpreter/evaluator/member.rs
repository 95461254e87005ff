use crate::{
    ast::{Expr, Method},
    error::RuntimeError,
    interpreter::{
        context::{Context, storage::Place},
        evaluator::core::{EvalResult, check_native_args},
        plugin::Returned,
        value::{
            complex::Complex,
            core::{Payload, Value},
            types::Type,
        },
    },
    util::num::{checked_index, i64_to_usize_checked, usize_to_i64_checked},
};

fn not_indexable(value: &Value, line: usize) -> RuntimeError {
    RuntimeError::TypeMismatch { expected: "a collection, row, string or bytes".to_string(),
                                 found: value.ty().to_string(),
                                 line }
}

fn missing_argument(line: usize) -> RuntimeError {
    RuntimeError::Internal { details: "missing method argument".to_string(),
                             line }
}

fn integer_arg(value: &Value, line: usize) -> EvalResult<i64> {
    value.integer(line)?.ok_or(RuntimeError::NullValue { line })
}

fn text_of(value: &Value, line: usize) -> EvalResult<&str> {
    value.literal(line)?.ok_or(RuntimeError::NullValue { line })
}

fn nth_arg(args: &[Value], i: usize, line: usize) -> EvalResult<&Value> {
    args.get(i).ok_or_else(|| missing_argument(line))
}

/// Reads element `index` of a container.
///
/// Collections, strings and bytes count from 0, rows from 1. A string
/// element is a one-character string and a bytes element an integer.
///
/// # Errors
/// - `IndexOutOfRange` for an index outside the container.
/// - `NullValue` for a null container.
/// - `TypeMismatch` for a value that cannot be indexed.
///
/// # Example
/// ```
/// use plume::interpreter::{evaluator::member::element_at, value::core::Value};
///
/// assert_eq!(element_at(&Value::from("héllo"), 1, 1).unwrap().to_string(), "é");
/// assert_eq!(element_at(&Value::from(vec![7u8, 9]), 1, 1).unwrap().to_string(), "9");
/// assert!(element_at(&Value::from("abc"), 3, 1).is_err());
/// ```
pub fn element_at(container: &Value, index: i64, line: usize) -> EvalResult<Value> {
    match container.payload() {
        Payload::Collection(c) => {
            let position = checked_index(index, c.len(), 0, line)?;
            c.get(position)
             .cloned()
             .ok_or(RuntimeError::IndexOutOfRange { index,
                                                    size: c.len(),
                                                    line })
        },
        Payload::Tuple(t) => t.item(index, line).cloned(),
        Payload::Literal(s) => {
            let position = checked_index(index, s.chars().count(), 0, line)?;
            Ok(s.chars()
                .nth(position)
                .map_or_else(|| Value::from(""), |c| Value::from(c.to_string())))
        },
        Payload::Tabchar(bytes) => {
            let position = checked_index(index, bytes.len(), 0, line)?;
            Ok(Value::from(i64::from(bytes[position])))
        },
        Payload::Null => Err(RuntimeError::NullValue { line }),
        _ => Err(not_indexable(container, line)),
    }
}

impl Context {
    /// The storage place an expression denotes, if any.
    ///
    /// Variables denote their slot; `@` on a collection or row stored in a
    /// variable denotes the element. Strings, bytes and computed values
    /// have no place.
    fn place_of(&mut self, expr: &Expr) -> EvalResult<Option<Place>> {
        match expr {
            Expr::Variable { slot, .. } => Ok(Some(Place::variable(*slot))),
            Expr::Group { inner, .. } => self.place_of(inner),
            Expr::Index { base, index, pos, .. } => {
                let line = pos.line;
                let Some(parent) = self.place_of(base)? else {
                    return Ok(None);
                };
                let index = integer_arg(&self.evaluate(index)?, line)?;
                self.sync_storage();
                let container = self.storage.get(&parent, line)?;
                let position = match container.payload() {
                    Payload::Collection(c) => checked_index(index, c.len(), 0, line)?,
                    Payload::Tuple(t) => checked_index(index, t.len(), 1, line)?,
                    Payload::Null => return Err(RuntimeError::NullValue { line }),
                    _ => return Ok(None),
                };
                Ok(Some(parent.child(position)))
            },
            _ => Ok(None),
        }
    }

    /// Evaluates `base@index`.
    ///
    /// Elements of stored containers are read in place; other bases are
    /// evaluated first.
    pub(crate) fn eval_index(&mut self, base: &Expr, index: &Expr, line: usize) -> EvalResult<Value> {
        if let Some(place) = self.place_of(base)? {
            let index = integer_arg(&self.evaluate(index)?, line)?;
            self.sync_storage();
            let container = self.storage.get(&place, line)?;
            return element_at(container, index, line);
        }
        let container = self.evaluate(base)?;
        let index = integer_arg(&self.evaluate(index)?, line)?;
        element_at(&container, index, line)
    }

    /// Evaluates `receiver.method(args)`.
    ///
    /// Mutating methods change the receiver in place when it denotes
    /// storage and a temporary copy otherwise; they return the new element
    /// count. Native methods are dispatched to the object's module.
    ///
    /// # Returns
    /// `None` for a native method declared without a result.
    pub(crate) fn eval_method(&mut self,
                              receiver: &Expr,
                              method: &Method,
                              args: &[Expr],
                              line: usize)
                              -> EvalResult<Option<Value>> {
        if method.is_mutating() {
            let place = self.place_of(receiver)?;
            let values = self.evaluate_args(args)?;
            let count = match place {
                Some(place) => {
                    self.sync_storage();
                    let target = self.storage.get_mut(&place, line)?;
                    apply_mutation(target, method, values, line)?
                },
                None => {
                    let mut target = self.evaluate(receiver)?;
                    apply_mutation(&mut target, method, values, line)?
                },
            };
            return Ok(Some(Value::from(count)));
        }

        let target = self.evaluate(receiver)?;
        let values = self.evaluate_args(args)?;
        if let Method::Native { name, id, .. } = method {
            return call_native(&target, name, *id, &values, line);
        }
        builtin_method(&target, method, &values, line).map(Some)
    }
}

/// Applies `concat`, `insert`, `delete` or `put` and returns the new count.
///
/// `concat` appends a single element when the collection's element type
/// admits the argument and all elements of a collection argument otherwise.
fn apply_mutation(target: &mut Value, method: &Method, args: Vec<Value>, line: usize) -> EvalResult<i64> {
    let mut args = args.into_iter();
    let mut arg = || args.next().ok_or_else(|| missing_argument(line));

    if *method == Method::Put && matches!(target.payload(), Payload::Tuple(_)) {
        let index = integer_arg(&arg()?, line)?;
        let tuple = target.tuple_mut(line)?;
        tuple.put(index, arg()?, line)?;
        return usize_to_i64_checked(tuple.len(), line);
    }

    let collection = target.collection_mut(line)?;
    match method {
        Method::Concat => {
            let value = arg()?;
            let elem = collection.elem_type();
            if elem.accepts(value.ty()) || elem.is_untyped() || (value.is_null() && value.ty().is_untyped()) {
                collection.push(value, line)?;
            } else if let Some(other) = value.collection(line)? {
                collection.concat(other.clone(), line)?;
            }
        },
        Method::Insert => {
            let index = integer_arg(&arg()?, line)?;
            let position = i64_to_usize_checked(index, collection.len(), line)?;
            collection.insert(position, arg()?, line)?;
        },
        Method::Delete => {
            let index = integer_arg(&arg()?, line)?;
            let position = checked_index(index, collection.len(), 0, line)?;
            collection.remove(position, line)?;
        },
        Method::Put => {
            let index = integer_arg(&arg()?, line)?;
            let position = checked_index(index, collection.len(), 0, line)?;
            collection.replace(position, arg()?, line)?;
        },
        _ => {
            return Err(RuntimeError::Internal { details: format!("'{}' does not mutate", method.name()),
                                                line });
        },
    }
    usize_to_i64_checked(collection.len(), line)
}

/// The non-mutating builtin methods.
fn builtin_method(target: &Value, method: &Method, args: &[Value], line: usize) -> EvalResult<Value> {
    if target.is_null() {
        return Err(RuntimeError::NullValue { line });
    }

    match method {
        Method::Count => {
            let count = match target.payload() {
                Payload::Collection(c) => c.len(),
                Payload::Tuple(t) => t.len(),
                Payload::Literal(s) => s.chars().count(),
                Payload::Tabchar(b) => b.len(),
                _ => return Err(not_indexable(target, line)),
            };
            usize_to_i64_checked(count, line).map(Value::from)
        },
        Method::Upper => Ok(Value::from(text_of(target, line)?.to_uppercase())),
        Method::Lower => Ok(Value::from(text_of(target, line)?.to_lowercase())),
        Method::Substr => {
            let s = text_of(target, line)?;
            let size = s.chars().count();
            let start = integer_arg(nth_arg(args, 0, line)?, line)?;
            let start = i64_to_usize_checked(start, size, line)?;
            if start > size {
                return Err(RuntimeError::IndexOutOfRange { index: usize_to_i64_checked(start, line)?,
                                                           size,
                                                           line });
            }
            let len = integer_arg(nth_arg(args, 1, line)?, line)?;
            let len = usize::try_from(len).map_err(|_| {
                                               RuntimeError::InvalidArgument { details: format!("negative length {len}"),
                                                                               line }
                                           })?;
            Ok(Value::from(s.chars().skip(start).take(len).collect::<String>()))
        },
        Method::Find => {
            let s = text_of(target, line)?;
            let needle = nth_arg(args, 0, line)?.literal(line)?.ok_or(RuntimeError::NullValue { line })?;
            match s.find(needle) {
                Some(byte) => usize_to_i64_checked(s[..byte].chars().count(), line).map(Value::from),
                None => Ok(Value::from(-1)),
            }
        },
        Method::Re | Method::Im => {
            let z = target.imaginary(line)?.ok_or(RuntimeError::NullValue { line })?;
            Ok(Value::from(if *method == Method::Re { z.re } else { z.im }))
        },
        _ => Err(RuntimeError::Internal { details: format!("'{}' is not a builtin method", method.name()),
                                          line }),
    }
}

/// Calls a method of a native object through its module.
fn call_native(target: &Value, name: &str, id: u32, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
    let object = target.complex(line)?.ok_or(RuntimeError::NullValue { line })?;
    let module = object.module();
    let own = Type::object(object.type_id());
    if let Some(decl) = module.descriptor().method(name) {
        check_native_args(decl, args, own, line)?;
    }

    let returned = module.execute_method(object.handle(), id, args)
                         .map_err(|details| RuntimeError::PluginFailure { details, line })?;
    Ok(match returned {
        Returned::Value(value) => Some(value),
        Returned::Object(handle) => Some(Value::from(Complex::new(module, object.type_id(), handle))),
        Returned::Nothing => None,
    })
}
