use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{core::Value, types::Type},
    },
    util::num::checked_index,
};

/// A fixed-shape row of values, addressed from 1.
///
/// The field types are fixed at construction; `put` may only store values
/// that fit the existing field.
#[derive(Debug, Clone)]
pub struct Tuple {
    items: Vec<Value>,
}

impl Tuple {
    /// Builds a row from its field values, in order.
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        let items = items.into_iter()
                         .map(|mut v| {
                             v.set_lvalue(false);
                             v
                         })
                         .collect();
        Self { items }
    }

    /// The field values.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// The ordered field types.
    #[must_use]
    pub fn fields(&self) -> Vec<Type> {
        self.items.iter().map(Value::ty).collect()
    }

    /// The structural row type.
    #[must_use]
    pub fn row_type(&self) -> Type {
        Type::row(&self.fields())
    }

    /// Number of fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` for the empty row.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The field at 1-based `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` outside `1..=len`.
    pub fn item(&self, index: i64, line: usize) -> EvalResult<&Value> {
        let position = checked_index(index, self.items.len(), 1, line)?;
        Ok(&self.items[position])
    }

    /// Mutable access to the field at 1-based `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` outside `1..=len`.
    pub fn item_mut(&mut self, index: i64, line: usize) -> EvalResult<&mut Value> {
        let position = checked_index(index, self.items.len(), 1, line)?;
        Ok(&mut self.items[position])
    }

    /// Replaces the field at 1-based `index`, keeping the row's shape.
    ///
    /// # Errors
    /// `IndexOutOfRange` outside `1..=len`, `TypeMismatch` if the value does
    /// not fit the field type.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::value::{core::Value, tuple::Tuple};
    ///
    /// let mut row = Tuple::new(vec![Value::from(1), Value::from("a")]);
    /// let before = row.row_type();
    ///
    /// row.put(1, Value::from(5), 1).unwrap();
    /// assert!(row.put(2, Value::from(5), 1).is_err());
    /// assert!(row.put(3, Value::from("b"), 1).is_err());
    /// assert_eq!(row.row_type(), before);
    /// ```
    pub fn put(&mut self, index: i64, value: Value, line: usize) -> EvalResult<Value> {
        let slot = self.item_mut(index, line)?;
        let field = slot.ty();
        if !field.accepts(value.ty()) && !(value.is_null() && value.ty().is_untyped()) {
            return Err(RuntimeError::TypeMismatch { expected: field.to_string(),
                                                    found: value.ty().to_string(),
                                                    line });
        }
        let mut value = value.widen_to(field, line)?;
        value.set_lvalue(false);
        Ok(std::mem::replace(slot, value))
    }
}
