use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{core::Value, types::Type},
    },
};

/// A homogeneous array.
///
/// Every element has the collection's element type (nulls carry it as their
/// declared type). An `auto` collection adopts the type of the first concrete
/// element written into it while it holds no concrete element.
#[derive(Debug, Clone)]
pub struct Collection {
    elem:  Type,
    items: Vec<Value>,
}

impl Collection {
    /// Creates an empty collection of the given element type.
    #[must_use]
    pub const fn new(elem: Type) -> Self {
        Self { elem,
               items: Vec::new() }
    }

    /// Builds a collection from already checked elements.
    ///
    /// # Errors
    /// `TypeMismatch` if an element does not fit `elem`.
    pub fn from_values(elem: Type, items: Vec<Value>, line: usize) -> EvalResult<Self> {
        let mut collection = Self::new(elem);
        collection.items.reserve(items.len());
        for item in items {
            collection.push(item, line)?;
        }
        Ok(collection)
    }

    /// The element type.
    #[must_use]
    pub const fn elem_type(&self) -> Type {
        self.elem
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if there are no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// The element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// The element at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Checks `value` against the element type and returns it in stored
    /// form, adopting the type when the collection is still untyped.
    fn admit(&mut self, value: Value, line: usize) -> EvalResult<Value> {
        let incoming = value.ty();

        if self.elem.accepts(incoming) || (value.is_null() && incoming.is_untyped()) {
            let mut stored = value.widen_to(self.elem, line)?;
            stored.set_lvalue(false);
            return Ok(stored);
        }

        if self.elem.upgradable_to(incoming) && self.items.iter().all(Value::is_null) {
            tracing::trace!(from = %self.elem, to = %incoming, "collection adopts element type");
            self.adopt(incoming);
            return Ok(value);
        }

        Err(RuntimeError::TypeMismatch { expected: self.elem.to_string(),
                                         found: incoming.to_string(),
                                         line })
    }

    /// Appends an element.
    ///
    /// # Errors
    /// `TypeMismatch` if the element does not fit.
    pub fn push(&mut self, value: Value, line: usize) -> EvalResult<()> {
        let value = self.admit(value, line)?;
        self.items.push(value);
        Ok(())
    }

    /// Inserts an element before position `index` (`index == len` appends).
    ///
    /// # Errors
    /// `IndexOutOfRange` past the end, `TypeMismatch` if the element does not
    /// fit.
    pub fn insert(&mut self, index: usize, value: Value, line: usize) -> EvalResult<()> {
        if index > self.items.len() {
            return Err(self.out_of_range(index, line));
        }
        let value = self.admit(value, line)?;
        self.items.insert(index, value);
        Ok(())
    }

    /// Replaces the element at `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a missing element, `TypeMismatch` if the element
    /// does not fit.
    pub fn replace(&mut self, index: usize, value: Value, line: usize) -> EvalResult<Value> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index, line));
        }
        let value = self.admit(value, line)?;
        Ok(std::mem::replace(&mut self.items[index], value))
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a missing element.
    pub fn remove(&mut self, index: usize, line: usize) -> EvalResult<Value> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index, line));
        }
        Ok(self.items.remove(index))
    }

    /// Appends every element of `other`.
    ///
    /// # Errors
    /// `TypeMismatch` if the element types are incompatible. Nothing is
    /// appended in that case.
    pub fn concat(&mut self, other: Self, line: usize) -> EvalResult<()> {
        let mut staged = self.clone();
        for item in other.items {
            staged.push(item, line)?;
        }
        *self = staged;
        Ok(())
    }

    /// Gives a collection of nulls (or no elements) a concrete element type.
    pub(crate) fn adopt(&mut self, elem: Type) {
        self.elem = elem;
        for item in &mut self.items {
            item.retype_null(elem);
        }
    }

    /// Converts integer elements to decimals for a decimal element type.
    pub(crate) fn widen_to(self, elem: Type, line: usize) -> EvalResult<Self> {
        let mut widened = Self::new(elem);
        widened.items.reserve(self.items.len());
        for item in self.items {
            widened.items.push(item.widen_to(elem, line)?);
        }
        Ok(widened)
    }

    fn out_of_range(&self, index: usize, line: usize) -> RuntimeError {
        RuntimeError::IndexOutOfRange { index: i64::try_from(index).unwrap_or(i64::MAX),
                                        size: self.items.len(),
                                        line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_into_decimal_collections() {
        let mut c = Collection::new(Type::NUMERIC);
        c.push(Value::from(2), 1).unwrap();
        assert_eq!(c.get(0).unwrap().ty(), Type::NUMERIC);
    }

    #[test]
    fn shape_is_uniform() {
        let mut c = Collection::new(Type::INTEGER);
        c.push(Value::from(1), 1).unwrap();
        let err = c.push(Value::from("x"), 7).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { line: 7, .. }));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn untyped_collection_adopts_first_type() {
        let mut c = Collection::new(Type::AUTO);
        c.push(Value::from("a"), 1).unwrap();
        assert_eq!(c.elem_type(), Type::LITERAL);
        assert!(c.push(Value::from(1), 1).is_err());
    }

    #[test]
    fn failed_concat_appends_nothing() {
        let mut c = Collection::new(Type::INTEGER);
        c.push(Value::from(1), 1).unwrap();

        let mut other = Collection::new(Type::AUTO);
        other.items.push(Value::from(2));
        other.items.push(Value::from("three"));

        assert!(c.concat(other, 1).is_err());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn insert_bounds() {
        let mut c = Collection::new(Type::INTEGER);
        c.insert(0, Value::from(1), 1).unwrap();
        c.insert(1, Value::from(3), 1).unwrap();
        c.insert(1, Value::from(2), 1).unwrap();
        assert!(c.insert(5, Value::from(9), 1).is_err());
        let shown: Vec<String> = c.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["1", "2", "3"]);
    }
}
