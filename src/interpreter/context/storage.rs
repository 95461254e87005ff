use std::fmt::Display;

use crate::{
    error::RuntimeError,
    interpreter::{
        context::symbol::SymbolTable,
        evaluator::core::EvalResult,
        value::{
            core::{Payload, Value},
            types::Type,
        },
    },
    util::num::usize_to_i64_checked,
};

/// Upper bound on alias hops followed before the chain is declared cyclic.
pub const MAX_ALIAS_HOPS: usize = 16;

/// The address of a stored value: a storage slot plus a path of element
/// positions into nested collections and tuples (both 0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    /// The storage slot.
    pub slot: usize,
    /// Element positions, outermost first.
    pub path: Vec<usize>,
}

impl Place {
    /// The place of a whole variable.
    #[must_use]
    pub const fn variable(slot: usize) -> Self {
        Self { slot,
               path: Vec::new() }
    }

    /// The place of the element at `position` inside this place.
    #[must_use]
    pub fn child(&self, position: usize) -> Self {
        let mut path = self.path.clone();
        path.push(position);
        Self { slot: self.slot,
               path }
    }
}

impl Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<alias #{}", self.slot)?;
        for position in &self.path {
            write!(f, "@{position}")?;
        }
        write!(f, ">")
    }
}

/// One variable cell.
#[derive(Debug, Clone)]
pub struct Slot {
    /// The stored value (an lvalue, or an alias).
    pub value:  Value,
    /// Runtime type-safety flag.
    pub safety: bool,
}

impl Slot {
    fn fresh(ty: Type, safety: bool) -> Self {
        let mut value = Value::null(ty);
        value.set_lvalue(true);
        Self { value, safety }
    }
}

/// The storage pool of a context.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    slots: Vec<Slot>,
}

fn internal(details: String, line: usize) -> RuntimeError {
    RuntimeError::Internal { details, line }
}

fn element(value: &Value, position: usize, line: usize) -> EvalResult<&Value> {
    let (found, size) = match value.payload() {
        Payload::Collection(c) => (c.get(position), c.len()),
        Payload::Tuple(t) => (t.items().get(position), t.len()),
        _ => return Err(internal(format!("cannot address an element of {}", value.ty()), line)),
    };
    found.ok_or(RuntimeError::IndexOutOfRange { index: usize_to_i64_checked(position, line)?,
                                                size,
                                                line })
}

fn element_mut(value: &mut Value, position: usize, line: usize) -> EvalResult<&mut Value> {
    if matches!(value.payload(), Payload::Tuple(_)) {
        let tuple = value.tuple_mut(line)?;
        let size = tuple.len();
        let index = usize_to_i64_checked(position + 1, line)?;
        return tuple.item_mut(index, line)
                    .map_err(|_| RuntimeError::IndexOutOfRange { index, size, line });
    }
    let ty = value.ty();
    let collection = value.collection_mut(line)
                          .map_err(|_| internal(format!("cannot address an element of {ty}"), line))?;
    let size = collection.len();
    collection.get_mut(position)
              .ok_or(RuntimeError::IndexOutOfRange { index: usize_to_i64_checked(position, line)?,
                                                     size,
                                                     line })
}

impl Storage {
    /// Grows the pool so every symbol of `symbols` has a slot, initialising
    /// new slots to typed nulls.
    pub fn sync(&mut self, symbols: &SymbolTable) {
        for symbol in &symbols.symbols()[self.slots.len().min(symbols.len())..] {
            self.slots.push(Slot::fresh(symbol.ty, symbol.safety));
        }
    }

    /// Builds a pool with one typed null per symbol.
    #[must_use]
    pub fn from_symbols(symbols: &SymbolTable) -> Self {
        let mut storage = Self::default();
        storage.sync(symbols);
        storage
    }

    /// Resets every slot to the typed null and safety flag of its symbol.
    pub fn reset(&mut self, symbols: &SymbolTable) {
        self.slots.clear();
        self.sync(symbols);
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no slot exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// The slot at `index`.
    ///
    /// # Errors
    /// `Internal` if the slot was never allocated.
    pub fn slot(&self, index: usize, line: usize) -> EvalResult<&Slot> {
        self.slots
            .get(index)
            .ok_or_else(|| internal(format!("storage slot {index} is not allocated"), line))
    }

    /// The slot at `index`, mutably.
    ///
    /// # Errors
    /// `Internal` if the slot was never allocated.
    pub fn slot_mut(&mut self, index: usize, line: usize) -> EvalResult<&mut Slot> {
        self.slots
            .get_mut(index)
            .ok_or_else(|| internal(format!("storage slot {index} is not allocated"), line))
    }

    /// Follows alias slots until `place` addresses a concrete value.
    ///
    /// # Errors
    /// `Internal` for an unallocated slot or an alias chain longer than
    /// [`MAX_ALIAS_HOPS`].
    pub fn resolve(&self, place: &Place, line: usize) -> EvalResult<Place> {
        let mut current = place.clone();
        for _ in 0..MAX_ALIAS_HOPS {
            let slot = self.slot(current.slot, line)?;
            let Some(target) = slot.value.as_alias() else {
                return Ok(current);
            };
            let mut path = target.path.clone();
            path.extend(current.path);
            current = Place { slot: target.slot,
                              path };
        }
        Err(internal(format!("alias chain from {place} does not end"), line))
    }

    /// The value at a resolved place.
    ///
    /// # Errors
    /// `IndexOutOfRange` if an element on the path no longer exists.
    pub fn get(&self, place: &Place, line: usize) -> EvalResult<&Value> {
        let place = self.resolve(place, line)?;
        let mut value = &self.slot(place.slot, line)?.value;
        for &position in &place.path {
            value = element(value, position, line)?;
        }
        Ok(value)
    }

    /// The value at a resolved place, mutably. Null collections on the path
    /// are materialised as empty ones.
    ///
    /// # Errors
    /// `IndexOutOfRange` if an element on the path no longer exists.
    pub fn get_mut(&mut self, place: &Place, line: usize) -> EvalResult<&mut Value> {
        let place = self.resolve(place, line)?;
        let mut value = &mut self.slot_mut(place.slot, line)?.value;
        for &position in &place.path {
            value = element_mut(value, position, line)?;
        }
        Ok(value)
    }

    /// Writes `value` through aliases.
    ///
    /// A whole variable is checked against its current value: identical
    /// types pass, an untyped null takes the slot's type, integers widen into
    /// decimals, and with safety on only an untyped slot may change type. An
    /// element is checked against its container.
    ///
    /// # Errors
    /// `TypeMismatch` when the value does not fit.
    pub fn store(&mut self, slot: usize, value: Value, line: usize) -> EvalResult<()> {
        let place = self.resolve(&Place::variable(slot), line)?;

        let Some((&last, parent_path)) = place.path.split_last() else {
            return self.store_whole(place.slot, value, line);
        };

        let parent = Place { slot: place.slot,
                             path: parent_path.to_vec() };
        let container = self.get_mut(&parent, line)?;
        if matches!(container.payload(), Payload::Tuple(_)) {
            let index = usize_to_i64_checked(last + 1, line)?;
            container.tuple_mut(line)?.put(index, value, line)?;
        } else {
            container.collection_mut(line)?.replace(last, value, line)?;
        }
        Ok(())
    }

    fn store_whole(&mut self, index: usize, value: Value, line: usize) -> EvalResult<()> {
        let slot = self.slot_mut(index, line)?;
        let current = slot.value.ty();
        let incoming = value.ty();

        let mut value = if current.accepts(incoming) || incoming.is_untyped() {
            value.widen_to(current, line)?
        } else {
            value
        };

        if slot.safety && value.ty() != current && !current.upgradable_to(value.ty()) {
            return Err(RuntimeError::TypeMismatch { expected: current.to_string(),
                                                    found: value.ty().to_string(),
                                                    line });
        }

        value.set_lvalue(true);
        slot.value = value;
        Ok(())
    }

    /// Binds `slot` directly to `value` without any check. Used to place
    /// aliases in iterator slots.
    ///
    /// # Errors
    /// `Internal` if the slot was never allocated.
    pub fn bind(&mut self, slot: usize, value: Value, line: usize) -> EvalResult<()> {
        self.slot_mut(slot, line)?.value = value;
        Ok(())
    }

    /// Reads the value of a variable through aliases as an rvalue copy.
    ///
    /// # Errors
    /// `Internal` for an unallocated slot.
    pub fn load(&self, slot: usize, line: usize) -> EvalResult<Value> {
        Ok(self.get(&Place::variable(slot), line)?.clone())
    }

    /// Sets the runtime safety flag of `slot` and returns the previous one.
    ///
    /// # Errors
    /// `Internal` for an unallocated slot.
    pub fn pin(&mut self, slot: usize, line: usize) -> EvalResult<bool> {
        let slot = self.slot_mut(slot, line)?;
        Ok(std::mem::replace(&mut slot.safety, true))
    }

    /// Restores the safety flag returned by [`Storage::pin`].
    pub fn unpin(&mut self, slot: usize, prior: bool) {
        if let Some(slot) = self.slots.get_mut(slot) {
            slot.safety = prior;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{lexer::Position, value::collection::Collection};

    fn storage_with(names: &[(&str, Type)]) -> Storage {
        let mut symbols = SymbolTable::new();
        for (name, ty) in names {
            symbols.register(name, *ty, Position::new(1, 1)).unwrap();
        }
        Storage::from_symbols(&symbols)
    }

    #[test]
    fn pinned_slot_takes_first_type_only() {
        let mut storage = storage_with(&[("$x", Type::AUTO)]);
        storage.store(0, Value::from(1), 1).unwrap();
        storage.store(0, Value::from(2), 1).unwrap();
        assert!(matches!(storage.store(0, Value::from("two"), 3),
                         Err(RuntimeError::TypeMismatch { line: 3, .. })));
        assert_eq!(storage.load(0, 1).unwrap().to_string(), "2");
    }

    #[test]
    fn stored_values_are_lvalues_and_loads_are_not() {
        let mut storage = storage_with(&[("x", Type::AUTO)]);
        storage.store(0, Value::from(4.5), 1).unwrap();
        assert!(storage.slot(0, 1).unwrap().value.is_lvalue());
        assert!(!storage.load(0, 1).unwrap().is_lvalue());
    }

    #[test]
    fn integers_widen_into_decimal_slots() {
        let mut storage = storage_with(&[("$d", Type::NUMERIC)]);
        storage.store(0, Value::from(2), 1).unwrap();
        assert_eq!(storage.load(0, 1).unwrap().ty(), Type::NUMERIC);
    }

    #[test]
    fn writes_through_alias_land_in_source() {
        let mut storage = storage_with(&[("t", Type::INTEGER.array_of()), ("e", Type::INTEGER)]);
        let items = Collection::from_values(Type::INTEGER, vec![Value::from(1), Value::from(2)], 1).unwrap();
        storage.store(0, Value::from(items), 1).unwrap();

        storage.bind(1, Value::alias(Place::variable(0).child(1), Type::INTEGER), 1)
               .unwrap();
        storage.store(1, Value::from(20), 1).unwrap();

        assert_eq!(storage.load(0, 1).unwrap().to_string(), "[1, 20]");
        assert_eq!(storage.load(1, 1).unwrap().to_string(), "20");
        assert!(storage.store(1, Value::from("x"), 1).is_err());
    }

    #[test]
    fn alias_cycles_are_internal_errors() {
        let mut storage = storage_with(&[("a", Type::AUTO), ("b", Type::AUTO)]);
        storage.bind(0, Value::alias(Place::variable(1), Type::AUTO), 1).unwrap();
        storage.bind(1, Value::alias(Place::variable(0), Type::AUTO), 1).unwrap();
        assert!(matches!(storage.load(0, 9), Err(RuntimeError::Internal { line: 9, .. })));
    }
}
