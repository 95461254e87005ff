use std::collections::HashMap;

use crate::{
    error::ParseError,
    interpreter::{lexer::Position, parser::core::ParseResult, value::types::Type},
};

/// The prefix that pins a variable's type from its first concrete
/// assignment on.
pub const SAFETY_SIGIL: char = '$';

/// A named storage slot known to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Index into the context's storage.
    pub slot:   usize,
    /// Lower-case name, including the sigil if any.
    pub name:   String,
    /// The type the parser currently assumes for the slot.
    pub ty:     Type,
    /// When set, the type may only change from untyped to concrete.
    pub safety: bool,
}

/// An undo entry of the transactional log.
#[derive(Debug, Clone)]
enum Undo {
    Registered,
    Upgraded { slot: usize, prior: Type },
}

/// Name to slot registry with type upgrade and safety rules.
///
/// Slots are allocated sequentially. Registrations and silent type upgrades
/// made since [`SymbolTable::begin_attempt`] are logged so a failed parse can
/// [`SymbolTable::rollback`] them; [`SymbolTable::commit`] flushes the log.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    names:   HashMap<String, usize>,
    log:     Vec<Undo>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a symbol by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.names.get(name).map(|&slot| &self.symbols[slot])
    }

    /// The symbol owning `slot`.
    #[must_use]
    pub fn by_slot(&self, slot: usize) -> Option<&Symbol> {
        self.symbols.get(slot)
    }

    /// All symbols, in slot order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of allocated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// `true` if no slot has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Registers `name` with type `ty` and returns its slot.
    ///
    /// * Absent: allocates the next slot, pinned if the name carries the
    ///   safety sigil.
    /// * Same type, or an untyped incoming type: nothing changes.
    /// * An integer into a decimal symbol: accepted as widening.
    /// * Safety on: an untyped symbol is upgraded, anything else is a type
    ///   mismatch.
    /// * Safety off: the type is silently upgraded.
    ///
    /// # Errors
    /// `TypeMismatch` when a pinned symbol would change its concrete type.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::{
    ///     context::symbol::SymbolTable,
    ///     lexer::Position,
    ///     value::types::Type,
    /// };
    ///
    /// let mut table = SymbolTable::new();
    /// let pos = Position::new(1, 1);
    ///
    /// let x = table.register("x", Type::INTEGER, pos).unwrap();
    /// table.register("x", Type::LITERAL, pos).unwrap();
    /// assert_eq!(table.by_slot(x).unwrap().ty, Type::LITERAL);
    ///
    /// table.register("$y", Type::AUTO, pos).unwrap();
    /// table.register("$y", Type::INTEGER, pos).unwrap();
    /// assert!(table.register("$y", Type::LITERAL, pos).is_err());
    /// ```
    pub fn register(&mut self, name: &str, ty: Type, pos: Position) -> ParseResult<usize> {
        let Some(&slot) = self.names.get(name) else {
            let slot = self.symbols.len();
            self.symbols.push(Symbol { slot,
                                       name: name.to_string(),
                                       ty,
                                       safety: name.starts_with(SAFETY_SIGIL) });
            self.names.insert(name.to_string(), slot);
            self.log.push(Undo::Registered);
            return Ok(slot);
        };

        let symbol = &mut self.symbols[slot];
        if symbol.ty == ty || ty.is_untyped() || symbol.ty.accepts(ty) {
            return Ok(slot);
        }

        if symbol.safety && !symbol.ty.upgradable_to(ty) {
            return Err(ParseError::TypeMismatch { expected: symbol.ty.to_string(),
                                                  found: ty.to_string(),
                                                  pos });
        }

        tracing::trace!(name, from = %symbol.ty, to = %ty, "symbol type upgraded");
        self.log.push(Undo::Upgraded { slot,
                                       prior: symbol.ty });
        symbol.ty = ty;
        Ok(slot)
    }

    /// Pins the type of `slot` and returns the previous safety flag.
    pub fn pin(&mut self, slot: usize) -> bool {
        self.symbols
            .get_mut(slot)
            .is_some_and(|s| std::mem::replace(&mut s.safety, true))
    }

    /// Restores the safety flag returned by [`SymbolTable::pin`].
    pub fn unpin(&mut self, slot: usize, prior: bool) {
        if let Some(symbol) = self.symbols.get_mut(slot) {
            symbol.safety = prior;
        }
    }

    /// Starts a new parse attempt with an empty log.
    pub fn begin_attempt(&mut self) {
        self.log.clear();
    }

    /// Keeps everything registered during the attempt.
    pub fn commit(&mut self) {
        self.log.clear();
    }

    /// Undoes every registration and upgrade made during the attempt, most
    /// recent first.
    pub fn rollback(&mut self) {
        if !self.log.is_empty() {
            tracing::debug!(entries = self.log.len(), "rolling back symbol table");
        }
        while let Some(undo) = self.log.pop() {
            match undo {
                Undo::Registered => {
                    if let Some(symbol) = self.symbols.pop() {
                        self.names.remove(&symbol.name);
                    }
                },
                Undo::Upgraded { slot, prior } => {
                    if let Some(symbol) = self.symbols.get_mut(slot) {
                        symbol.ty = prior;
                    }
                },
            }
        }
    }

    /// Forgets every symbol.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.names.clear();
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POS: Position = Position::new(1, 1);

    #[test]
    fn slots_are_sequential() {
        let mut table = SymbolTable::new();
        assert_eq!(table.register("a", Type::INTEGER, POS).unwrap(), 0);
        assert_eq!(table.register("b", Type::INTEGER, POS).unwrap(), 1);
        assert_eq!(table.register("a", Type::INTEGER, POS).unwrap(), 0);
    }

    #[test]
    fn sigil_pins_safety() {
        let mut table = SymbolTable::new();
        let slot = table.register("$n", Type::INTEGER, POS).unwrap();
        assert!(table.by_slot(slot).unwrap().safety);
        assert!(matches!(table.register("$n", Type::LITERAL, POS),
                         Err(ParseError::TypeMismatch { .. })));
        assert_eq!(table.register("$n", Type::INTEGER, POS).unwrap(), slot);
    }

    #[test]
    fn widening_keeps_decimal() {
        let mut table = SymbolTable::new();
        let slot = table.register("$d", Type::NUMERIC, POS).unwrap();
        table.register("$d", Type::INTEGER, POS).unwrap();
        assert_eq!(table.by_slot(slot).unwrap().ty, Type::NUMERIC);
    }

    #[test]
    fn untyped_incoming_is_a_no_op() {
        let mut table = SymbolTable::new();
        let slot = table.register("s", Type::LITERAL, POS).unwrap();
        table.register("s", Type::AUTO, POS).unwrap();
        assert_eq!(table.by_slot(slot).unwrap().ty, Type::LITERAL);
    }

    #[test]
    fn rollback_undoes_attempt_only() {
        let mut table = SymbolTable::new();
        table.register("kept", Type::INTEGER, POS).unwrap();
        table.commit();

        table.begin_attempt();
        table.register("kept", Type::LITERAL, POS).unwrap();
        table.register("fresh", Type::BOOLEAN, POS).unwrap();
        table.rollback();

        assert_eq!(table.lookup("kept").unwrap().ty, Type::INTEGER);
        assert!(table.lookup("fresh").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn pin_and_unpin() {
        let mut table = SymbolTable::new();
        let slot = table.register("i", Type::INTEGER, POS).unwrap();
        let prior = table.pin(slot);
        assert!(!prior);
        assert!(table.register("i", Type::LITERAL, POS).is_err());
        table.unpin(slot, prior);
        assert!(table.register("i", Type::LITERAL, POS).is_ok());
    }
}
