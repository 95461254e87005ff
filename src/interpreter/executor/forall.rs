use crate::{
    ast::Statement,
    interpreter::{
        context::{Context, ScopeKind, storage::Place},
        evaluator::core::EvalResult,
        value::{core::Value, types::Type},
    },
};

impl Context {
    /// Runs `forall` over the collection stored in `source`.
    ///
    /// The iterator is bound to an alias of each element in turn, so reads
    /// and writes through it reach the collection. After the loop it holds a
    /// copy of the last element visited. A null collection runs no pass.
    pub(crate) fn run_forall(&mut self,
                             slot: usize,
                             source: usize,
                             body: &[Statement],
                             line: usize)
                             -> EvalResult<()> {
        self.sync_storage();
        let (count, elem) = match self.storage.get(&Place::variable(source), line)?.collection(line)? {
            Some(items) => (items.len(), items.elem_type()),
            None => return Ok(()),
        };

        let prior = self.storage.pin(slot, line)?;
        let scope = self.push_scope(ScopeKind::Loop);
        let result = self.forall_passes(slot, source, count, elem, body, line);
        self.pop_scope(scope);
        let settled = self.settle_iterator(slot, line);
        self.storage.unpin(slot, prior);
        result.and(settled)
    }

    fn forall_passes(&mut self,
                     slot: usize,
                     source: usize,
                     count: usize,
                     elem: Type,
                     body: &[Statement],
                     line: usize)
                     -> EvalResult<()> {
        for index in 0..count {
            let element = Place::variable(source).child(index);
            self.storage.bind(slot, Value::alias(element, elem), line)?;
            self.run_block(body)?;
            if self.take_break() || self.flags().returning {
                break;
            }
            self.take_continue();
        }
        Ok(())
    }

    /// Replaces an alias left in the iterator by a copy of its target.
    fn settle_iterator(&mut self, slot: usize, line: usize) -> EvalResult<()> {
        if self.storage.slot(slot, line)?.value.as_alias().is_none() {
            return Ok(());
        }
        let mut copy = self.storage.load(slot, line)?;
        copy.set_lvalue(true);
        self.storage.bind(slot, copy, line)
    }
}
