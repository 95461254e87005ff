use crate::{
    ast::{Expr, ForLoop},
    error::RuntimeError,
    interpreter::{
        context::{Context, ScopeKind},
        evaluator::core::EvalResult,
        value::core::Value,
    },
};

/// The evaluated bounds of a counted loop.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    end:        i64,
    step:       i64,
    descending: bool,
}

impl Bounds {
    const fn admits(self, value: i64) -> bool {
        if self.descending {
            value >= self.end
        } else {
            value <= self.end
        }
    }

    fn advance(self, value: i64) -> Option<i64> {
        let next = if self.descending {
            value.checked_sub(self.step)
        } else {
            value.checked_add(self.step)
        };
        next.filter(|n| self.admits(*n))
    }
}

impl Context {
    fn integer_of(&mut self, expr: &Expr, line: usize) -> EvalResult<i64> {
        self.evaluate(expr)?
            .integer(line)?
            .ok_or(RuntimeError::NullValue { line })
    }

    /// Runs a counted loop.
    ///
    /// The iterator starts at the first value and the loop runs while it is
    /// within the bound (`<=` ascending, `>=` with `desc`). After each pass
    /// the iterator's current value advances by the step if the result is
    /// still within the bound; otherwise the loop ends and the iterator
    /// keeps its value. The iterator's type is pinned for the duration.
    ///
    /// # Errors
    /// `InvalidArgument` for a step that is not positive, and any error of
    /// the bounds or the body.
    pub(crate) fn run_for(&mut self, for_loop: &ForLoop) -> EvalResult<()> {
        let line = for_loop.pos.line;
        let begin = self.integer_of(&for_loop.from, line)?;
        let end = self.integer_of(&for_loop.to, line)?;
        let step = match &for_loop.step {
            Some(step) => self.integer_of(step, line)?,
            None => 1,
        };
        if step <= 0 {
            return Err(RuntimeError::InvalidArgument { details: format!("loop step must be positive, got {step}"),
                                                       line });
        }
        let bounds = Bounds { end,
                              step,
                              descending: for_loop.descending };

        self.store_variable(for_loop.slot, Value::from(begin), line)?;
        if !bounds.admits(begin) {
            return Ok(());
        }

        let prior = self.storage.pin(for_loop.slot, line)?;
        let scope = self.push_scope(ScopeKind::Loop);
        let result = self.for_passes(for_loop, bounds, line);
        self.pop_scope(scope);
        self.storage.unpin(for_loop.slot, prior);
        result
    }

    fn for_passes(&mut self, for_loop: &ForLoop, bounds: Bounds, line: usize) -> EvalResult<()> {
        loop {
            self.run_block(&for_loop.body)?;
            if self.take_break() || self.flags().returning {
                return Ok(());
            }
            self.take_continue();

            let current = self.load(for_loop.slot, line)?
                              .integer(line)?
                              .ok_or(RuntimeError::NullValue { line })?;
            let Some(next) = bounds.advance(current) else {
                return Ok(());
            };
            self.store_variable(for_loop.slot, Value::from(next), line)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Bounds;

    #[test]
    fn advance_stops_at_the_bound() {
        let up = Bounds { end:        10,
                          step:       3,
                          descending: false, };
        assert_eq!(up.advance(7), Some(10));
        assert_eq!(up.advance(8), None);

        let down = Bounds { end:        1,
                            step:       1,
                            descending: true, };
        assert_eq!(down.advance(2), Some(1));
        assert_eq!(down.advance(1), None);
    }

    #[test]
    fn advance_does_not_overflow() {
        let up = Bounds { end:        i64::MAX,
                          step:       2,
                          descending: false, };
        assert_eq!(up.advance(i64::MAX - 1), None);
    }
}
