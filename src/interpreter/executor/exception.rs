use crate::{
    ast::{Handler, Statement},
    interpreter::{
        context::{Context, ScopeKind},
        evaluator::core::EvalResult,
    },
};

/// The first handler for the error `name`; `others` matches every name.
fn find_handler<'a>(handlers: &'a [Handler], name: &str) -> Option<&'a Handler> {
    handlers.iter()
            .find(|h| h.name.as_deref().is_none_or(|n| n == name))
}

impl Context {
    /// Runs a `begin ... exception ... end` block.
    ///
    /// A runtime error of the body is matched against the handlers in
    /// order. The matching handler runs with the error visible to
    /// `error()`. Errors without a name (internal errors) and errors no
    /// handler names are rethrown.
    pub(crate) fn run_protected(&mut self, body: &[Statement], handlers: &[Handler]) -> EvalResult<()> {
        let scope = self.push_scope(ScopeKind::Exception);
        let outcome = self.run_block(body);
        self.pop_scope(scope);

        let Err(error) = outcome else {
            return Ok(());
        };
        let Some(handler) = error.name().and_then(|name| find_handler(handlers, name)) else {
            return Err(error);
        };

        tracing::debug!(error = %error, "exception handled");
        self.push_caught(error);
        let handled = self.run_block(&handler.body);
        self.pop_caught();
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(name: Option<&str>) -> Handler {
        Handler { name: name.map(str::to_string),
                  body: Vec::new() }
    }

    #[test]
    fn first_matching_handler_wins() {
        let handlers = vec![handler(Some("overflow")), handler(None), handler(Some("oops"))];
        assert_eq!(find_handler(&handlers, "overflow").and_then(|h| h.name.as_deref()),
                   Some("overflow"));
        assert!(find_handler(&handlers, "oops").is_some_and(|h| h.name.is_none()));
    }

    #[test]
    fn specific_handlers_skip_other_names() {
        let handlers = vec![handler(Some("overflow"))];
        assert!(find_handler(&handlers, "divide_by_zero").is_none());
    }
}
