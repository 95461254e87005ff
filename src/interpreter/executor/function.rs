use std::rc::Rc;

use crate::{
    ast::Statement,
    error::RuntimeError,
    interpreter::{
        context::{Context, functor::Functor},
        evaluator::core::EvalResult,
        value::core::Value,
    },
    util::stack::guarded,
};

impl Context {
    /// Calls a user function.
    ///
    /// The call takes a pooled environment from the functor, binds the
    /// arguments to the parameter slots in order and runs the body until
    /// `return` or its end. The environment goes back to the pool and the
    /// call depth is restored on every path.
    ///
    /// # Parameters
    /// - `functor`: The called function.
    /// - `args`: Evaluated arguments, one per parameter.
    /// - `line`: Line of the call.
    ///
    /// # Returns
    /// The returned value, or `None` for a procedure or a function that
    /// ended without `return`.
    ///
    /// # Errors
    /// - `RecursionLimit` when the call would exceed the configured depth.
    /// - Any runtime error of the body that it did not handle.
    pub fn call_function(&mut self,
                         functor: &Rc<Functor>,
                         args: Vec<Value>,
                         line: usize)
                         -> EvalResult<Option<Value>> {
        let body = functor.body().ok_or_else(|| {
                                     RuntimeError::Internal { details: format!("function '{}' has no body", functor.name()),
                                                              line }
                                 })?;
        self.shared().enter_call(line)?;

        let mut env = functor.acquire(self.shared());
        env.set_trace(self.is_tracing());
        let result = guarded(|| invoke(&mut env, functor, args, &body, line));
        functor.release(env);

        self.shared().leave_call();
        result
    }
}

fn invoke(env: &mut Context,
          functor: &Functor,
          args: Vec<Value>,
          body: &[Statement],
          line: usize)
          -> EvalResult<Option<Value>> {
    for (param, value) in functor.params().iter().zip(args) {
        env.store_variable(param.slot, value.widen_to(param.ty, line)?, line)?;
    }
    env.run_block(body)?;

    let returned = env.take_return();
    match (returned, functor.ret()) {
        (Some(value), Some(ty)) => value.widen_to(ty, line).map(Some),
        (returned, _) => Ok(returned),
    }
}
