use crate::{
    ast::{Expr, LiteralValue},
    error::RuntimeError,
    interpreter::{
        context::Context,
        plugin::descriptor::MethodDecl,
        value::{complex::Complex, core::Value, types::Type},
    },
    util::stack::guarded,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Converts a literal constant to its runtime value. `null` becomes an
/// untyped null.
///
/// # Example
/// ```
/// use plume::{
///     ast::LiteralValue,
///     interpreter::{evaluator::core::literal_value, value::types::Type},
/// };
///
/// assert_eq!(literal_value(&LiteralValue::Decimal(2.0)).to_string(), "2.0");
/// assert_eq!(literal_value(&LiteralValue::Null).ty(), Type::AUTO);
/// ```
#[must_use]
pub fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Integer(i) => Value::from(*i),
        LiteralValue::Decimal(n) => Value::from(*n),
        LiteralValue::Boolean(b) => Value::from(*b),
        LiteralValue::Literal(s) => Value::from(s.as_str()),
        LiteralValue::Null => Value::null(Type::AUTO),
    }
}

/// Checks evaluated arguments against the declarations of a native
/// constructor or method. Arguments typed `auto` at parse time are only
/// checked here.
pub(crate) fn check_native_args(decl: &MethodDecl,
                                args: &[Value],
                                own: Type,
                                line: usize)
                                -> EvalResult<()> {
    for (arg_decl, value) in decl.args.iter().zip(args) {
        if !arg_decl.admits(value.ty(), own) && !value.is_null() {
            let expected = arg_decl.resolve(own).unwrap_or(Type::AUTO);
            return Err(RuntimeError::TypeMismatch { expected: expected.to_string(),
                                                    found: value.ty().to_string(),
                                                    line });
        }
    }
    Ok(())
}

fn callee_name(expr: &Expr) -> String {
    match expr {
        Expr::Call { functor, .. } => functor.name().to_string(),
        Expr::Method { method, .. } => method.name().to_string(),
        Expr::Group { inner, .. } => callee_name(inner),
        _ => "expression".to_string(),
    }
}

impl Context {
    /// Evaluates an expression that must produce a value.
    ///
    /// # Parameters
    /// - `expr`: Expression to evaluate.
    ///
    /// # Returns
    /// The resulting rvalue.
    ///
    /// # Errors
    /// Any runtime error of the expression, and `NoReturnValue` when a
    /// procedure or a native method without result is used as a value.
    ///
    /// # Example
    /// ```
    /// use plume::{
    ///     ast::{BinaryOperator, Expr, LiteralValue},
    ///     interpreter::{context::Context, lexer::Position, value::types::Type},
    /// };
    ///
    /// let pos = Position::new(1, 1);
    /// let literal = |i| Box::new(Expr::Literal { value: LiteralValue::Integer(i),
    ///                                            pos });
    /// let sum = Expr::Binary { op: BinaryOperator::Add,
    ///                          left: literal(2),
    ///                          right: literal(3),
    ///                          ty: Type::INTEGER,
    ///                          pos };
    ///
    /// let mut ctx = Context::default();
    /// assert_eq!(ctx.evaluate(&sum).unwrap().to_string(), "5");
    /// ```
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.evaluate_optional(expr)?
            .ok_or_else(|| RuntimeError::NoReturnValue { name: callee_name(expr),
                                                         line: expr.line() })
    }

    /// Evaluates an expression that may legitimately produce nothing: a
    /// procedure call or a native method without result.
    ///
    /// The evaluator dispatches on the expression variant: literals,
    /// variables, unary and binary operations, builtin calls, object
    /// construction, user calls, method calls and `@` indexing.
    pub fn evaluate_optional(&mut self, expr: &Expr) -> EvalResult<Option<Value>> {
        guarded(|| self.eval_node(expr))
    }

    fn eval_node(&mut self, expr: &Expr) -> EvalResult<Option<Value>> {
        let value = match expr {
            Expr::Literal { value, .. } => literal_value(value),
            Expr::Variable { slot, pos, .. } => self.load(*slot, pos.line)?,
            Expr::Unary { op, operand, pos, .. } => self.eval_unary(*op, operand, pos.line)?,
            Expr::Binary { op,
                           left,
                           right,
                           pos,
                           .. } => self.eval_binary(*op, left, right, pos.line)?,
            Expr::Group { inner, .. } => return self.evaluate_optional(inner),
            Expr::Builtin { func, args, pos, .. } => self.call_builtin(*func, args, pos.line)?,
            Expr::Construct { type_id,
                              ctor,
                              args,
                              pos,
                              .. } => self.construct(*type_id, *ctor, args, pos.line)?,
            Expr::Call { functor, args, pos, .. } => {
                let values = self.evaluate_args(args)?;
                return self.call_function(functor, values, pos.line);
            },
            Expr::Method { receiver,
                           method,
                           args,
                           pos,
                           .. } => return self.eval_method(receiver, method, args, pos.line),
            Expr::Index { base, index, pos, .. } => self.eval_index(base, index, pos.line)?,
        };
        Ok(Some(value))
    }

    /// Evaluates arguments left to right.
    pub fn evaluate_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    /// Creates a native object with the selected constructor of an imported
    /// type.
    ///
    /// # Errors
    /// - `PluginFailure` if the type is no longer loaded or the module
    ///   refuses to create the object.
    /// - `TypeMismatch` for an argument that does not fit its declaration.
    fn construct(&mut self, type_id: u64, ctor: u32, args: &[Expr], line: usize) -> EvalResult<Value> {
        let module = self.plugins()
                         .borrow()
                         .by_id(type_id)
                         .map(|loaded| loaded.module.clone())
                         .ok_or_else(|| RuntimeError::PluginFailure { details: format!("object type #{type_id} is not loaded"),
                                                                      line })?;
        let values = self.evaluate_args(args)?;

        let own = Type::object(type_id);
        if let Some(decl) = module.descriptor().ctors.iter().find(|c| c.id == ctor) {
            check_native_args(decl, &values, own, line)?;
        }

        let handle = module.create_object(ctor, &values)
                           .map_err(|details| RuntimeError::PluginFailure { details, line })?;
        tracing::trace!(type_id, handle, "native object created");
        Ok(Value::from(Complex::new(module, type_id, handle)))
    }
}

