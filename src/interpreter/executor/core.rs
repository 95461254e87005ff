use crate::{
    ast::{Branch, Expr, Statement},
    error::{Error, RuntimeError},
    interpreter::{
        context::{Context, ScopeKind},
        evaluator::core::EvalResult,
        parser::{
            core::{ParseResult, Parser},
            statement::parse_statement,
        },
        tokenizer::TokenStream,
        value::{core::Value, types::Type},
    },
    util::stack::guarded,
};

/// Parses one top-level statement as a transaction over the symbol table
/// and the function declarations.
///
/// Registrations, type upgrades and function declarations made by a failed
/// attempt are rolled back; a successful attempt commits them.
///
/// # Errors
/// The `ParseError` of the statement.
pub fn parse_top_level(ctx: &mut Context, tokens: &mut TokenStream) -> ParseResult<Statement> {
    let functors = ctx.functors();
    ctx.symbols.begin_attempt();
    functors.begin_attempt();
    let parsed = parse_statement(&mut Parser::new(tokens, ctx));
    match &parsed {
        Ok(_) => {
            ctx.symbols.commit();
            functors.commit();
        },
        Err(e) => {
            tracing::debug!(error = %e, "statement rolled back");
            ctx.symbols.rollback();
            functors.rollback();
        },
    }
    parsed
}

/// A fully parsed program.
///
/// # Example
/// ```
/// use plume::interpreter::{context::Context, executor::core::Executable};
///
/// let mut ctx = Context::default();
/// let program = Executable::from_source(&mut ctx, "let x = 1; x = x + 1;").unwrap();
/// assert_eq!(program.unparse(), "let x = 1;\nx = x + 1;\n");
/// program.run(&mut ctx).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Executable {
    statements: Vec<Statement>,
}

impl Executable {
    /// Parses every statement of `tokens`.
    ///
    /// # Errors
    /// The first `ParseError`.
    pub fn parse(ctx: &mut Context, tokens: &mut TokenStream) -> ParseResult<Self> {
        let mut statements = Vec::new();
        while tokens.peek().is_some() {
            statements.push(parse_top_level(ctx, tokens)?);
        }
        Ok(Self { statements })
    }

    /// Parses a program held in a string.
    ///
    /// # Errors
    /// The first `ParseError`.
    pub fn from_source(ctx: &mut Context, source: &str) -> ParseResult<Self> {
        Self::parse(ctx, &mut TokenStream::from_source(source))
    }

    /// The parsed statements.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Runs the statements in order. A top-level `return` ends the run.
    ///
    /// # Errors
    /// The first runtime error that no handler caught.
    pub fn run(&self, ctx: &mut Context) -> EvalResult<()> {
        for statement in &self.statements {
            ctx.run_top_level(statement)?;
            if ctx.flags().returning {
                ctx.take_return();
                break;
            }
        }
        Ok(())
    }

    /// The program as re-parseable source text.
    #[must_use]
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            if statement.write_source(&mut out, 0).is_err() {
                break;
            }
        }
        out
    }
}

/// Statement-at-a-time execution of a token stream.
///
/// Each statement is parsed and run before the next one is read. After a
/// parse error the stream skips to the next `;`.
pub struct Session {
    tokens:     TokenStream,
    keep_going: bool,
    failures:   usize,
}

impl Session {
    /// Creates a session. With `keep_going` errors are reported to the
    /// diagnostics sink and execution continues with the next statement.
    #[must_use]
    pub const fn new(tokens: TokenStream, keep_going: bool) -> Self {
        Self { tokens,
               keep_going,
               failures: 0 }
    }

    /// Number of statements that failed so far.
    #[must_use]
    pub const fn failures(&self) -> usize {
        self.failures
    }

    /// Parses and runs the next statement.
    ///
    /// # Returns
    /// `None` at the end of input.
    pub fn step(&mut self, ctx: &mut Context) -> Option<Result<(), Error>> {
        self.tokens.peek()?;
        let statement = match parse_top_level(ctx, &mut self.tokens) {
            Ok(statement) => statement,
            Err(e) => {
                self.tokens.recover();
                return Some(Err(e.into()));
            },
        };
        Some(ctx.run_top_level(&statement).map_err(Error::from))
    }

    /// Runs statements until the input ends or a top-level `return`.
    ///
    /// # Errors
    /// The first error, unless the session keeps going; diagnostics sink
    /// failures are always returned.
    pub fn run(&mut self, ctx: &mut Context) -> Result<(), Error> {
        while let Some(result) = self.step(ctx) {
            if let Err(e) = result {
                if !self.keep_going {
                    return Err(e);
                }
                self.failures += 1;
                tracing::debug!(error = %e, "continuing after error");
                ctx.shared().write_diagnostic(&e.to_string(), 0)?;
            }
            if ctx.flags().returning {
                ctx.take_return();
                break;
            }
        }
        Ok(())
    }
}

impl Context {
    /// Runs a top-level statement and frees its temporaries.
    ///
    /// # Errors
    /// The runtime error that escaped the statement.
    pub fn run_top_level(&mut self, statement: &Statement) -> EvalResult<()> {
        self.sync_storage();
        let result = self.execute(statement);
        self.purge_temporaries();
        if result.is_err() {
            self.take_break();
            self.take_continue();
        }
        result
    }

    /// Executes one statement, writing a trace line first when tracing is
    /// on.
    pub fn execute(&mut self, statement: &Statement) -> EvalResult<()> {
        if self.is_tracing() {
            let line = statement.line();
            let indent = "  ".repeat(self.exec_depth());
            self.shared()
                .write_diagnostic(&format!("{indent}[{line}] {}", statement.summary()), line)?;
        }
        guarded(|| self.doit(statement))
    }

    /// Runs a statement list until its end or until a condition flag is
    /// raised. The flag stays raised for the construct that owns it.
    pub fn run_block(&mut self, body: &[Statement]) -> EvalResult<()> {
        self.enter_block();
        let result = self.run_statements(body);
        self.leave_block();
        result
    }

    fn run_statements(&mut self, body: &[Statement]) -> EvalResult<()> {
        for statement in body {
            self.execute(statement)?;
            if self.flags().any() {
                break;
            }
        }
        Ok(())
    }

    fn doit(&mut self, statement: &Statement) -> EvalResult<()> {
        let line = statement.line();
        match statement {
            Statement::Nop { .. } | Statement::Import { .. } | Statement::Function(_) => Ok(()),
            Statement::Trace { on, .. } => {
                self.set_trace(*on);
                Ok(())
            },
            Statement::Let { slot,
                             declared,
                             value,
                             .. } => {
                let declared = declared.as_ref().map_or(Type::AUTO, |spec| spec.ty);
                let value = match value {
                    Some(expr) => self.evaluate(expr)?.widen_to(declared, line)?,
                    None => Value::null(declared),
                };
                self.store_variable(*slot, value, line)
            },
            Statement::If { branches, otherwise, .. } => self.run_if(branches, otherwise.as_deref(), line),
            Statement::While { condition, body, .. } => {
                let scope = self.push_scope(ScopeKind::Loop);
                let result = self.run_while(condition, body, line);
                self.pop_scope(scope);
                result
            },
            Statement::For(for_loop) => self.run_for(for_loop),
            Statement::Forall { slot, source, body, .. } => self.run_forall(*slot, *source, body, line),
            Statement::Break { .. } => {
                if self.in_loop() {
                    self.raise_break();
                }
                Ok(())
            },
            Statement::Continue { .. } => {
                if self.in_loop() {
                    self.raise_continue();
                }
                Ok(())
            },
            Statement::Return { value, .. } => {
                let value = value.as_ref().map(|expr| self.evaluate(expr)).transpose()?;
                self.raise_return(value);
                Ok(())
            },
            Statement::Block { body, handlers, .. } => self.run_protected(body, handlers),
            Statement::Print { args, newline, .. } => {
                let mut text = String::new();
                for arg in args {
                    text.push_str(&self.evaluate(arg)?.to_string());
                }
                if *newline {
                    text.push('\n');
                }
                self.shared().write_output(&text, line)
            },
            Statement::Raise { name, .. } => Err(RuntimeError::UserException { name: name.to_lowercase(),
                                                                               line }),
            Statement::Include { body, .. } => self.run_block(body),
            Statement::Expression { expr, .. } => {
                if let Some(value) = self.evaluate_optional(expr)? {
                    self.hold_temporary(value);
                }
                Ok(())
            },
        }
    }

    fn condition(&mut self, expr: &Expr, line: usize) -> EvalResult<bool> {
        self.evaluate(expr)?
            .boolean(line)?
            .ok_or(RuntimeError::NullValue { line })
    }

    fn run_if(&mut self, branches: &[Branch], otherwise: Option<&[Statement]>, line: usize) -> EvalResult<()> {
        for branch in branches {
            if self.condition(&branch.condition, line)? {
                return self.run_block(&branch.body);
            }
        }
        otherwise.map_or(Ok(()), |body| self.run_block(body))
    }

    fn run_while(&mut self, condition: &Expr, body: &[Statement], line: usize) -> EvalResult<()> {
        while self.condition(condition, line)? {
            self.run_block(body)?;
            if self.take_break() || self.flags().returning {
                break;
            }
            self.take_continue();
        }
        Ok(())
    }
}
