use std::{
    cell::{Cell, OnceCell, RefCell},
    collections::HashMap,
    io::{self, BufRead, Write},
    rc::Rc,
};

use crate::{
    error::RuntimeError,
    interpreter::{
        context::functor::FunctorManager,
        evaluator::core::EvalResult,
        plugin::registry::PluginRegistry,
        value::types::Type,
    },
    options::Options,
};

/// The byte sinks and source a context talks to.
pub struct Io {
    /// Receives `print` and `put`.
    pub output:      Box<dyn Write>,
    /// Receives `trace on` lines.
    pub diagnostics: Box<dyn Write>,
    /// Feeds `readln()`.
    pub input:       Box<dyn BufRead>,
}

impl Io {
    /// Standard output, standard error and standard input.
    #[must_use]
    pub fn stdio() -> Self {
        Self { output:      Box::new(io::stdout()),
               diagnostics: Box::new(io::stderr()),
               input:       Box::new(io::BufReader::new(io::stdin())), }
    }
}

/// State shared by a root context and every context derived from it.
///
/// Function environments share the functor manager (created on first use),
/// the plugin and row registries, the call depth and the I/O sinks with the
/// root, but never its variables.
pub struct Shared {
    options:     Options,
    functors:    OnceCell<Rc<FunctorManager>>,
    plugins:     Rc<RefCell<PluginRegistry>>,
    rows:        RefCell<HashMap<u64, Vec<Type>>>,
    depth:       Cell<usize>,
    output:      RefCell<Box<dyn Write>>,
    diagnostics: RefCell<Box<dyn Write>>,
    input:       RefCell<Box<dyn BufRead>>,
}

fn io_failure(e: &io::Error, line: usize) -> RuntimeError {
    RuntimeError::Internal { details: format!("I/O failure: {e}"),
                             line }
}

impl Shared {
    /// Bundles the shared state of a new root context.
    #[must_use]
    pub fn new(options: Options, plugins: Rc<RefCell<PluginRegistry>>, io: Io) -> Self {
        Self { options,
               functors: OnceCell::new(),
               plugins,
               rows: RefCell::new(HashMap::new()),
               depth: Cell::new(0),
               output: RefCell::new(io.output),
               diagnostics: RefCell::new(io.diagnostics),
               input: RefCell::new(io.input) }
    }

    /// The interpreter configuration.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// The functor manager, created on first use.
    pub fn functors(&self) -> Rc<FunctorManager> {
        Rc::clone(self.functors.get_or_init(|| {
                                   tracing::debug!("creating functor manager");
                                   Rc::new(FunctorManager::new())
                               }))
    }

    /// Drops every declared function and its pooled environments.
    pub fn purge_functors(&self) {
        if let Some(functors) = self.functors.get() {
            functors.purge();
        }
    }

    /// The plugin registry handle.
    #[must_use]
    pub fn plugins(&self) -> Rc<RefCell<PluginRegistry>> {
        Rc::clone(&self.plugins)
    }

    /// Records the field types of a row shape and returns its type.
    pub fn register_row(&self, fields: &[Type]) -> Type {
        let ty = Type::row(fields);
        self.rows.borrow_mut().entry(ty.minor).or_insert_with(|| fields.to_vec());
        ty
    }

    /// The field types of a registered row shape.
    #[must_use]
    pub fn row_fields(&self, minor: u64) -> Option<Vec<Type>> {
        self.rows.borrow().get(&minor).cloned()
    }

    /// Enters a user function call.
    ///
    /// # Errors
    /// `RecursionLimit` when the call would exceed the configured depth.
    pub fn enter_call(&self, line: usize) -> EvalResult<()> {
        let depth = self.depth.get();
        let limit = self.options.recursion_limit;
        if depth >= limit {
            tracing::warn!(limit, line, "recursion limit reached");
            return Err(RuntimeError::RecursionLimit { limit, line });
        }
        self.depth.set(depth + 1);
        Ok(())
    }

    /// Leaves a user function call.
    pub fn leave_call(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    /// The current call depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Writes to the output sink.
    ///
    /// # Errors
    /// `Internal` if the sink fails.
    pub fn write_output(&self, text: &str, line: usize) -> EvalResult<()> {
        let mut output = self.output.borrow_mut();
        output.write_all(text.as_bytes())
              .and_then(|()| output.flush())
              .map_err(|e| io_failure(&e, line))
    }

    /// Writes one line to the diagnostics sink.
    ///
    /// # Errors
    /// `Internal` if the sink fails.
    pub fn write_diagnostic(&self, text: &str, line: usize) -> EvalResult<()> {
        writeln!(self.diagnostics.borrow_mut(), "{text}").map_err(|e| io_failure(&e, line))
    }

    /// Reads one line from the input, without its line terminator. `None` at
    /// end of input.
    ///
    /// # Errors
    /// `Internal` if reading fails.
    pub fn read_line(&self, line: usize) -> EvalResult<Option<String>> {
        let mut text = String::new();
        let read = self.input
                       .borrow_mut()
                       .read_line(&mut text)
                       .map_err(|e| io_failure(&e, line))?;
        if read == 0 {
            return Ok(None);
        }
        while text.ends_with(['\n', '\r']) {
            text.pop();
        }
        Ok(Some(text))
    }
}
