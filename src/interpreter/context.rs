/// User functions and their pooled call environments.
pub mod functor;
/// State shared between a root context and its function environments.
pub mod shared;
/// Variable storage, places and alias resolution.
pub mod storage;
/// The transactional name to slot registry used by the parser.
pub mod symbol;

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::RuntimeError,
    interpreter::{
        context::{
            functor::FunctorManager,
            shared::{Io, Shared},
            storage::Storage,
            symbol::SymbolTable,
        },
        evaluator::core::EvalResult,
        lexer::Position,
        parser::core::ParseResult,
        plugin::registry::PluginRegistry,
        value::{
            core::Value,
            types::{Major, Type},
        },
    },
    options::Options,
};

/// The kind of an active control scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// A `while`, `for` or `forall` loop.
    Loop,
    /// A `begin ... exception ... end` block.
    Exception,
}

/// An entry of the control stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    /// Unique within the owning context.
    pub id:   usize,
    /// What opened the scope.
    pub kind: ScopeKind,
}

/// The condition flags raised by `break`, `continue` and `return`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Raised by `break`.
    pub breaking:   bool,
    /// Raised by `continue`.
    pub continuing: bool,
    /// Raised by `return`.
    pub returning:  bool,
}

impl Flags {
    /// `true` if any flag is raised.
    #[must_use]
    pub const fn any(self) -> bool {
        self.breaking || self.continuing || self.returning
    }
}

/// The runtime context of a script or of one user function call.
///
/// A root context is created by the host with [`Context::new`]; function
/// environments are built from a function's private symbol table and share
/// the root's [`Shared`] state. Dropping the root purges it, which releases
/// every function body and pooled environment.
pub struct Context {
    shared:       Rc<Shared>,
    root:         bool,
    /// Names known to the parser.
    pub symbols:  SymbolTable,
    /// Variable storage.
    pub storage:  Storage,
    control:      Vec<Scope>,
    next_scope:   usize,
    exec_depth:   usize,
    temporaries:  Vec<Value>,
    flags:        Flags,
    return_value: Option<Value>,
    caught:       Vec<RuntimeError>,
    trace:        bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Options::default(),
                  Rc::new(RefCell::new(PluginRegistry::new())),
                  Io::stdio())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.root {
            self.purge();
        }
    }
}

impl Context {
    /// Creates a root context.
    ///
    /// # Parameters
    /// - `options`: include and recursion configuration.
    /// - `plugins`: the registry `import` loads native modules from.
    /// - `io`: output, diagnostics and input streams.
    #[must_use]
    pub fn new(options: Options, plugins: Rc<RefCell<PluginRegistry>>, io: Io) -> Self {
        Self::with_shared(Rc::new(Shared::new(options, plugins, io)), SymbolTable::new(), true)
    }

    fn with_shared(shared: Rc<Shared>, symbols: SymbolTable, root: bool) -> Self {
        let storage = Storage::from_symbols(&symbols);
        Self { shared,
               root,
               symbols,
               storage,
               control: Vec::new(),
               next_scope: 0,
               exec_depth: 0,
               temporaries: Vec::new(),
               flags: Flags::default(),
               return_value: None,
               caught: Vec::new(),
               trace: false }
    }

    /// A context with no variables that shares this context's functions,
    /// plugins and sinks. Function bodies are parsed in one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::with_shared(Rc::clone(&self.shared), SymbolTable::new(), false)
    }

    /// A call environment with one typed null per symbol of `symbols`.
    #[must_use]
    pub fn environment(shared: &Rc<Shared>, symbols: SymbolTable) -> Self {
        Self::with_shared(Rc::clone(shared), symbols, false)
    }

    /// Returns a used call environment to its pristine state.
    pub fn reset_environment(&mut self) {
        self.storage.reset(&self.symbols);
        self.control.clear();
        self.exec_depth = 0;
        self.temporaries.clear();
        self.flags = Flags::default();
        self.return_value = None;
        self.caught.clear();
        self.trace = false;
    }

    /// The shared state.
    #[must_use]
    pub const fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }

    /// The interpreter configuration.
    #[must_use]
    pub fn options(&self) -> &Options {
        self.shared.options()
    }

    /// The functor manager, created on first use.
    #[must_use]
    pub fn functors(&self) -> Rc<FunctorManager> {
        self.shared.functors()
    }

    /// The plugin registry handle.
    #[must_use]
    pub fn plugins(&self) -> Rc<RefCell<PluginRegistry>> {
        self.shared.plugins()
    }

    /// Registers a symbol; see [`SymbolTable::register`].
    pub fn register_symbol(&mut self, name: &str, ty: Type, pos: Position) -> ParseResult<usize> {
        self.symbols.register(name, ty, pos)
    }

    /// Allocates storage for symbols registered since the last call.
    pub fn sync_storage(&mut self) {
        self.storage.sync(&self.symbols);
    }

    /// Stores into a variable; see [`Storage::store`].
    pub fn store_variable(&mut self, slot: usize, value: Value, line: usize) -> EvalResult<()> {
        self.sync_storage();
        self.storage.store(slot, value, line)
    }

    /// Reads a variable through aliases as an rvalue copy.
    pub fn load(&mut self, slot: usize, line: usize) -> EvalResult<Value> {
        self.sync_storage();
        self.storage.load(slot, line)
    }

    /// Opens a control scope and returns its id.
    pub fn push_scope(&mut self, kind: ScopeKind) -> usize {
        let id = self.next_scope;
        self.next_scope += 1;
        self.control.push(Scope { id, kind });
        id
    }

    /// Closes the scope `id` and any scope opened after it.
    pub fn pop_scope(&mut self, id: usize) {
        if let Some(index) = self.control.iter().rposition(|s| s.id == id) {
            self.control.truncate(index);
        }
    }

    /// `true` if a loop is active in this context.
    #[must_use]
    pub fn in_loop(&self) -> bool {
        self.control.iter().any(|s| s.kind == ScopeKind::Loop)
    }

    /// Depth of the control stack.
    #[must_use]
    pub fn control_depth(&self) -> usize {
        self.control.len()
    }

    /// Enters a nested statement list.
    pub const fn enter_block(&mut self) {
        self.exec_depth += 1;
    }

    /// Leaves a nested statement list.
    pub const fn leave_block(&mut self) {
        self.exec_depth = self.exec_depth.saturating_sub(1);
    }

    /// Current block nesting.
    #[must_use]
    pub const fn exec_depth(&self) -> usize {
        self.exec_depth
    }

    /// Keeps a discarded statement result alive until the end of the
    /// top-level statement.
    pub fn hold_temporary(&mut self, value: Value) {
        self.temporaries.push(value);
    }

    /// Frees the temporaries of the finished top-level statement.
    pub fn purge_temporaries(&mut self) {
        self.temporaries.clear();
    }

    /// Number of held temporaries.
    #[must_use]
    pub fn temporaries(&self) -> usize {
        self.temporaries.len()
    }

    /// The raised condition flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Raises the break flag.
    pub const fn raise_break(&mut self) {
        self.flags.breaking = true;
    }

    /// Raises the continue flag.
    pub const fn raise_continue(&mut self) {
        self.flags.continuing = true;
    }

    /// Raises the return flag with an optional result.
    pub fn raise_return(&mut self, value: Option<Value>) {
        self.flags.returning = true;
        self.return_value = value;
    }

    /// Clears the break flag, returning whether it was raised.
    pub const fn take_break(&mut self) -> bool {
        std::mem::replace(&mut self.flags.breaking, false)
    }

    /// Clears the continue flag, returning whether it was raised.
    pub const fn take_continue(&mut self) -> bool {
        std::mem::replace(&mut self.flags.continuing, false)
    }

    /// Clears the return flag and hands out the pending result.
    pub fn take_return(&mut self) -> Option<Value> {
        self.flags.returning = false;
        self.return_value.take()
    }

    /// Makes `error` visible to `error()` while its handler runs.
    pub fn push_caught(&mut self, error: RuntimeError) {
        self.caught.push(error);
    }

    /// Ends the handler of the innermost caught error.
    pub fn pop_caught(&mut self) {
        self.caught.pop();
    }

    /// The innermost error being handled.
    #[must_use]
    pub fn current_error(&self) -> Option<&RuntimeError> {
        self.caught.last()
    }

    /// Turns statement tracing on or off.
    pub const fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// `true` while statement tracing is on.
    #[must_use]
    pub const fn is_tracing(&self) -> bool {
        self.trace
    }

    /// The source spelling of a type, resolving row shapes and imported
    /// object types through the shared registries.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::{context::Context, value::types::Type};
    ///
    /// let ctx = Context::default();
    /// let row = ctx.shared().register_row(&[Type::INTEGER, Type::LITERAL]);
    /// assert_eq!(ctx.type_name(row.array_of()), "row(integer, string)[]");
    /// assert_eq!(ctx.type_name(Type::NUMERIC), "decimal");
    /// ```
    #[must_use]
    pub fn type_name(&self, ty: Type) -> String {
        let base = match ty.major {
            Major::RowType => match self.shared.row_fields(ty.minor) {
                Some(fields) => {
                    let names: Vec<String> = fields.iter().map(|f| self.type_name(*f)).collect();
                    format!("row({})", names.join(", "))
                },
                None => "row".to_string(),
            },
            Major::Complex => self.plugins()
                                  .borrow()
                                  .by_id(ty.minor)
                                  .map_or_else(|| "object".to_string(), |l| l.name.clone()),
            major => Type::scalar(major).to_string(),
        };
        base + &"[]".repeat(ty.level as usize)
    }

    /// Drops storage, temporaries, declared functions and their pooled
    /// environments.
    pub fn purge(&mut self) {
        tracing::debug!(slots = self.storage.len(), "purging context");
        self.temporaries.clear();
        self.storage.clear();
        self.symbols.clear();
        self.control.clear();
        self.caught.clear();
        self.return_value = None;
        self.flags = Flags::default();
        self.shared.purge_functors();
    }
}
