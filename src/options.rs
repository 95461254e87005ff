use std::{
    fs::File,
    io::{self, Read},
    path::PathBuf,
    rc::Rc,
};

/// Default ceiling on nested user function calls.
pub const DEFAULT_RECURSION_LIMIT: usize = 256;
/// Default ceiling on nested `include` directives.
pub const DEFAULT_INCLUDE_DEPTH: usize = 8;

/// Opens the sources named by `include` directives.
///
/// The interpreter never touches the file system itself; hosts decide what an
/// include path means.
pub trait IncludeResolver {
    /// Opens the source named `path`.
    ///
    /// # Errors
    /// Any I/O error; it is reported as an include failure.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>>;
}

/// Resolves include paths relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    /// Creates a resolver rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl IncludeResolver for FileResolver {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        let file = File::open(self.base.join(path))?;
        Ok(Box::new(file))
    }
}

/// Interpreter configuration.
///
/// # Example
/// ```
/// use plume::options::{DEFAULT_RECURSION_LIMIT, Options};
///
/// let options = Options::default().with_recursion_limit(64);
/// assert_eq!(options.recursion_limit, 64);
/// assert!(!options.trusted);
/// assert_ne!(options.recursion_limit, DEFAULT_RECURSION_LIMIT);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Allows `include` directives.
    pub trusted:         bool,
    /// Maximum nesting of `include` directives.
    pub include_depth:   usize,
    /// Maximum nesting of user function calls.
    pub recursion_limit: usize,
    /// Opens included sources; `include` fails without one.
    pub resolver:        Option<Rc<dyn IncludeResolver>>,
}

impl Default for Options {
    fn default() -> Self {
        Self { trusted:         false,
               include_depth:   DEFAULT_INCLUDE_DEPTH,
               recursion_limit: DEFAULT_RECURSION_LIMIT,
               resolver:        None, }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
         .field("trusted", &self.trusted)
         .field("include_depth", &self.include_depth)
         .field("recursion_limit", &self.recursion_limit)
         .field("resolver", &self.resolver.is_some())
         .finish()
    }
}

impl Options {
    /// Allows includes, resolved by `resolver`.
    #[must_use]
    pub fn with_includes(mut self, resolver: Rc<dyn IncludeResolver>) -> Self {
        self.trusted = true;
        self.resolver = Some(resolver);
        self
    }

    /// Sets the recursion limit.
    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Sets the include depth limit.
    #[must_use]
    pub fn with_include_depth(mut self, depth: usize) -> Self {
        self.include_depth = depth;
        self
    }
}
