use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{
        context::Context,
        evaluator::{core::EvalResult, function::builtin},
        lexer::Position,
        parser::{
            core::ParseResult,
            types::unify,
        },
        value::{
            core::Value,
            types::{Major, Type},
        },
    },
};

/// Type alias for builtin function handlers.
///
/// A builtin receives the context, its evaluated arguments and the line
/// number, and returns a value.
type BuiltinFn = fn(&mut Context, Vec<Value>, usize) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a builtin.
///
/// - `Exact(n)` means the builtin must receive exactly `n` arguments.
/// - `AtLeast(n)` means the builtin accepts `n` or more arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// This many arguments or more.
    AtLeast(usize),
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    #[must_use]
    pub const fn admits(self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == m,
            Self::AtLeast(m) => n >= m,
        }
    }

    /// The smallest admitted argument count.
    #[must_use]
    pub const fn minimum(self) -> usize {
        match self {
            Self::Exact(m) | Self::AtLeast(m) => m,
        }
    }
}

/// Defines builtin functions by generating the `Builtin` enum and a name
/// list.
///
/// Each entry provides:
/// - the enum variant,
/// - a string name,
/// - an arity specification,
/// - a function pointer implementing the builtin.
///
/// The macro produces:
/// - `Builtin` with `from_name`, `name`, `arity` and the dispatch to its
///   implementation,
/// - `BUILTIN_FUNCTIONS` (public list of builtin names).
macro_rules! builtin_functions {
    (
        $(
            $variant:ident => {
                name: $name:literal,
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        /// A builtin function. Builtin names are reserved.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Builtin {
            $(
                #[doc = concat!("`", $name, "(...)`")]
                $variant,
            )*
        }

        impl Builtin {
            /// Finds the builtin called `name`.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// The name scripts call the builtin by.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            /// The accepted number of arguments.
            #[must_use]
            pub const fn arity(self) -> Arity {
                match self {
                    $( Self::$variant => $arity, )*
                }
            }

            fn func(self) -> BuiltinFn {
                match self {
                    $( Self::$variant => $func, )*
                }
            }
        }

        /// The names of all builtin functions.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    Tab     => { name: "tab",     arity: Arity::AtLeast(0), func: builtin::tab },
    Tup     => { name: "tup",     arity: Arity::AtLeast(1), func: builtin::tup },
    Imag    => { name: "imag",    arity: Arity::Exact(2),   func: builtin::imag },
    Bytes   => { name: "bytes",   arity: Arity::Exact(1),   func: builtin::to_bytes },
    Str     => { name: "str",     arity: Arity::Exact(1),   func: builtin::to_str },
    Int     => { name: "int",     arity: Arity::Exact(1),   func: builtin::to_int },
    Num     => { name: "num",     arity: Arity::Exact(1),   func: builtin::to_num },
    Abs     => { name: "abs",     arity: Arity::Exact(1),   func: builtin::abs },
    Sqrt    => { name: "sqrt",    arity: Arity::Exact(1),   func: builtin::sqrt },
    Random  => { name: "random",  arity: Arity::Exact(0),   func: builtin::random },
    IsNull  => { name: "isnull",  arity: Arity::Exact(1),   func: builtin::isnull },
    TypeOf  => { name: "typeof",  arity: Arity::Exact(1),   func: builtin::type_of },
    Error   => { name: "error",   arity: Arity::Exact(0),   func: builtin::error },
    Readln  => { name: "readln",  arity: Arity::Exact(0),   func: builtin::readln },
    Assert  => { name: "assert",  arity: Arity::Exact(1),   func: builtin::assert_fn },
}

impl Builtin {
    /// Computes the static result type of a call and checks its argument
    /// types.
    ///
    /// # Parameters
    /// - `args`: Static types of the arguments.
    /// - `ctx`: The context the call is parsed in; `tup` registers its row
    ///   shape there.
    /// - `pos`: Position of the call, for errors.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::{
    ///     context::Context,
    ///     evaluator::function::core::Builtin,
    ///     lexer::Position,
    ///     value::types::Type,
    /// };
    ///
    /// let ctx = Context::default();
    /// let pos = Position::new(1, 1);
    /// let tab = Builtin::from_name("tab").unwrap();
    ///
    /// assert_eq!(tab.result_type(&[Type::INTEGER, Type::NUMERIC], &ctx, pos).unwrap(),
    ///            Type::NUMERIC.array_of());
    /// assert!(tab.result_type(&[Type::INTEGER, Type::LITERAL], &ctx, pos).is_err());
    /// ```
    pub fn result_type(self, args: &[Type], ctx: &Context, pos: Position) -> ParseResult<Type> {
        let expect = |ty: Type, allowed: &[Major], expected: &str| -> ParseResult<()> {
            if ty == Type::AUTO || (ty.level == 0 && allowed.contains(&ty.major)) {
                return Ok(());
            }
            Err(ParseError::TypeMismatch { expected: expected.to_string(),
                                           found: ctx.type_name(ty),
                                           pos })
        };
        let numbers = [Major::Integer, Major::Numeric];

        let ty = match self {
            Self::Tab => {
                let mut elem = Type::AUTO;
                for arg in args {
                    elem = unify(elem, *arg, pos)?;
                }
                elem.array_of()
            },
            Self::Tup => ctx.shared().register_row(args),
            Self::Imag => {
                expect(args[0], &numbers, "a number")?;
                expect(args[1], &numbers, "a number")?;
                Type::IMAGINARY
            },
            Self::Bytes => {
                expect(args[0], &[Major::Literal], "string")?;
                Type::TABCHAR
            },
            Self::Str | Self::TypeOf | Self::Error | Self::Readln => Type::LITERAL,
            Self::Int => {
                expect(args[0], &[Major::Integer, Major::Numeric, Major::Literal, Major::Boolean], "a number, string or boolean")?;
                Type::INTEGER
            },
            Self::Num => {
                expect(args[0], &[Major::Integer, Major::Numeric, Major::Literal, Major::Boolean], "a number, string or boolean")?;
                Type::NUMERIC
            },
            Self::Abs => {
                expect(args[0], &[Major::Integer, Major::Numeric, Major::Imaginary], "a number")?;
                match args[0].major {
                    Major::Integer => Type::INTEGER,
                    Major::NoType => Type::AUTO,
                    _ => Type::NUMERIC,
                }
            },
            Self::Sqrt => {
                expect(args[0], &numbers, "a number")?;
                Type::NUMERIC
            },
            Self::Random => Type::NUMERIC,
            Self::IsNull => Type::BOOLEAN,
            Self::Assert => {
                expect(args[0], &[Major::Boolean], "boolean")?;
                Type::BOOLEAN
            },
        };
        Ok(ty)
    }
}

impl Context {
    /// Evaluates the arguments of a builtin and runs it.
    ///
    /// # Parameters
    /// - `func`: The builtin.
    /// - `args`: Argument expressions, evaluated left to right.
    /// - `line`: Line number for error reporting.
    pub(crate) fn call_builtin(&mut self, func: Builtin, args: &[Expr], line: usize) -> EvalResult<Value> {
        let values = self.evaluate_args(args)?;
        (func.func())(self, values, line)
    }
}
