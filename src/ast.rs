use std::rc::Rc;

use crate::interpreter::{
    context::functor::Functor,
    evaluator::function::core::Builtin,
    lexer::Position,
    value::types::Type,
};

/// Writing trees back as source text.
pub mod unparse;

/// Represents a literal value in the language.
///
/// `LiteralValue` covers the constants that can appear directly in source
/// code. `Null` is the untyped `null` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A 64-bit signed integer literal.
    Integer(i64),
    /// A 64-bit floating-point literal.
    Decimal(f64),
    /// A boolean literal value: `true` or `false`.
    Boolean(bool),
    /// A string literal, unescaped.
    Literal(String),
    /// `null`
    Null,
}

impl LiteralValue {
    /// The static type of the literal.
    #[must_use]
    pub const fn ty(&self) -> Type {
        match self {
            Self::Integer(_) => Type::INTEGER,
            Self::Decimal(_) => Type::NUMERIC,
            Self::Boolean(_) => Type::BOOLEAN,
            Self::Literal(_) => Type::LITERAL,
            Self::Null => Type::AUTO,
        }
    }
}

/// A method of a builtin receiver type, or of a native object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `count()` on collections, tuples, strings and bytes.
    Count,
    /// `concat(v)` on collections.
    Concat,
    /// `insert(i, v)` on collections.
    Insert,
    /// `delete(i)` on collections.
    Delete,
    /// `put(i, v)` on collections and tuples.
    Put,
    /// `upper()` on strings.
    Upper,
    /// `lower()` on strings.
    Lower,
    /// `substr(start, len)` on strings.
    Substr,
    /// `find(s)` on strings.
    Find,
    /// `re()` on imaginary numbers.
    Re,
    /// `im()` on imaginary numbers.
    Im,
    /// A method exported by a native module.
    Native {
        /// The method name.
        name:    String,
        /// The id passed back to the module.
        id:      u32,
        /// `false` for methods declared without a result.
        returns: bool,
    },
}

impl Method {
    /// The name scripts call the method by.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Count => "count",
            Self::Concat => "concat",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Put => "put",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Substr => "substr",
            Self::Find => "find",
            Self::Re => "re",
            Self::Im => "im",
            Self::Native { name, .. } => name,
        }
    }

    /// `true` for the methods that change their receiver in place.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::Concat | Self::Insert | Self::Delete | Self::Put)
    }
}

/// An abstract syntax tree (AST) node representing an expression.
///
/// Every node records its source position and, where it can differ from its
/// operands, the static type the parser inferred for it. `auto` means the
/// type is only known at run time.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal constant.
    Literal {
        /// The constant value.
        value: LiteralValue,
        /// Position in the source code.
        pos:   Position,
    },
    /// A variable read.
    Variable {
        /// Lower-case variable name.
        name: String,
        /// Storage slot.
        slot: usize,
        /// Static type at parse time.
        ty:   Type,
        /// Position in the source code.
        pos:  Position,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op:      UnaryOperator,
        /// The operand.
        operand: Box<Self>,
        /// Static result type.
        ty:      Type,
        /// Position in the source code.
        pos:     Position,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op:    BinaryOperator,
        /// Left operand.
        left:  Box<Self>,
        /// Right operand.
        right: Box<Self>,
        /// Static result type.
        ty:    Type,
        /// Position in the source code.
        pos:   Position,
    },
    /// A parenthesized sub-expression.
    Group {
        /// The enclosed expression.
        inner: Box<Self>,
        /// Position in the source code.
        pos:   Position,
    },
    /// A builtin function call such as `tab(1, 2)`.
    Builtin {
        /// The builtin.
        func: Builtin,
        /// Arguments.
        args: Vec<Self>,
        /// Static result type.
        ty:   Type,
        /// Position in the source code.
        pos:  Position,
    },
    /// A native object construction, `counter(5)`.
    Construct {
        /// The imported type name.
        type_name: String,
        /// The imported type id.
        type_id:   u64,
        /// The selected constructor id.
        ctor:      u32,
        /// Arguments.
        args:      Vec<Self>,
        /// Position in the source code.
        pos:       Position,
    },
    /// A user function call.
    Call {
        /// The called function.
        functor: Rc<Functor>,
        /// Arguments.
        args:    Vec<Self>,
        /// Declared result type, `auto` for procedures.
        ty:      Type,
        /// Position in the source code.
        pos:     Position,
    },
    /// A method call, `receiver.method(args)`.
    Method {
        /// The receiver.
        receiver: Box<Self>,
        /// The resolved method.
        method:   Method,
        /// Arguments.
        args:     Vec<Self>,
        /// Static result type.
        ty:       Type,
        /// Position in the source code.
        pos:      Position,
    },
    /// Element access, `base@index`.
    Index {
        /// The indexed value.
        base:  Box<Self>,
        /// The index.
        index: Box<Self>,
        /// Static element type.
        ty:    Type,
        /// Position in the source code.
        pos:   Position,
    },
}

impl Expr {
    /// Gets the source position of `self`.
    /// ## Example
    /// ```
    /// use plume::{
    ///     ast::{Expr, LiteralValue},
    ///     interpreter::lexer::Position,
    /// };
    ///
    /// let expr = Expr::Literal { value: LiteralValue::Integer(1),
    ///                            pos:   Position::new(5, 3), };
    ///
    /// assert_eq!(expr.line(), 5);
    /// ```
    #[must_use]
    pub const fn pos(&self) -> Position {
        match self {
            Self::Literal { pos, .. }
            | Self::Variable { pos, .. }
            | Self::Unary { pos, .. }
            | Self::Binary { pos, .. }
            | Self::Group { pos, .. }
            | Self::Builtin { pos, .. }
            | Self::Construct { pos, .. }
            | Self::Call { pos, .. }
            | Self::Method { pos, .. }
            | Self::Index { pos, .. } => *pos,
        }
    }

    /// Gets the line number from `self`.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos().line
    }

    /// The static result type.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Literal { value, .. } => value.ty(),
            Self::Group { inner, .. } => inner.ty(),
            Self::Construct { type_id, .. } => Type::object(*type_id),
            Self::Variable { ty, .. }
            | Self::Unary { ty, .. }
            | Self::Binary { ty, .. }
            | Self::Builtin { ty, .. }
            | Self::Call { ty, .. }
            | Self::Method { ty, .. }
            | Self::Index { ty, .. } => *ty,
        }
    }

    /// The variable an element or variable expression is rooted at, looking
    /// through `@` and parentheses.
    #[must_use]
    pub fn root_variable(&self) -> Option<&str> {
        match self {
            Self::Variable { name, .. } => Some(name),
            Self::Index { base, .. } => base.root_variable(),
            Self::Group { inner, .. } => inner.root_variable(),
            _ => None,
        }
    }
}

/// A type written in the source, with its spelling for unparsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// The resolved type.
    pub ty:       Type,
    /// The source spelling, normalised to lower case.
    pub spelling: String,
}

/// One `if`/`elsif` arm.
#[derive(Debug, Clone)]
pub struct Branch {
    /// The boolean condition.
    pub condition: Expr,
    /// Statements run when the condition holds.
    pub body:      Vec<Statement>,
}

/// One `when` arm of an exception block.
#[derive(Debug, Clone)]
pub struct Handler {
    /// The caught error name; `None` for `others`.
    pub name: Option<String>,
    /// Statements run for a caught error.
    pub body: Vec<Statement>,
}

/// A function declaration as written.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// The declared function.
    pub functor: Rc<Functor>,
    /// Parameter names with their declared types.
    pub params:  Vec<(String, TypeSpec)>,
    /// The declared result type.
    pub ret:     Option<TypeSpec>,
    /// Position in the source code.
    pub pos:     Position,
}

/// A counted loop.
#[derive(Debug, Clone)]
pub struct ForLoop {
    /// Iterator name.
    pub iterator:   String,
    /// Iterator slot.
    pub slot:       usize,
    /// First value.
    pub from:       Expr,
    /// Bound.
    pub to:         Expr,
    /// Optional positive step; 1 when absent.
    pub step:       Option<Expr>,
    /// `desc` was given.
    pub descending: bool,
    /// The loop body.
    pub body:       Vec<Statement>,
    /// Position in the source code.
    pub pos:        Position,
}

/// Represents a statement.
///
/// Compound statements own their nested statement lists.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `;`
    Nop {
        /// Position in the source code.
        pos: Position,
    },
    /// `trace on;` / `trace off;`
    Trace {
        /// The new tracing state.
        on:  bool,
        /// Position in the source code.
        pos: Position,
    },
    /// `let NAME [type] [= expr];` or `NAME = expr;`
    Let {
        /// Variable name.
        name:     String,
        /// Variable slot.
        slot:     usize,
        /// Declared type, if any.
        declared: Option<TypeSpec>,
        /// Initial value, if any.
        value:    Option<Expr>,
        /// Written with the `let` keyword.
        keyword:  bool,
        /// Position in the source code.
        pos:      Position,
    },
    /// `import NAME;`
    Import {
        /// The imported module name.
        module: String,
        /// Position in the source code.
        pos:    Position,
    },
    /// A function declaration.
    Function(FunctionDecl),
    /// `if ... then ... [elsif ...] [else ...] end if;`
    If {
        /// The condition arms, in order.
        branches:  Vec<Branch>,
        /// The `else` arm.
        otherwise: Option<Vec<Statement>>,
        /// Position in the source code.
        pos:       Position,
    },
    /// `while expr loop ... end loop;`
    While {
        /// Loop condition.
        condition: Expr,
        /// Loop body.
        body:      Vec<Statement>,
        /// Position in the source code.
        pos:       Position,
    },
    /// `for NAME in a to b [step s] [asc|desc] loop ... end loop;`
    For(ForLoop),
    /// `forall NAME in NAME loop ... end loop;`
    Forall {
        /// Iterator name.
        iterator:   String,
        /// Iterator slot.
        slot:       usize,
        /// Iterated collection variable.
        collection: String,
        /// Collection slot.
        source:     usize,
        /// Loop body.
        body:       Vec<Statement>,
        /// Position in the source code.
        pos:        Position,
    },
    /// `break;`
    Break {
        /// Position in the source code.
        pos: Position,
    },
    /// `continue;`
    Continue {
        /// Position in the source code.
        pos: Position,
    },
    /// `return [expr];`
    Return {
        /// The result, if any.
        value: Option<Expr>,
        /// Position in the source code.
        pos:   Position,
    },
    /// `begin ... [exception when ...] end;`
    Block {
        /// The protected statements.
        body:     Vec<Statement>,
        /// Exception handlers, in order.
        handlers: Vec<Handler>,
        /// Position in the source code.
        pos:      Position,
    },
    /// `print ...;` and `put ...;`
    Print {
        /// Values to write.
        args:    Vec<Expr>,
        /// `print` ends the line, `put` does not.
        newline: bool,
        /// Position in the source code.
        pos:     Position,
    },
    /// `raise NAME;`
    Raise {
        /// Lower-case exception name.
        name: String,
        /// Position in the source code.
        pos:  Position,
    },
    /// `include "path";`, with the statements of the included source.
    Include {
        /// The include path as written.
        path: String,
        /// The included statements.
        body: Vec<Statement>,
        /// Position in the source code.
        pos:  Position,
    },
    /// An expression evaluated for its effect.
    Expression {
        /// The expression.
        expr: Expr,
        /// Position in the source code.
        pos:  Position,
    },
}

impl Statement {
    /// Gets the source position of `self`.
    #[must_use]
    pub const fn pos(&self) -> Position {
        match self {
            Self::Function(decl) => decl.pos,
            Self::For(for_loop) => for_loop.pos,
            Self::Nop { pos }
            | Self::Trace { pos, .. }
            | Self::Let { pos, .. }
            | Self::Import { pos, .. }
            | Self::If { pos, .. }
            | Self::While { pos, .. }
            | Self::Forall { pos, .. }
            | Self::Break { pos }
            | Self::Continue { pos }
            | Self::Return { pos, .. }
            | Self::Block { pos, .. }
            | Self::Print { pos, .. }
            | Self::Raise { pos, .. }
            | Self::Include { pos, .. }
            | Self::Expression { pos, .. } => *pos,
        }
    }

    /// Gets the line number from `self`.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos().line
    }
}

/// Represents a binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Logical and (`and`)
    And,
    /// Logical or (`or`)
    Or,
    /// Logical exclusive or (`xor`)
    Xor,
    /// Equal to (`==`)
    Equal,
    /// Not equal to (`!=`)
    NotEqual,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Regular expression match (`matches`)
    Matches,
    /// Bitwise and (`&`)
    BitAnd,
    /// Bitwise or (`|`)
    BitOr,
    /// Bitwise exclusive or (`^`)
    BitXor,
    /// Left shift (`<<`)
    ShiftLeft,
    /// Right shift (`>>`)
    ShiftRight,
    /// Addition or concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Remainder (`%`)
    Mod,
    /// Exponentiation (`**`)
    Pow,
}

impl BinaryOperator {
    /// `true` for the non-chainable relational operators.
    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(self,
                 Self::Equal
                 | Self::NotEqual
                 | Self::Less
                 | Self::LessEqual
                 | Self::Greater
                 | Self::GreaterEqual
                 | Self::Matches)
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Arithmetic identity (`+x`).
    Plus,
    /// Logical NOT (`!x`, `not x`).
    Not,
    /// Bitwise complement (`~x`).
    Complement,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BinaryOperator::{
            Add, And, BitAnd, BitOr, BitXor, Div, Equal, Greater, GreaterEqual, Less, LessEqual,
            Matches, Mod, Mul, NotEqual, Or, Pow, ShiftLeft, ShiftRight, Sub, Xor,
        };
        let operator = match self {
            And => "and",
            Or => "or",
            Xor => "xor",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Matches => "matches",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "**",
        };
        write!(f, "{operator}")
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "not ",
            Self::Complement => "~",
        };
        write!(f, "{operator}")
    }
}
