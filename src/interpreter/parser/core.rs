use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{
        context::Context, parser::binary::parse_logical, tokenizer::TokenStream,
        value::types::Type,
    },
    util::stack::guarded,
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting of parenthesized expressions, unary and `**` chains and
/// compound statements a parse accepts.
pub const MAX_NESTING: usize = 512;

/// What a `return` statement may carry at the current nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRule {
    /// Script level: `return;` ends the run, a value is rejected.
    TopLevel,
    /// Inside a function declared without a result.
    Procedure,
    /// Inside a function declared with `return TYPE`.
    Function(Type),
}

/// The parser state threaded through every parse function.
///
/// Holds the token stream, the context whose symbol table receives new
/// names, the collections guarded by enclosing `forall` loops, the rule
/// for `return` statements and the current nesting depth.
pub struct Parser<'a> {
    /// The token source.
    pub tokens:           &'a mut TokenStream,
    /// The context symbols are registered in.
    pub ctx:              &'a mut Context,
    pub(crate) guards:    Vec<String>,
    pub(crate) returns:   ReturnRule,
    pub(crate) depth:     usize,
}

impl<'a> Parser<'a> {
    /// A parser for script-level statements.
    pub fn new(tokens: &'a mut TokenStream, ctx: &'a mut Context) -> Self {
        Self { tokens,
               ctx,
               guards: Vec::new(),
               returns: ReturnRule::TopLevel,
               depth: 0 }
    }

    /// A parser for a function body, reading from the same stream into the
    /// function's own context. It continues at the declaring parser's
    /// `depth`.
    pub(crate) fn nested<'b>(tokens: &'b mut TokenStream,
                             ctx: &'b mut Context,
                             returns: ReturnRule,
                             depth: usize)
                             -> Parser<'b> {
        Parser { tokens,
                 ctx,
                 guards: Vec::new(),
                 returns,
                 depth }
    }

    /// Runs `f` one nesting level deeper.
    ///
    /// # Errors
    /// `NestingTooDeep` once the depth would exceed [`MAX_NESTING`], or the
    /// error of `f`.
    pub(crate) fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep { limit: MAX_NESTING,
                                                    pos:   self.tokens.position(), });
        }
        self.depth += 1;
        let result = guarded(|| f(self));
        self.depth -= 1;
        result
    }

    /// `true` if `name` is iterated by an enclosing `forall`.
    #[must_use]
    pub fn is_guarded(&self, name: &str) -> bool {
        self.guards.iter().any(|g| g == name)
    }
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing.
/// It begins at the lowest-precedence level, the logical operators, and
/// recursively descends through the precedence hierarchy.
///
/// Grammar: `expression := logical`
///
/// # Parameters
/// - `parser`: Parser positioned at the first token of the expression.
///
/// # Returns
/// The parsed expression node, annotated with its static type.
///
/// # Errors
/// Any `ParseError`, including `NestingTooDeep` for expressions nested
/// beyond [`MAX_NESTING`].
pub fn parse_expression(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parser.descend(parse_logical)
}
