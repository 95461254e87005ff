use crate::{
    ast::{BinaryOperator, Expr},
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Position, Token},
        parser::{
            core::{ParseResult, Parser},
            types::{require_kind, unify},
            unary::parse_primary,
        },
        value::types::{Major, Type},
    },
};

/// Maps a token to the binary operator it spells, if any.
fn token_to_binary_operator(token: &Token) -> Option<BinaryOperator> {
    let op = match token {
        Token::Keyword(Keyword::And) => BinaryOperator::And,
        Token::Keyword(Keyword::Or) => BinaryOperator::Or,
        Token::Keyword(Keyword::Xor) => BinaryOperator::Xor,
        Token::Keyword(Keyword::Matches) => BinaryOperator::Matches,
        Token::EqualEqual => BinaryOperator::Equal,
        Token::BangEqual => BinaryOperator::NotEqual,
        Token::Less => BinaryOperator::Less,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::Greater => BinaryOperator::Greater,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        Token::Ampersand => BinaryOperator::BitAnd,
        Token::Pipe => BinaryOperator::BitOr,
        Token::Caret => BinaryOperator::BitXor,
        Token::ShiftLeft => BinaryOperator::ShiftLeft,
        Token::ShiftRight => BinaryOperator::ShiftRight,
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Sub,
        Token::Star => BinaryOperator::Mul,
        Token::Slash => BinaryOperator::Div,
        Token::Percent => BinaryOperator::Mod,
        Token::StarStar => BinaryOperator::Pow,
        _ => return None,
    };
    Some(op)
}

/// Consumes the next token if it is one of `ops`.
///
/// # Returns
/// The operator and its position.
fn accept_operator(parser: &mut Parser<'_>,
                   ops: &[BinaryOperator])
                   -> Option<(BinaryOperator, Position)> {
    let lexeme = parser.tokens.peek()?;
    if let Some(op) = token_to_binary_operator(&lexeme.token)
       && ops.contains(&op)
    {
        let pos = lexeme.pos;
        parser.tokens.next_lexeme();
        return Some((op, pos));
    }
    None
}

/// Builds a typed binary node.
fn make_binary(op: BinaryOperator, left: Expr, right: Expr, pos: Position) -> ParseResult<Expr> {
    let ty = binary_type(op, left.ty(), right.ty(), pos)?;
    Ok(Expr::Binary { op,
                      left: Box::new(left),
                      right: Box::new(right),
                      ty,
                      pos })
}

/// Parses one left-associative precedence level.
fn parse_left_assoc(parser: &mut Parser<'_>,
                    ops: &[BinaryOperator],
                    operand: fn(&mut Parser<'_>) -> ParseResult<Expr>)
                    -> ParseResult<Expr> {
    let mut left = operand(parser)?;
    while let Some((op, pos)) = accept_operator(parser, ops) {
        let right = operand(parser)?;
        left = make_binary(op, left, right, pos)?;
    }
    Ok(left)
}

/// Computes the static result type of a binary operation.
///
/// Both operands are first reduced to a common type (see
/// [`unify`](crate::interpreter::parser::types::unify)), which must then be a
/// kind the operator supports. `imaginary ** integer` is the one pairing of
/// different kinds that is allowed.
///
/// # Example
/// ```
/// use plume::{
///     ast::BinaryOperator,
///     interpreter::{lexer::Position, parser::binary::binary_type, value::types::Type},
/// };
///
/// let pos = Position::new(1, 1);
/// assert_eq!(binary_type(BinaryOperator::Add, Type::INTEGER, Type::NUMERIC, pos).unwrap(),
///            Type::NUMERIC);
/// assert_eq!(binary_type(BinaryOperator::Less, Type::LITERAL, Type::LITERAL, pos).unwrap(),
///            Type::BOOLEAN);
/// assert!(binary_type(BinaryOperator::Mod, Type::LITERAL, Type::LITERAL, pos).is_err());
/// ```
pub fn binary_type(op: BinaryOperator, left: Type, right: Type, pos: Position) -> ParseResult<Type> {
    use BinaryOperator as B;
    use Major as M;

    if op == B::Pow && left == Type::IMAGINARY && (right == Type::INTEGER || right == Type::AUTO) {
        return Ok(Type::IMAGINARY);
    }

    let operand = unify(left, right, pos)?;
    let (allowed, expected): (&[Major], &str) = match op {
        B::And | B::Or | B::Xor => (&[M::Boolean], "boolean"),
        B::Equal | B::NotEqual => return Ok(Type::BOOLEAN),
        B::Less | B::LessEqual | B::Greater | B::GreaterEqual => {
            (&[M::Integer, M::Numeric, M::Literal, M::Tabchar], "an ordered type")
        },
        B::Matches => (&[M::Literal], "string"),
        B::BitAnd | B::BitOr | B::BitXor => (&[M::Integer, M::Boolean], "integer or boolean"),
        B::ShiftLeft | B::ShiftRight => (&[M::Integer], "integer"),
        B::Add => (&[M::Integer, M::Numeric, M::Imaginary, M::Literal, M::Tabchar], "a number, string or bytes"),
        B::Sub | B::Mul | B::Div | B::Pow => (&[M::Integer, M::Numeric, M::Imaginary], "a number"),
        B::Mod => (&[M::Integer, M::Numeric], "integer or decimal"),
    };
    require_kind(operand, allowed, expected, pos)?;

    if op.is_relational() || matches!(op, B::And | B::Or | B::Xor) {
        Ok(Type::BOOLEAN)
    } else {
        Ok(operand)
    }
}

/// Parses `and`, `or` and `xor`, all at the same, lowest level.
///
/// Grammar: `logical := relational (("and" | "or" | "xor") relational)*`
pub fn parse_logical(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parse_left_assoc(parser,
                     &[BinaryOperator::And, BinaryOperator::Or, BinaryOperator::Xor],
                     parse_relational)
}

/// Parses a single, non-chainable comparison.
///
/// Grammar: `relational := bitwise (relop bitwise)?`
///
/// # Errors
/// `ChainedRelational` for `a < b < c` and the like.
pub fn parse_relational(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    const RELATIONAL: &[BinaryOperator] = &[BinaryOperator::Equal,
                                            BinaryOperator::NotEqual,
                                            BinaryOperator::Less,
                                            BinaryOperator::LessEqual,
                                            BinaryOperator::Greater,
                                            BinaryOperator::GreaterEqual,
                                            BinaryOperator::Matches];

    let left = parse_bitwise(parser)?;
    let Some((op, pos)) = accept_operator(parser, RELATIONAL) else {
        return Ok(left);
    };
    let right = parse_bitwise(parser)?;
    let expr = make_binary(op, left, right, pos)?;

    if let Some((_, pos)) = accept_operator(parser, RELATIONAL) {
        return Err(ParseError::ChainedRelational { pos });
    }
    Ok(expr)
}

/// Grammar: `bitwise := shift (("&" | "|" | "^") shift)*`
fn parse_bitwise(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parse_left_assoc(parser,
                     &[BinaryOperator::BitAnd, BinaryOperator::BitOr, BinaryOperator::BitXor],
                     parse_shift)
}

/// Grammar: `shift := sum (("<<" | ">>") sum)*`
fn parse_shift(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parse_left_assoc(parser,
                     &[BinaryOperator::ShiftLeft, BinaryOperator::ShiftRight],
                     parse_sum)
}

/// Grammar: `sum := term (("+" | "-") term)*`
fn parse_sum(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parse_left_assoc(parser, &[BinaryOperator::Add, BinaryOperator::Sub], parse_term)
}

/// Grammar: `term := factor (("*" | "/" | "%") factor)*`
fn parse_term(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    parse_left_assoc(parser,
                     &[BinaryOperator::Mul, BinaryOperator::Div, BinaryOperator::Mod],
                     parse_factor)
}

/// Parses exponentiation, which is right-associative: `2 ** 3 ** 2` is
/// `2 ** 9`.
///
/// Grammar: `factor := primary ("**" factor)?`
pub(in crate::interpreter::parser) fn parse_factor(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let base = parse_primary(parser)?;
    match accept_operator(parser, &[BinaryOperator::Pow]) {
        Some((op, pos)) => {
            let exponent = parser.descend(parse_factor)?;
            make_binary(op, base, exponent, pos)
        },
        None => Ok(base),
    }
}
