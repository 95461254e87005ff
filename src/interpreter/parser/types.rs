use crate::{
    ast::TypeSpec,
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Position, Token},
        parser::{
            core::{ParseResult, Parser},
            utils::{accept, expect, mismatch, next, parse_comma_separated, unexpected},
        },
        value::types::{Major, Type},
    },
};

/// `true` if `token` can start a type declaration.
pub(in crate::interpreter::parser) fn starts_type(parser: &Parser<'_>, token: &Token) -> bool {
    match token {
        Token::Keyword(Keyword::Auto
                       | Keyword::Boolean
                       | Keyword::Integer
                       | Keyword::Decimal
                       | Keyword::String
                       | Keyword::Bytes
                       | Keyword::Imaginary
                       | Keyword::Row) => true,
        Token::Identifier(name) => parser.ctx.plugins().borrow().by_name(name).is_some(),
        _ => false,
    }
}

/// Parses a type declaration.
///
/// Grammar:
/// ```text
///     type := base ("[" "]")*
///     base := "auto" | "boolean" | "integer" | "decimal" | "string"
///           | "bytes" | "imaginary" | "row" "(" type ("," type)* ")"
///           | IMPORTED_TYPE_NAME
/// ```
///
/// Row declarations register their shape so the type prints by its fields.
///
/// # Returns
/// The resolved type with its source spelling.
pub(in crate::interpreter::parser) fn parse_type(parser: &mut Parser<'_>) -> ParseResult<TypeSpec> {
    let lexeme = next(parser)?;
    let (mut ty, mut spelling) = match &lexeme.token {
        Token::Keyword(Keyword::Auto) => (Type::AUTO, "auto".to_string()),
        Token::Keyword(Keyword::Boolean) => (Type::BOOLEAN, "boolean".to_string()),
        Token::Keyword(Keyword::Integer) => (Type::INTEGER, "integer".to_string()),
        Token::Keyword(Keyword::Decimal) => (Type::NUMERIC, "decimal".to_string()),
        Token::Keyword(Keyword::String) => (Type::LITERAL, "string".to_string()),
        Token::Keyword(Keyword::Bytes) => (Type::TABCHAR, "bytes".to_string()),
        Token::Keyword(Keyword::Imaginary) => (Type::IMAGINARY, "imaginary".to_string()),
        Token::Keyword(Keyword::Row) => {
            expect(parser, &Token::LParen)?;
            let fields = parse_comma_separated(parser, parse_type, &Token::RParen)?;
            if fields.is_empty() {
                return Err(ParseError::Other { message: "a row needs at least one field".to_string(),
                                               pos:     lexeme.pos, });
            }
            let types: Vec<Type> = fields.iter().map(|f| f.ty).collect();
            let names: Vec<&str> = fields.iter().map(|f| f.spelling.as_str()).collect();
            (parser.ctx.shared().register_row(&types), format!("row({})", names.join(", ")))
        },
        Token::Identifier(name) => {
            let imported = parser.ctx.plugins().borrow().by_name(name).map(|l| l.type_id);
            match imported {
                Some(type_id) => (Type::object(type_id), name.clone()),
                None => {
                    return Err(ParseError::UnknownSymbol { name: name.clone(),
                                                           pos:  lexeme.pos, });
                },
            }
        },
        _ => return Err(unexpected(parser, lexeme, "a type")),
    };

    while accept(parser, &Token::LBracket) {
        expect(parser, &Token::RBracket)?;
        ty = ty.array_of();
        spelling.push_str("[]");
    }
    Ok(TypeSpec { ty, spelling })
}

/// The common operand type of a binary operation.
///
/// Equal types give that type, an untyped side defers to the other one and
/// an integer meeting a decimal gives a decimal. Anything else is a
/// mismatch.
///
/// # Example
/// ```
/// use plume::interpreter::{
///     lexer::Position,
///     parser::types::unify,
///     value::types::Type,
/// };
///
/// let pos = Position::new(1, 1);
/// assert_eq!(unify(Type::INTEGER, Type::NUMERIC, pos).unwrap(), Type::NUMERIC);
/// assert_eq!(unify(Type::AUTO, Type::LITERAL, pos).unwrap(), Type::LITERAL);
/// assert!(unify(Type::LITERAL, Type::INTEGER, pos).is_err());
/// ```
pub fn unify(left: Type, right: Type, pos: Position) -> ParseResult<Type> {
    if left == right {
        Ok(left)
    } else if left.is_untyped() {
        Ok(right)
    } else if right.is_untyped() {
        Ok(left)
    } else if left.is_number() && right.is_number() {
        Ok(Type::NUMERIC)
    } else {
        Err(mismatch(left, right, pos))
    }
}

/// Requires a scalar of one of the `allowed` kinds. `auto` always passes.
pub(in crate::interpreter::parser) fn require_kind(ty: Type,
                                                   allowed: &[Major],
                                                   expected: &str,
                                                   pos: Position)
                                                   -> ParseResult<()> {
    if ty == Type::AUTO || (ty.level == 0 && allowed.contains(&ty.major)) {
        return Ok(());
    }
    Err(mismatch(expected, ty, pos))
}

/// `true` if a value of static type `incoming` may be stored where `target`
/// is expected: an exact or widening match, an untyped value, or an untyped
/// target that the value upgrades.
#[must_use]
pub fn fits(target: Type, incoming: Type) -> bool {
    target.accepts(incoming) || incoming.is_untyped() || target.upgradable_to(incoming)
}

/// Fails unless `incoming` [`fits`] `target`.
pub(in crate::interpreter::parser) fn check_fits(target: Type,
                                                 incoming: Type,
                                                 pos: Position)
                                                 -> ParseResult<()> {
    if fits(target, incoming) {
        return Ok(());
    }
    Err(mismatch(target, incoming, pos))
}
