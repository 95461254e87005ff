use crate::{
    ast::{Branch, Expr, ForLoop, Statement},
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Position},
        parser::{
            block::parse_statements_until,
            core::{ParseResult, Parser, parse_expression},
            types::require_kind,
            utils::{
                accept_keyword, check_reserved, check_unguarded, expect_keyword, expect_semicolon,
                mismatch, parse_identifier,
            },
        },
        value::types::{Major, Type},
    },
};

/// Parses a condition, which must be boolean.
fn parse_condition(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let condition = parse_expression(parser)?;
    require_kind(condition.ty(), &[Major::Boolean], "boolean", condition.pos())?;
    Ok(condition)
}

/// Parses an integer bound or step of a `for` loop.
fn parse_integer(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let expr = parse_expression(parser)?;
    require_kind(expr.ty(), &[Major::Integer], "integer", expr.pos())?;
    Ok(expr)
}

/// Consumes `end loop ;`.
fn expect_end_loop(parser: &mut Parser<'_>) -> ParseResult<()> {
    expect_keyword(parser, Keyword::End)?;
    expect_keyword(parser, Keyword::Loop)?;
    expect_semicolon(parser)
}

/// Parses a conditional with optional `elsif` and `else` arms.
///
/// Syntax:
/// ```text
///     if <condition> then <statements>
///     elsif <condition> then <statements>
///     else <statements>
///     end if;
/// ```
///
/// # Parameters
/// - `parser`: Parser positioned after the `if` keyword.
/// - `pos`: Position of the `if` token.
///
/// # Errors
/// - `TypeMismatch` for a condition that is not boolean.
/// - `UnexpectedToken` if `then`, `end` or `if` is missing.
pub(in crate::interpreter::parser) fn parse_if(parser: &mut Parser<'_>,
                                               pos: Position)
                                               -> ParseResult<Statement> {
    let mut branches = Vec::new();
    loop {
        let condition = parse_condition(parser)?;
        expect_keyword(parser, Keyword::Then)?;
        let body = parse_statements_until(parser, &[Keyword::Elsif, Keyword::Else, Keyword::End])?;
        branches.push(Branch { condition, body });

        if !accept_keyword(parser, Keyword::Elsif) {
            break;
        }
    }

    let otherwise = if accept_keyword(parser, Keyword::Else) {
        Some(parse_statements_until(parser, &[Keyword::End])?)
    } else {
        None
    };

    expect_keyword(parser, Keyword::End)?;
    expect_keyword(parser, Keyword::If)?;
    expect_semicolon(parser)?;
    Ok(Statement::If { branches,
                       otherwise,
                       pos })
}

/// Grammar: `"while" expression "loop" statement* "end" "loop" ";"`
pub(in crate::interpreter::parser) fn parse_while(parser: &mut Parser<'_>,
                                                  pos: Position)
                                                  -> ParseResult<Statement> {
    let condition = parse_condition(parser)?;
    expect_keyword(parser, Keyword::Loop)?;
    let body = parse_statements_until(parser, &[Keyword::End])?;
    expect_end_loop(parser)?;
    Ok(Statement::While { condition,
                          body,
                          pos })
}

/// Parses a counted loop.
///
/// Syntax:
/// ```text
///     for NAME in <from> to <to> [step <step>] [asc | desc] loop
///         <statements>
///     end loop;
/// ```
///
/// The iterator is registered as an integer and its type is pinned while the
/// body is parsed, so the body cannot change it.
pub(in crate::interpreter::parser) fn parse_for(parser: &mut Parser<'_>,
                                                pos: Position)
                                                -> ParseResult<Statement> {
    let (iterator, name_pos) = parse_identifier(parser)?;
    check_reserved(parser, &iterator, name_pos)?;
    check_unguarded(parser, &iterator, "assignment", name_pos)?;

    expect_keyword(parser, Keyword::In)?;
    let from = parse_integer(parser)?;
    expect_keyword(parser, Keyword::To)?;
    let to = parse_integer(parser)?;
    let step = if accept_keyword(parser, Keyword::Step) {
        Some(parse_integer(parser)?)
    } else {
        None
    };
    let descending = if accept_keyword(parser, Keyword::Desc) {
        true
    } else {
        accept_keyword(parser, Keyword::Asc);
        false
    };
    expect_keyword(parser, Keyword::Loop)?;

    let slot = parser.ctx.register_symbol(&iterator, Type::INTEGER, name_pos)?;
    let prior = parser.ctx.symbols.pin(slot);
    let body = parse_statements_until(parser, &[Keyword::End]);
    parser.ctx.symbols.unpin(slot, prior);
    let body = body?;
    expect_end_loop(parser)?;

    Ok(Statement::For(ForLoop { iterator,
                                slot,
                                from,
                                to,
                                step,
                                descending,
                                body,
                                pos }))
}

/// Parses an iteration over the elements of a collection variable.
///
/// Syntax:
/// ```text
///     forall NAME in COLLECTION loop
///         <statements>
///     end loop;
/// ```
///
/// The iterator takes the element type and is pinned for the body. The
/// collection is guarded: assigning it, or calling a mutating method on it,
/// anywhere in the body is rejected.
///
/// # Errors
/// - `UnknownSymbol` if the collection variable does not exist.
/// - `TypeMismatch` if it is not a collection.
/// - `ForbiddenMutation` for a guarded mutation in the body.
pub(in crate::interpreter::parser) fn parse_forall(parser: &mut Parser<'_>,
                                                   pos: Position)
                                                   -> ParseResult<Statement> {
    let (iterator, name_pos) = parse_identifier(parser)?;
    check_reserved(parser, &iterator, name_pos)?;
    check_unguarded(parser, &iterator, "assignment", name_pos)?;
    expect_keyword(parser, Keyword::In)?;
    let (collection, collection_pos) = parse_identifier(parser)?;

    let Some(symbol) = parser.ctx.symbols.lookup(&collection) else {
        return Err(ParseError::UnknownSymbol { name: collection,
                                               pos:  collection_pos, });
    };
    let (source, collection_ty) = (symbol.slot, symbol.ty);
    let elem = match collection_ty.element() {
        Some(elem) => elem,
        None if collection_ty == Type::AUTO => Type::AUTO,
        None => return Err(mismatch("a collection", collection_ty, collection_pos)),
    };
    if iterator == collection {
        return Err(ParseError::ForbiddenMutation { name: collection,
                                                   operation: "iteration".to_string(),
                                                   pos: name_pos });
    }
    expect_keyword(parser, Keyword::Loop)?;

    let slot = parser.ctx.register_symbol(&iterator, elem, name_pos)?;
    let prior = parser.ctx.symbols.pin(slot);
    parser.guards.push(collection.clone());
    let body = parse_statements_until(parser, &[Keyword::End]);
    parser.guards.pop();
    parser.ctx.symbols.unpin(slot, prior);
    let body = body?;
    expect_end_loop(parser)?;

    Ok(Statement::Forall { iterator,
                           slot,
                           collection,
                           source,
                           body,
                           pos })
}
