use crate::{
    error::ParseError,
    interpreter::{
        evaluator::function::core::Builtin,
        lexer::{Keyword, Lexeme, Position, Token},
        parser::core::{ParseResult, Parser},
        value::types::Type,
    },
};

/// Takes the next lexeme, failing at the end of input.
pub(in crate::interpreter::parser) fn next(parser: &mut Parser<'_>) -> ParseResult<Lexeme> {
    parser.tokens
          .next_lexeme()
          .ok_or_else(|| ParseError::UnexpectedEndOfInput { pos: parser.tokens.position() })
}

/// Builds the error for a lexeme that does not fit the grammar.
///
/// A `;` is handed back to the stream so that error recovery resumes right
/// after it instead of skipping the following statement.
pub(in crate::interpreter::parser) fn unexpected(parser: &mut Parser<'_>,
                                                 lexeme: Lexeme,
                                                 expected: &str)
                                                 -> ParseError {
    let pos = lexeme.pos;
    match lexeme.token {
        Token::Invalid(text) => ParseError::InvalidToken { text, pos },
        Token::Semicolon => {
            parser.tokens.push_back(lexeme);
            ParseError::UnexpectedToken { token: format!("expected {expected}, found ';'"),
                                          pos }
        },
        token => ParseError::UnexpectedToken { token: format!("expected {expected}, found '{token}'"),
                                               pos },
    }
}

/// Consumes `token` or fails.
///
/// # Returns
/// The position of the consumed token.
pub(in crate::interpreter::parser) fn expect(parser: &mut Parser<'_>,
                                             token: &Token)
                                             -> ParseResult<Position> {
    let lexeme = next(parser)?;
    if lexeme.token == *token {
        return Ok(lexeme.pos);
    }
    Err(unexpected(parser, lexeme, &format!("'{token}'")))
}

/// Consumes the keyword `keyword` or fails.
pub(in crate::interpreter::parser) fn expect_keyword(parser: &mut Parser<'_>,
                                                     keyword: Keyword)
                                                     -> ParseResult<Position> {
    expect(parser, &Token::Keyword(keyword))
}

/// Consumes the terminating `;` of a statement.
pub(in crate::interpreter::parser) fn expect_semicolon(parser: &mut Parser<'_>) -> ParseResult<()> {
    expect(parser, &Token::Semicolon).map(|_| ())
}

/// `true` if the next token is `token`.
pub(in crate::interpreter::parser) fn peek_is(parser: &mut Parser<'_>, token: &Token) -> bool {
    parser.tokens.peek_token() == Some(token)
}

/// Consumes the next token if it is `token`.
pub(in crate::interpreter::parser) fn accept(parser: &mut Parser<'_>, token: &Token) -> bool {
    if peek_is(parser, token) {
        parser.tokens.next_lexeme();
        return true;
    }
    false
}

/// Consumes the next token if it is the keyword `keyword`.
pub(in crate::interpreter::parser) fn accept_keyword(parser: &mut Parser<'_>,
                                                     keyword: Keyword)
                                                     -> bool {
    accept(parser, &Token::Keyword(keyword))
}

/// Parses `item ("," item)*` up to `closing`, which it consumes. A list
/// that opens with `closing` is empty.
pub(in crate::interpreter::parser) fn parse_comma_separated<T>(
    parser: &mut Parser<'_>,
    parse_item: impl Fn(&mut Parser<'_>) -> ParseResult<T>,
    closing: &Token)
    -> ParseResult<Vec<T>> {
    let mut items = Vec::new();
    if accept(parser, closing) {
        return Ok(items);
    }
    loop {
        items.push(parse_item(parser)?);
        let lexeme = next(parser)?;
        match &lexeme.token {
            Token::Comma => {},
            tok if tok == closing => break,
            _ => return Err(unexpected(parser, lexeme, &format!("',' or '{closing}'"))),
        }
    }
    Ok(items)
}

/// Parses a parenthesized argument list: `"(" (expression ("," expression)*)? ")"`.
pub(in crate::interpreter::parser) fn parse_arguments(parser: &mut Parser<'_>)
                                                      -> ParseResult<Vec<crate::ast::Expr>> {
    expect(parser, &Token::LParen)?;
    parse_comma_separated(parser,
                          crate::interpreter::parser::core::parse_expression,
                          &Token::RParen)
}

/// Parses a plain identifier and returns its name.
///
/// Keywords in name position are reported as reserved. This function does
/// not check for builtin or imported type names; see [`check_reserved`].
///
/// # Errors
/// Returns a `ParseError` if:
/// - the next token is not an identifier,
/// - the input ends unexpectedly.
pub(in crate::interpreter::parser) fn parse_identifier(parser: &mut Parser<'_>)
                                                       -> ParseResult<(String, Position)> {
    let lexeme = next(parser)?;
    match lexeme.token {
        Token::Identifier(name) => Ok((name, lexeme.pos)),
        Token::Keyword(k) => Err(ParseError::IdentifierReserved { name: k.to_string(),
                                                                  pos:  lexeme.pos, }),
        _ => Err(unexpected(parser, lexeme, "an identifier")),
    }
}

/// Rejects names that belong to builtins or imported object types.
pub(in crate::interpreter::parser) fn check_reserved(parser: &Parser<'_>,
                                                     name: &str,
                                                     pos: Position)
                                                     -> ParseResult<()> {
    let imported = parser.ctx.plugins().borrow().by_name(name).is_some();
    if Builtin::from_name(name).is_some() || imported {
        return Err(ParseError::IdentifierReserved { name: name.to_string(),
                                                    pos });
    }
    Ok(())
}

/// Rejects an assignment to a collection iterated by an enclosing `forall`.
pub(in crate::interpreter::parser) fn check_unguarded(parser: &Parser<'_>,
                                                      name: &str,
                                                      operation: &str,
                                                      pos: Position)
                                                      -> ParseResult<()> {
    if parser.is_guarded(name) {
        return Err(ParseError::ForbiddenMutation { name: name.to_string(),
                                                   operation: operation.to_string(),
                                                   pos });
    }
    Ok(())
}

/// The error for an argument list of the wrong length.
pub(in crate::interpreter::parser) fn check_arity(name: &str,
                                                  expected: usize,
                                                  found: usize,
                                                  pos: Position)
                                                  -> ParseResult<()> {
    if expected == found {
        return Ok(());
    }
    Err(ParseError::ArgumentCount { name: name.to_string(),
                                    expected,
                                    found,
                                    pos })
}

/// A type mismatch between two static types.
pub(in crate::interpreter::parser) fn mismatch(expected: impl ToString,
                                               found: Type,
                                               pos: Position)
                                               -> ParseError {
    ParseError::TypeMismatch { expected: expected.to_string(),
                               found: found.to_string(),
                               pos }
}
