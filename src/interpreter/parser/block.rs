use crate::{
    ast::{Handler, Statement},
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Position, Token},
        parser::{
            core::{ParseResult, Parser},
            statement::parse_statement,
            utils::{accept_keyword, expect_keyword, expect_semicolon, next, unexpected},
        },
    },
};

/// Parses statements up to, but not including, one of the `terminators`.
///
/// Every compound statement consumes its own `end`, so the first terminator
/// seen at this level belongs to the caller.
///
/// # Errors
/// `UnexpectedEndOfInput` if the source ends before a terminator.
pub(in crate::interpreter::parser) fn parse_statements_until(parser: &mut Parser<'_>,
                                                             terminators: &[Keyword])
                                                             -> ParseResult<Vec<Statement>> {
    let mut body = Vec::new();
    loop {
        match parser.tokens.peek_token() {
            Some(Token::Keyword(k)) if terminators.contains(k) => return Ok(body),
            None => return Err(ParseError::UnexpectedEndOfInput { pos: parser.tokens.position() }),
            _ => body.push(parse_statement(parser)?),
        }
    }
}

/// Parses a block with optional exception handlers.
///
/// Syntax:
/// ```text
///     begin
///         statements
///     exception
///         when NAME then statements
///         when others then statements
///     end;
/// ```
///
/// # Parameters
/// - `parser`: Parser positioned after `begin`.
/// - `pos`: Position of the `begin` keyword.
///
/// # Returns
/// A `Statement::Block` owning its body and handlers.
pub(in crate::interpreter::parser) fn parse_block(parser: &mut Parser<'_>,
                                                  pos: Position)
                                                  -> ParseResult<Statement> {
    let body = parse_statements_until(parser, &[Keyword::Exception, Keyword::End])?;

    let mut handlers = Vec::new();
    if accept_keyword(parser, Keyword::Exception) {
        loop {
            expect_keyword(parser, Keyword::When)?;
            let lexeme = next(parser)?;
            let name = match lexeme.token {
                Token::Keyword(Keyword::Others) => None,
                Token::Identifier(name) => Some(name),
                _ => return Err(unexpected(parser, lexeme, "an exception name or 'others'")),
            };
            expect_keyword(parser, Keyword::Then)?;
            let body = parse_statements_until(parser, &[Keyword::When, Keyword::End])?;
            handlers.push(Handler { name, body });

            if !matches!(parser.tokens.peek_token(), Some(Token::Keyword(Keyword::When))) {
                break;
            }
        }
    }

    expect_keyword(parser, Keyword::End)?;
    expect_semicolon(parser)?;
    Ok(Statement::Block { body, handlers, pos })
}
