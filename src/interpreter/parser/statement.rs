use crate::{
    ast::{Expr, Statement},
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Position, Token},
        parser::{
            block::parse_block,
            control::{parse_for, parse_forall, parse_if, parse_while},
            core::{ParseResult, Parser, ReturnRule, parse_expression},
            function::parse_function,
            types::{check_fits, parse_type, starts_type},
            utils::{
                accept, check_reserved, check_unguarded, expect_semicolon, next, parse_identifier,
                peek_is, unexpected,
            },
        },
        tokenizer::Tokenizer,
        value::types::Type,
    },
};

/// Parses a single statement.
///
/// The leading keyword selects the statement form; an identifier followed
/// by `=` is an assignment, and anything else is an expression evaluated for
/// its effect.
///
/// # Parameters
/// - `parser`: Parser positioned at the first token of the statement.
///
/// # Returns
/// The parsed statement, with every name it introduces registered in the
/// parser's context.
///
/// # Errors
/// Any `ParseError`. Registrations made before the error stay in the symbol
/// table until the caller rolls the attempt back.
pub fn parse_statement(parser: &mut Parser<'_>) -> ParseResult<Statement> {
    parser.descend(parse_statement_form)
}

fn parse_statement_form(parser: &mut Parser<'_>) -> ParseResult<Statement> {
    let lexeme = next(parser)?;
    let pos = lexeme.pos;

    let keyword = match &lexeme.token {
        Token::Semicolon => return Ok(Statement::Nop { pos }),
        Token::Keyword(keyword) => *keyword,
        Token::Identifier(name) => {
            if peek_is(parser, &Token::Equals) {
                let name = name.clone();
                next(parser)?;
                return parse_assignment(parser, name, pos);
            }
            parser.tokens.push_back(lexeme);
            return parse_expression_statement(parser, pos);
        },
        _ => {
            parser.tokens.push_back(lexeme);
            return parse_expression_statement(parser, pos);
        },
    };

    match keyword {
        Keyword::Trace => parse_trace(parser, pos),
        Keyword::Let => parse_let(parser, pos),
        Keyword::Import => parse_import(parser, pos),
        Keyword::Function => parse_function(parser, pos),
        Keyword::If => parse_if(parser, pos),
        Keyword::While => parse_while(parser, pos),
        Keyword::For => parse_for(parser, pos),
        Keyword::Forall => parse_forall(parser, pos),
        Keyword::Break => expect_semicolon(parser).map(|()| Statement::Break { pos }),
        Keyword::Continue => expect_semicolon(parser).map(|()| Statement::Continue { pos }),
        Keyword::Return => parse_return(parser, pos),
        Keyword::Begin => parse_block(parser, pos),
        Keyword::Print => parse_print(parser, true, pos),
        Keyword::Put => parse_print(parser, false, pos),
        Keyword::Raise => parse_raise(parser, pos),
        Keyword::Include => parse_include(parser, pos),
        _ => {
            parser.tokens.push_back(lexeme);
            parse_expression_statement(parser, pos)
        },
    }
}

fn parse_expression_statement(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let expr = parse_expression(parser)?;
    expect_semicolon(parser)?;
    Ok(Statement::Expression { expr, pos })
}

/// Grammar: `"trace" ("on" | "off") ";"`
fn parse_trace(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let lexeme = next(parser)?;
    let on = match lexeme.token {
        Token::Keyword(Keyword::On) => true,
        Token::Keyword(Keyword::Off) => false,
        _ => return Err(unexpected(parser, lexeme, "'on' or 'off'")),
    };
    expect_semicolon(parser)?;
    Ok(Statement::Trace { on, pos })
}

/// Parses a declaration.
///
/// Grammar: `"let" NAME [type] ["=" expression] ";"`
///
/// The initializer is parsed before the name is registered, so it cannot
/// refer to a variable it introduces. A declared type must admit the
/// initializer's type.
fn parse_let(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let (name, name_pos) = parse_identifier(parser)?;
    check_reserved(parser, &name, name_pos)?;
    check_unguarded(parser, &name, "assignment", name_pos)?;

    let starts = match parser.tokens.peek_token().cloned() {
        Some(token) => starts_type(parser, &token),
        None => false,
    };
    let declared = if starts { Some(parse_type(parser)?) } else { None };

    let value = if accept(parser, &Token::Equals) {
        Some(parse_expression(parser)?)
    } else {
        None
    };
    expect_semicolon(parser)?;

    let ty = match (&declared, &value) {
        (Some(spec), Some(expr)) => {
            check_fits(spec.ty, expr.ty(), expr.pos())?;
            spec.ty
        },
        (Some(spec), None) => spec.ty,
        (None, Some(expr)) => expr.ty(),
        (None, None) => Type::AUTO,
    };
    let slot = parser.ctx.register_symbol(&name, ty, name_pos)?;

    Ok(Statement::Let { name,
                        slot,
                        declared,
                        value,
                        keyword: true,
                        pos })
}

/// Parses `NAME = expression ;`, the short form of `let`.
fn parse_assignment(parser: &mut Parser<'_>, name: String, pos: Position) -> ParseResult<Statement> {
    check_reserved(parser, &name, pos)?;
    check_unguarded(parser, &name, "assignment", pos)?;

    let value = parse_expression(parser)?;
    expect_semicolon(parser)?;
    let slot = parser.ctx.register_symbol(&name, value.ty(), pos)?;

    Ok(Statement::Let { name,
                        slot,
                        declared: None,
                        value: Some(value),
                        keyword: false,
                        pos })
}

/// Imports a native module while parsing, so that later statements can use
/// its type name.
fn parse_import(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let (module, _) = parse_identifier(parser)?;
    expect_semicolon(parser)?;

    let imported = parser.ctx.plugins().borrow_mut().import(&module);
    if let Err(details) = imported {
        tracing::debug!(module = %module, details = %details, "import failed");
        return Err(ParseError::ModuleNotFound { name: module,
                                                pos });
    }
    Ok(Statement::Import { module, pos })
}

/// Parses a `return`, which must agree with the enclosing function's
/// declared result.
fn parse_return(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let invalid = |details: &str| ParseError::InvalidReturn { details: details.to_string(),
                                                              pos };
    match parser.returns {
        ReturnRule::TopLevel | ReturnRule::Procedure => {
            if accept(parser, &Token::Semicolon) {
                return Ok(Statement::Return { value: None, pos });
            }
            Err(invalid(if parser.returns == ReturnRule::TopLevel {
                            "only a function can return a value"
                        } else {
                            "this function is declared without a result"
                        }))
        },
        ReturnRule::Function(ty) => {
            if peek_is(parser, &Token::Semicolon) {
                return Err(invalid("this function must return a value"));
            }
            let value = parse_expression(parser)?;
            check_fits(ty, value.ty(), value.pos())?;
            expect_semicolon(parser)?;
            Ok(Statement::Return { value: Some(value),
                                   pos })
        },
    }
}

/// Grammar: `("print" | "put") [expression ("," expression)*] ";"`
fn parse_print(parser: &mut Parser<'_>, newline: bool, pos: Position) -> ParseResult<Statement> {
    let mut args: Vec<Expr> = Vec::new();
    if !accept(parser, &Token::Semicolon) {
        loop {
            args.push(parse_expression(parser)?);
            if !accept(parser, &Token::Comma) {
                break;
            }
        }
        expect_semicolon(parser)?;
    }
    Ok(Statement::Print { args, newline, pos })
}

/// Grammar: `"raise" NAME ";"`
fn parse_raise(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let (name, _) = parse_identifier(parser)?;
    expect_semicolon(parser)?;
    Ok(Statement::Raise { name, pos })
}

/// Splices the statements of another source into the program.
///
/// The include must be trusted, stay within the nesting limit and be
/// opened by the configured resolver. The included source is parsed to its
/// end; the stream returns to the including source on every path.
fn parse_include(parser: &mut Parser<'_>, pos: Position) -> ParseResult<Statement> {
    let lexeme = next(parser)?;
    let Token::Literal(path) = lexeme.token else {
        return Err(unexpected(parser, lexeme, "a string"));
    };
    expect_semicolon(parser)?;

    let options = parser.ctx.options().clone();
    if !options.trusted {
        return Err(ParseError::UntrustedInclude { path, pos });
    }
    if parser.tokens.include_depth() >= options.include_depth {
        return Err(ParseError::IncludeTooDeep { limit: options.include_depth,
                                                pos });
    }
    let Some(resolver) = options.resolver else {
        return Err(ParseError::IncludeFailed { path,
                                               details: "no include resolver configured".to_string(),
                                               pos });
    };
    let reader = match resolver.open(&path) {
        Ok(reader) => reader,
        Err(e) => {
            return Err(ParseError::IncludeFailed { path,
                                                   details: e.to_string(),
                                                   pos });
        },
    };

    parser.tokens.push_source(Tokenizer::new(path.clone(), reader));
    let body = parse_included(parser);
    parser.tokens.pop_source();

    Ok(Statement::Include { path,
                            body: body?,
                            pos })
}

fn parse_included(parser: &mut Parser<'_>) -> ParseResult<Vec<Statement>> {
    let mut body = Vec::new();
    while parser.tokens.peek().is_some() {
        body.push(parse_statement(parser)?);
    }
    Ok(body)
}
