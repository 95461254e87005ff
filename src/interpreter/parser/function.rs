use std::rc::Rc;

use crate::{
    ast::{FunctionDecl, Statement},
    error::ParseError,
    interpreter::{
        context::functor::Param,
        lexer::{Keyword, Position, Token},
        parser::{
            block::parse_block,
            core::{ParseResult, Parser, ReturnRule},
            types::parse_type,
            utils::{accept, accept_keyword, check_reserved, expect, expect_keyword, parse_identifier},
        },
    },
};

/// Parses a function declaration.
///
/// Syntax:
/// ```text
///     function NAME(p1 type, p2 type) [return type] is
///     begin
///         <statements>
///     [exception ...]
///     end;
/// ```
///
/// Parameters are registered, pinned to their declared types, in a fresh
/// child context that only shares functions, plugins and rows with the
/// caller. The function is declared before its body is parsed so that the
/// body may call it recursively; if the body fails to parse the declaration
/// is withdrawn again.
///
/// # Parameters
/// - `parser`: Parser positioned after the `function` keyword.
/// - `pos`: Position of the `function` keyword.
///
/// # Returns
/// A `Statement::Function` whose functor holds the parsed body.
pub(in crate::interpreter::parser) fn parse_function(parser: &mut Parser<'_>,
                                                     pos: Position)
                                                     -> ParseResult<Statement> {
    let (name, name_pos) = parse_identifier(parser)?;
    check_reserved(parser, &name, name_pos)?;
    expect(parser, &Token::LParen)?;

    let mut body_ctx = parser.ctx.child();
    let mut params = Vec::new();
    let mut specs = Vec::new();
    if !accept(parser, &Token::RParen) {
        loop {
            let (param, param_pos) = parse_identifier(parser)?;
            check_reserved(parser, &param, param_pos)?;
            if specs.iter().any(|(p, _)| *p == param) {
                return Err(ParseError::Other { message: format!("duplicate parameter '{param}'"),
                                               pos:     param_pos, });
            }
            let spec = parse_type(parser)?;
            let slot = body_ctx.register_symbol(&param, spec.ty, param_pos)?;
            body_ctx.symbols.pin(slot);
            params.push(Param { name: param.clone(),
                                slot,
                                ty: spec.ty });
            specs.push((param, spec));

            if accept(parser, &Token::Comma) {
                continue;
            }
            expect(parser, &Token::RParen)?;
            break;
        }
    }

    let ret = if accept_keyword(parser, Keyword::Return) {
        Some(parse_type(parser)?)
    } else {
        None
    };
    expect_keyword(parser, Keyword::Is)?;
    let begin = expect_keyword(parser, Keyword::Begin)?;

    let functors = parser.ctx.functors();
    let functor = functors.declare(&name, params, ret.as_ref().map(|spec| spec.ty));
    let returns = ret.as_ref()
                     .map_or(ReturnRule::Procedure, |spec| ReturnRule::Function(spec.ty));

    let parsed = {
        let depth = parser.depth;
        let mut inner = Parser::nested(parser.tokens, &mut body_ctx, returns, depth);
        parse_block(&mut inner, begin)
    };
    match parsed {
        Ok(block) => functor.define(Rc::new(vec![block]), body_ctx.symbols.clone()),
        Err(e) => {
            functors.withdraw(&functor);
            return Err(e);
        },
    }

    Ok(Statement::Function(FunctionDecl { functor,
                                          params: specs,
                                          ret,
                                          pos }))
}
