use std::rc::Rc;

use crate::{
    ast::{Expr, LiteralValue, UnaryOperator},
    error::ParseError,
    interpreter::{
        context::functor::Functor,
        evaluator::function::core::Builtin,
        lexer::{Keyword, Lexeme, Position, Token},
        parser::{
            core::{ParseResult, Parser, parse_expression},
            member::parse_member_chain,
            types::{check_fits, require_kind},
            utils::{check_arity, expect, next, parse_arguments, unexpected},
        },
        value::types::{Major, Type},
    },
};

/// Parses a unary operation or falls through to an element.
///
/// Unary operators are right-associative, so `- - x` negates twice.
///
/// Grammar:
/// ```text
///     primary := ("-" | "+" | "!" | "not" | "~") primary
///              | element
/// ```
///
/// # Parameters
/// - `parser`: Parser positioned at the operator or the element.
///
/// # Returns
/// An `Expr::Unary` node or the element itself.
pub fn parse_primary(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let op = match parser.tokens.peek_token() {
        Some(Token::Minus) => UnaryOperator::Negate,
        Some(Token::Plus) => UnaryOperator::Plus,
        Some(Token::Bang | Token::Keyword(Keyword::Not)) => UnaryOperator::Not,
        Some(Token::Tilde) => UnaryOperator::Complement,
        _ => return parse_element(parser),
    };
    let pos = next(parser)?.pos;
    let operand = parser.descend(parse_primary)?;
    let ty = unary_type(op, operand.ty(), pos)?;

    Ok(Expr::Unary { op,
                     operand: Box::new(operand),
                     ty,
                     pos })
}

/// Computes the static result type of a unary operation.
fn unary_type(op: UnaryOperator, operand: Type, pos: Position) -> ParseResult<Type> {
    match op {
        UnaryOperator::Negate | UnaryOperator::Plus => {
            require_kind(operand,
                         &[Major::Integer, Major::Numeric, Major::Imaginary],
                         "a number",
                         pos)?;
            Ok(operand)
        },
        UnaryOperator::Not => {
            require_kind(operand, &[Major::Boolean], "boolean", pos)?;
            Ok(Type::BOOLEAN)
        },
        UnaryOperator::Complement => {
            require_kind(operand, &[Major::Integer], "integer", pos)?;
            Ok(Type::INTEGER)
        },
    }
}

/// Parses an element followed by its member and index chain.
///
/// Grammar:
/// ```text
///     element := INTEGER | DECIMAL | STRING | "true" | "false" | "null"
///              | "(" expression ")"
///              | BUILTIN "(" args ")"
///              | IMPORTED_TYPE "(" args ")"
///              | VARIABLE
///              | FUNCTION "(" args ")"
/// ```
pub fn parse_element(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let base = parse_atom(parser)?;
    parse_member_chain(parser, base)
}

/// Parses an element without its member chain.
pub(in crate::interpreter::parser) fn parse_atom(parser: &mut Parser<'_>) -> ParseResult<Expr> {
    let lexeme = next(parser)?;
    let pos = lexeme.pos;
    let literal = |value| -> ParseResult<Expr> { Ok(Expr::Literal { value, pos }) };

    match lexeme.token {
        Token::Integer(i) => literal(LiteralValue::Integer(i)),
        Token::Decimal(n) => literal(LiteralValue::Decimal(n)),
        Token::Literal(s) => literal(LiteralValue::Literal(s)),
        Token::Keyword(Keyword::True) => literal(LiteralValue::Boolean(true)),
        Token::Keyword(Keyword::False) => literal(LiteralValue::Boolean(false)),
        Token::Keyword(Keyword::Null) => literal(LiteralValue::Null),
        Token::Keyword(Keyword::Bytes) => parse_builtin_call(parser, Builtin::Bytes, pos),
        Token::LParen => {
            let inner = parse_expression(parser)?;
            expect(parser, &Token::RParen)?;
            Ok(Expr::Group { inner: Box::new(inner),
                             pos })
        },
        Token::Identifier(name) => parse_name_reference(parser, name, pos),
        token => Err(unexpected(parser, Lexeme { token, pos }, "an expression")),
    }
}

/// Resolves an identifier at element level: builtin, imported type
/// constructor, variable, then user function.
fn parse_name_reference(parser: &mut Parser<'_>, name: String, pos: Position) -> ParseResult<Expr> {
    if let Some(func) = Builtin::from_name(&name) {
        return parse_builtin_call(parser, func, pos);
    }

    let imported = parser.ctx.plugins().borrow().by_name(&name).map(|l| l.type_id);
    if let Some(type_id) = imported {
        return parse_construct(parser, name, type_id, pos);
    }

    if let Some(symbol) = parser.ctx.symbols.lookup(&name) {
        let (slot, ty) = (symbol.slot, symbol.ty);
        return Ok(Expr::Variable { name, slot, ty, pos });
    }

    if let Some(functor) = parser.ctx.functors().lookup(&name) {
        return parse_call(parser, functor, pos);
    }

    Err(ParseError::UnknownSymbol { name, pos })
}

/// Parses the argument list of a builtin and types the call.
fn parse_builtin_call(parser: &mut Parser<'_>, func: Builtin, pos: Position) -> ParseResult<Expr> {
    let args = parse_arguments(parser)?;
    if !func.arity().admits(args.len()) {
        return Err(ParseError::ArgumentCount { name: func.name().to_string(),
                                               expected: func.arity().minimum(),
                                               found: args.len(),
                                               pos });
    }
    let types: Vec<Type> = args.iter().map(Expr::ty).collect();
    let ty = func.result_type(&types, parser.ctx, pos)?;

    Ok(Expr::Builtin { func, args, ty, pos })
}

/// Parses `TYPE(args)` for an imported object type and selects the
/// constructor whose declarations admit the argument types.
fn parse_construct(parser: &mut Parser<'_>,
                   type_name: String,
                   type_id: u64,
                   pos: Position)
                   -> ParseResult<Expr> {
    let args = parse_arguments(parser)?;
    let types: Vec<Type> = args.iter().map(Expr::ty).collect();

    let plugins = parser.ctx.plugins();
    let registry = plugins.borrow();
    let Some(loaded) = registry.by_id(type_id) else {
        return Err(ParseError::UnknownSymbol { name: type_name, pos });
    };
    let descriptor = loaded.module.descriptor();

    if let Some(ctor) = descriptor.constructor(&types, Type::object(type_id)) {
        let ctor = ctor.id;
        return Ok(Expr::Construct { type_name,
                                    type_id,
                                    ctor,
                                    args,
                                    pos });
    }

    if let Some(first) = descriptor.ctors.first()
       && !descriptor.ctors.iter().any(|c| c.args.len() == args.len())
    {
        return Err(ParseError::ArgumentCount { name: type_name,
                                               expected: first.args.len(),
                                               found: args.len(),
                                               pos });
    }
    let found: Vec<String> = types.iter().map(ToString::to_string).collect();
    Err(ParseError::TypeMismatch { expected: format!("a constructor of {type_name}"),
                                   found: format!("({})", found.join(", ")),
                                   pos })
}

/// Parses the argument list of a user function call and checks it against
/// the declared parameters.
fn parse_call(parser: &mut Parser<'_>, functor: Rc<Functor>, pos: Position) -> ParseResult<Expr> {
    let args = parse_arguments(parser)?;
    check_arity(functor.name(), functor.params().len(), args.len(), pos)?;
    for (param, arg) in functor.params().iter().zip(&args) {
        check_fits(param.ty, arg.ty(), arg.pos())?;
    }
    let ty = functor.ret().unwrap_or(Type::AUTO);

    Ok(Expr::Call { functor, args, ty, pos })
}
