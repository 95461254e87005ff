use crate::{
    ast::{Expr, LiteralValue, Method},
    error::ParseError,
    interpreter::{
        lexer::{Lexeme, Position, Token},
        parser::{
            core::{ParseResult, Parser},
            types::{check_fits, fits, require_kind},
            unary::parse_atom,
            utils::{check_arity, check_unguarded, mismatch, next, parse_arguments, unexpected},
        },
        value::types::{Major, Type},
    },
};

/// Parses the `.method(args)` and `@index` suffixes of an element.
///
/// Suffixes bind tighter than every operator and apply left to right, so
/// `t@1.count()` counts the element `t@1`. The index of `@` is a single
/// element without its own chain.
///
/// Grammar: `chain := element ("." NAME "(" args ")" | "@" element)*`
///
/// # Parameters
/// - `parser`: Parser positioned right after the element.
/// - `base`: The already parsed element.
///
/// # Returns
/// The element wrapped in `Expr::Method` and `Expr::Index` nodes.
pub fn parse_member_chain(parser: &mut Parser<'_>, mut base: Expr) -> ParseResult<Expr> {
    loop {
        match parser.tokens.peek_token() {
            Some(Token::Dot) => {
                next(parser)?;
                let (name, pos) = parse_method_name(parser)?;
                let args = parse_arguments(parser)?;
                base = resolve_method(parser, base, &name, args, pos)?;
            },
            Some(Token::At) => {
                let pos = next(parser)?.pos;
                let index = parse_atom(parser)?;
                base = make_index(parser, base, index, pos)?;
            },
            _ => return Ok(base),
        }
    }
}

/// Method names may be keywords, as in `s.find("x")` or `t.delete(0)`.
fn parse_method_name(parser: &mut Parser<'_>) -> ParseResult<(String, Position)> {
    let lexeme = next(parser)?;
    match lexeme.token {
        Token::Identifier(name) => Ok((name, lexeme.pos)),
        Token::Keyword(k) => Ok((k.as_str().to_string(), lexeme.pos)),
        token => Err(unexpected(parser,
                                Lexeme { token,
                                         pos: lexeme.pos },
                                "a method name")),
    }
}

/// Builds a typed `@` node.
///
/// Collections give their element type, strings a one-character string,
/// bytes an integer and rows the type of the field when the index is a
/// literal.
fn make_index(parser: &Parser<'_>, base: Expr, index: Expr, pos: Position) -> ParseResult<Expr> {
    require_kind(index.ty(), &[Major::Integer], "integer", index.pos())?;

    let base_ty = base.ty();
    let ty = if let Some(elem) = base_ty.element() {
        elem
    } else {
        match base_ty.major {
            Major::Literal => Type::LITERAL,
            Major::Tabchar => Type::INTEGER,
            Major::NoType => Type::AUTO,
            Major::RowType => row_field_type(parser, base_ty, &index),
            _ => return Err(mismatch("a collection, row, string or bytes", base_ty, pos)),
        }
    };

    Ok(Expr::Index { base: Box::new(base),
                     index: Box::new(index),
                     ty,
                     pos })
}

fn row_field_type(parser: &Parser<'_>, row: Type, index: &Expr) -> Type {
    let Expr::Literal { value: LiteralValue::Integer(i),
                        .. } = index
    else {
        return Type::AUTO;
    };
    parser.ctx
          .shared()
          .row_fields(row.minor)
          .and_then(|fields| {
              let position = usize::try_from(*i).ok()?.checked_sub(1)?;
              fields.get(position).copied()
          })
          .unwrap_or(Type::AUTO)
}

/// Resolves `receiver.name(args)` against the receiver's static type.
///
/// # Errors
/// - `UnknownMethod` if the receiver type has no such method.
/// - `ArgumentCount` and `TypeMismatch` for bad arguments.
/// - `ForbiddenMutation` for a mutating call on a collection iterated by an
///   enclosing `forall`.
fn resolve_method(parser: &Parser<'_>,
                  receiver: Expr,
                  name: &str,
                  args: Vec<Expr>,
                  pos: Position)
                  -> ParseResult<Expr> {
    let receiver_ty = receiver.ty();
    let arg_types: Vec<Type> = args.iter().map(Expr::ty).collect();

    let (method, ty) = if receiver_ty.major == Major::Complex && receiver_ty.level == 0 {
        native_method(parser, receiver_ty, name, &arg_types, pos)?
    } else {
        let method = builtin_method(name).ok_or_else(|| unknown(parser, name, receiver_ty, pos))?;
        let ty = builtin_method_type(parser, &method, receiver_ty, &arg_types, pos)?;
        (method, ty)
    };

    if method.is_mutating()
       && let Some(root) = receiver.root_variable()
    {
        check_unguarded(parser, root, name, pos)?;
    }

    Ok(Expr::Method { receiver: Box::new(receiver),
                      method,
                      args,
                      ty,
                      pos })
}

fn builtin_method(name: &str) -> Option<Method> {
    let method = match name {
        "count" => Method::Count,
        "concat" => Method::Concat,
        "insert" => Method::Insert,
        "delete" => Method::Delete,
        "put" => Method::Put,
        "upper" => Method::Upper,
        "lower" => Method::Lower,
        "substr" => Method::Substr,
        "find" => Method::Find,
        "re" => Method::Re,
        "im" => Method::Im,
        _ => return None,
    };
    Some(method)
}

fn unknown(parser: &Parser<'_>, name: &str, receiver: Type, pos: Position) -> ParseError {
    ParseError::UnknownMethod { name: name.to_string(),
                                receiver: parser.ctx.type_name(receiver),
                                pos }
}

/// Checks the arguments of a builtin method and returns its result type.
///
/// An `auto` receiver accepts every builtin method; the receiver is checked
/// when the call runs.
fn builtin_method_type(parser: &Parser<'_>,
                       method: &Method,
                       receiver: Type,
                       args: &[Type],
                       pos: Position)
                       -> ParseResult<Type> {
    let name = method.name();
    let integer = |ty: Type| require_kind(ty, &[Major::Integer], "integer", pos);

    let supported = if receiver == Type::AUTO {
        true
    } else if let Some(elem) = receiver.element() {
        match method {
            Method::Count => true,
            Method::Concat => {
                check_arity(name, 1, args.len(), pos)?;
                if !fits(elem, args[0]) && !fits(receiver, args[0]) {
                    return Err(mismatch(elem, args[0], pos));
                }
                true
            },
            Method::Insert | Method::Put => {
                check_arity(name, 2, args.len(), pos)?;
                integer(args[0])?;
                check_fits(elem, args[1], pos)?;
                true
            },
            Method::Delete => true,
            _ => false,
        }
    } else {
        match receiver.major {
            Major::Literal => {
                matches!(method, Method::Count | Method::Upper | Method::Lower | Method::Substr | Method::Find)
            },
            Major::Tabchar => matches!(method, Method::Count),
            Major::RowType => matches!(method, Method::Count | Method::Put),
            Major::Imaginary => matches!(method, Method::Re | Method::Im),
            _ => false,
        }
    };
    if !supported {
        return Err(unknown(parser, name, receiver, pos));
    }

    let expected = match method {
        Method::Count | Method::Upper | Method::Lower | Method::Re | Method::Im => 0,
        Method::Concat | Method::Delete | Method::Find => 1,
        Method::Insert | Method::Put | Method::Substr => 2,
        Method::Native { .. } => args.len(),
    };
    check_arity(name, expected, args.len(), pos)?;

    match method {
        Method::Delete => integer(args[0])?,
        Method::Put if receiver.major == Major::RowType && receiver.level == 0 => integer(args[0])?,
        Method::Substr => {
            integer(args[0])?;
            integer(args[1])?;
        },
        Method::Find => require_kind(args[0], &[Major::Literal], "string", pos)?,
        _ => {},
    }

    Ok(match method {
        Method::Upper | Method::Lower | Method::Substr => Type::LITERAL,
        Method::Re | Method::Im => Type::NUMERIC,
        _ => Type::INTEGER,
    })
}

/// Resolves a method of an imported object type through its descriptor.
fn native_method(parser: &Parser<'_>,
                 receiver: Type,
                 name: &str,
                 args: &[Type],
                 pos: Position)
                 -> ParseResult<(Method, Type)> {
    let plugins = parser.ctx.plugins();
    let registry = plugins.borrow();
    let decl = registry.by_id(receiver.minor)
                       .and_then(|loaded| loaded.module.descriptor().method(name).cloned())
                       .ok_or_else(|| unknown(parser, name, receiver, pos))?;

    check_arity(name, decl.args.len(), args.len(), pos)?;
    for (arg_decl, ty) in decl.args.iter().zip(args) {
        if !arg_decl.admits(*ty, receiver) {
            let expected = arg_decl.resolve(receiver).unwrap_or(Type::AUTO);
            return Err(ParseError::TypeMismatch { expected: parser.ctx.type_name(expected),
                                                  found: parser.ctx.type_name(*ty),
                                                  pos });
        }
    }

    let ty = decl.ret
                 .and_then(|ret| ret.resolve(receiver))
                 .unwrap_or(Type::AUTO);
    Ok((Method::Native { name: name.to_string(),
                         id: decl.id,
                         returns: decl.ret.is_some() },
        ty))
}
