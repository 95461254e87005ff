use std::fmt::{Display, Formatter, Result, Write};

use crate::{
    ast::{Expr, LiteralValue, Statement},
    interpreter::value::core::{format_numeric, quote_literal},
};

const INDENT: &str = "    ";

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(n) => write!(f, "{}", format_numeric(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Literal(s) => write!(f, "{}", quote_literal(s)),
            Self::Null => write!(f, "null"),
        }
    }
}

fn write_args(f: &mut Formatter<'_>, args: &[Expr]) -> Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ")")
}

/// Expressions print as re-parseable source. Parentheses appear exactly
/// where the source had them.
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Literal { value, .. } => write!(f, "{value}"),
            Self::Variable { name, .. } => write!(f, "{name}"),
            Self::Unary { op, operand, .. } => write!(f, "{op}{operand}"),
            Self::Binary { op, left, right, .. } => write!(f, "{left} {op} {right}"),
            Self::Group { inner, .. } => write!(f, "({inner})"),
            Self::Builtin { func, args, .. } => {
                write!(f, "{}", func.name())?;
                write_args(f, args)
            },
            Self::Construct { type_name, args, .. } => {
                write!(f, "{type_name}")?;
                write_args(f, args)
            },
            Self::Call { functor, args, .. } => {
                write!(f, "{}", functor.name())?;
                write_args(f, args)
            },
            Self::Method { receiver,
                           method,
                           args,
                           .. } => {
                write!(f, "{receiver}.{}", method.name())?;
                write_args(f, args)
            },
            Self::Index { base, index, .. } => write!(f, "{base}@{index}"),
        }
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn write_body(out: &mut String, body: &[Statement], depth: usize) -> Result {
    for statement in body {
        statement.write_source(out, depth)?;
    }
    Ok(())
}

impl Statement {
    /// Appends the source of this statement to `out`, one line per simple
    /// statement, indented by `depth` levels.
    pub fn write_source(&self, out: &mut String, depth: usize) -> Result {
        let pad = INDENT.repeat(depth);
        match self {
            Self::Nop { .. } => writeln!(out, "{pad};"),
            Self::Trace { on, .. } => writeln!(out, "{pad}trace {};", if *on { "on" } else { "off" }),
            Self::Let { name,
                        declared,
                        value,
                        keyword,
                        .. } => {
                write!(out, "{pad}")?;
                if *keyword {
                    write!(out, "let {name}")?;
                    if let Some(spec) = declared {
                        write!(out, " {}", spec.spelling)?;
                    }
                } else {
                    write!(out, "{name}")?;
                }
                if let Some(value) = value {
                    write!(out, " = {value}")?;
                }
                writeln!(out, ";")
            },
            Self::Import { module, .. } => writeln!(out, "{pad}import {module};"),
            Self::Function(decl) => {
                let params: Vec<String> = decl.params
                                              .iter()
                                              .map(|(name, spec)| format!("{name} {}", spec.spelling))
                                              .collect();
                write!(out, "{pad}function {}({})", decl.functor.name(), params.join(", "))?;
                if let Some(ret) = &decl.ret {
                    write!(out, " return {}", ret.spelling)?;
                }
                writeln!(out, " is")?;
                write_body(out, &decl.functor.body().unwrap_or_default(), depth)
            },
            Self::If { branches, otherwise, .. } => {
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elsif" };
                    writeln!(out, "{pad}{keyword} {} then", branch.condition)?;
                    write_body(out, &branch.body, depth + 1)?;
                }
                if let Some(otherwise) = otherwise {
                    writeln!(out, "{pad}else")?;
                    write_body(out, otherwise, depth + 1)?;
                }
                writeln!(out, "{pad}end if;")
            },
            Self::While { condition, body, .. } => {
                writeln!(out, "{pad}while {condition} loop")?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{pad}end loop;")
            },
            Self::For(for_loop) => {
                write!(out, "{pad}for {} in {} to {}", for_loop.iterator, for_loop.from, for_loop.to)?;
                if let Some(step) = &for_loop.step {
                    write!(out, " step {step}")?;
                }
                if for_loop.descending {
                    write!(out, " desc")?;
                }
                writeln!(out, " loop")?;
                write_body(out, &for_loop.body, depth + 1)?;
                writeln!(out, "{pad}end loop;")
            },
            Self::Forall { iterator,
                           collection,
                           body,
                           .. } => {
                writeln!(out, "{pad}forall {iterator} in {collection} loop")?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{pad}end loop;")
            },
            Self::Break { .. } => writeln!(out, "{pad}break;"),
            Self::Continue { .. } => writeln!(out, "{pad}continue;"),
            Self::Return { value: Some(value), .. } => writeln!(out, "{pad}return {value};"),
            Self::Return { value: None, .. } => writeln!(out, "{pad}return;"),
            Self::Block { body, handlers, .. } => {
                writeln!(out, "{pad}begin")?;
                write_body(out, body, depth + 1)?;
                if !handlers.is_empty() {
                    writeln!(out, "{pad}exception")?;
                    for handler in handlers {
                        let name = handler.name.as_deref().unwrap_or("others");
                        writeln!(out, "{pad}{INDENT}when {name} then")?;
                        write_body(out, &handler.body, depth + 2)?;
                    }
                }
                writeln!(out, "{pad}end;")
            },
            Self::Print { args, newline, .. } => {
                let keyword = if *newline { "print" } else { "put" };
                writeln!(out, "{pad}{keyword} {};", join(args))
            },
            Self::Raise { name, .. } => writeln!(out, "{pad}raise {name};"),
            Self::Include { path, .. } => writeln!(out, "{pad}include {};", quote_literal(path)),
            Self::Expression { expr, .. } => writeln!(out, "{pad}{expr};"),
        }
    }

    /// The first source line of the statement, without indentation.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if self.write_source(&mut out, 0).is_err() {
            return String::new();
        }
        out.lines().next().unwrap_or_default().to_string()
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut out = String::new();
        self.write_source(&mut out, 0)?;
        write!(f, "{}", out.trim_end())
    }
}
