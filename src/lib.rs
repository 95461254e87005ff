//! # plume
//!
//! plume is an interpreter for a small imperative scripting language written
//! in Rust. It tokenizes source text, parses it into typed expression and
//! statement trees and executes them against a typed value model with
//! variables, loops, exception blocks, user functions and native object
//! plugins.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    error::Error,
    interpreter::{context::Context, executor::core::Session, tokenizer::TokenStream},
};

/// Defines the structure of parsed code.
///
/// This module declares the `Expr` and `Statement` enums and related types
/// that represent source code as a tree. The tree is built by the parser,
/// run by the executor and written back as source by `unparse`.
///
/// # Responsibilities
/// - Defines expression and statement types for all language constructs.
/// - Attaches source positions and static types to nodes.
/// - Prints trees as re-parseable source.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines the errors raised while parsing (`ParseError`) and
/// running (`RuntimeError`) code, and the `Error` that unifies both for
/// drivers. Every error carries its source position.
///
/// # Responsibilities
/// - Defines error enums for all failure modes.
/// - Gives runtime errors the names exception handlers match.
/// - Implements `Display` and `std::error::Error`.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together tokenizing, parsing, evaluation, execution,
/// the value model and native plugins.
///
/// # Responsibilities
/// - Coordinates all core components.
/// - Provides entry points for parsing and running programs.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// Interpreter configuration: include trust and resolution, nesting limits.
pub mod options;
/// General utilities for safe numeric conversion and index checks.
///
/// # Responsibilities
/// - Safely convert between `i64`, `usize` and `f64` without silent data
///   loss.
/// - Check script indices against container sizes.
pub mod util;

/// Parses and runs a program statement by statement.
///
/// Each statement runs as soon as it is parsed, so a program may use a type
/// imported or a function declared by an earlier statement. Execution stops
/// at the first error or at a top-level `return`.
///
/// # Errors
/// The first parse or runtime error no handler caught.
///
/// # Examples
/// ```
/// use plume::{interpreter::context::Context, run_source};
///
/// let mut context = Context::default();
/// assert!(run_source(&mut context, "let total = 2 + 2;").is_ok());
///
/// // `y` is not defined.
/// assert!(run_source(&mut context, "let z = y + 1;").is_err());
/// ```
pub fn run_source(context: &mut Context, source: &str) -> Result<(), Error> {
    Session::new(TokenStream::from_source(source), false).run(context)
}
