/// Parser entry points and state.
///
/// Holds the `Parser` struct threaded through every parse function, the
/// `ParseResult` alias and the expression entry point.
pub mod core;

/// Binary operator parsing.
///
/// One function per precedence level, from the logical operators down to
/// exponentiation, plus the static typing of binary operations.
pub mod binary;

/// Unary operators and elements.
///
/// Handles prefix operators, literals, parenthesized expressions and the
/// resolution of names to builtins, constructors, variables and functions.
pub mod unary;

/// Method calls and `@` indexing.
pub mod member;

/// Type declarations and the static type rules shared by the parser.
pub mod types;

/// Utility functions for the parser.
///
/// Provides token expectations, list parsing and name checks reused across
/// the grammar.
pub mod utils;

/// Statement parsing.
///
/// Dispatches on the leading keyword and parses declarations, assignments,
/// `print`, `raise`, `import`, `include` and `return`.
pub mod statement;

/// `begin ... end` blocks with exception handlers.
pub mod block;

/// Conditionals and loops.
pub mod control;

/// Function declarations.
pub mod function;
