/// The runtime context: variable storage, control and exec stacks,
/// condition flags and the state shared with function environments.
///
/// # Responsibilities
/// - Owns the symbol table and the storage pool of a script or a call.
/// - Tracks active loop and exception scopes and block nesting.
/// - Shares functions, plugins, row shapes and I/O with every derived
///   context.
pub mod context;
/// The evaluator computes the value of expression trees.
///
/// # Responsibilities
/// - Evaluates literals, variables, operators, builtins, calls, methods and
///   element access.
/// - Reports runtime errors such as division by zero or type mismatches.
pub mod evaluator;
/// The executor runs statement trees against a context.
///
/// # Responsibilities
/// - Executes statements, blocks, loops, exception blocks and user calls.
/// - Drives whole programs (`Executable`) and statement-at-a-time input
///   (`Session`).
pub mod executor;
/// The lexer defines the tokens of the language.
///
/// # Responsibilities
/// - Recognizes literals, words, keywords and operators with `logos`.
/// - Lower-cases words and flags malformed literals as invalid tokens.
pub mod lexer;
/// The parser builds expression and statement trees from tokens.
///
/// # Responsibilities
/// - Implements the precedence ladder and the statement grammar.
/// - Types every expression node and registers new names in the context.
pub mod parser;
/// The native object module contract and the module registry.
pub mod plugin;
/// The pull-based token stream with push-back and an include stack.
pub mod tokenizer;
/// The value module defines the runtime data types for evaluation.
///
/// # Responsibilities
/// - Defines `Type`, `Value` and the collection, tuple, imaginary and
///   native object payloads.
/// - Implements typed accessors, widening and display.
pub mod value;
