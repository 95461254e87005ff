/// Statement execution and the top-level drivers.
///
/// Holds `execute`, block execution, the transactional top-level parse and
/// the `Executable` and `Session` drivers.
pub mod core;

/// Counted `for` loops.
pub mod for_loop;

/// `forall` loops over a collection variable.
pub mod forall;

/// `begin ... exception ... end` blocks.
pub mod exception;

/// User function calls.
pub mod function;
