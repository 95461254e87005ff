/// The `Value` type and its payloads.
///
/// Defines the tagged runtime value, its kind-checked accessors, the deep
/// copy, swap and move operations, and the display format shared by `print`
/// and `str()`.
pub mod core;
/// Homogeneous arrays.
///
/// A `Collection` knows its element type so every insert is checked against a
/// single type.
pub mod collection;
/// Native plugin object handles.
///
/// Reference-counted wrappers whose last drop calls the owning module's
/// destroy callback.
pub mod complex;
/// Imaginary numbers and their arithmetic.
pub mod imaginary;
/// Fixed-shape rows.
pub mod tuple;
/// The `(major, minor, level)` type triple.
pub mod types;
