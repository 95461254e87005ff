/// Remaining stack below which a guarded call switches to a fresh segment.
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated by a guarded call.
pub const SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Runs `f`, first moving to a new stack segment when less than
/// [`RED_ZONE`] bytes remain.
///
/// Recursive descent through deeply nested source and recursive script calls
/// go through here, so the depth they reach is bounded by the parser's
/// nesting limit and the recursion limit rather than by the host thread's
/// stack size.
///
/// # Example
/// ```
/// use plume::util::stack::guarded;
///
/// fn depth(n: u32) -> u32 {
///     if n == 0 { 0 } else { guarded(|| depth(n - 1)) + 1 }
/// }
///
/// assert_eq!(depth(10_000), 10_000);
/// ```
#[inline]
pub fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}
