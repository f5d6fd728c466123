//! Host stack growth for the recursive walkers.
//!
//! Reader, analyzer, evaluator and the value printers all recurse on
//! program-controlled depth. Each recursive step goes through [`guarded`],
//! which switches to a fresh heap-allocated segment once the current one is
//! nearly used up, so depth is bounded by the configured limits and never by
//! the caller's thread stack.

/// Remaining stack below which a new segment is allocated
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each new segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[inline]
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: usize) -> usize {
        if n == 0 { 0 } else { guarded(|| 1 + depth(n - 1)) }
    }

    #[test]
    fn test_recursion_past_thread_stack() {
        let n = 200_000;
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || depth(n))
            .unwrap();
        assert_eq!(handle.join().unwrap(), n);
    }
}
