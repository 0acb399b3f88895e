//! Monotonic identifier allocation owned by a connection.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{ScmError, ScmResult};

/// Hands out strictly increasing identifiers that are never reused.
///
/// Each connection owns its own allocator so independent connections do not
/// share a counter.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Allocator whose first identifier is `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Allocator whose first identifier is `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Take the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::HandlesExhausted`] once `u32::MAX` has been handed out.
    pub fn allocate(&self) -> ScmResult<u32> {
        let mut current = self.next.load(Ordering::SeqCst);
        loop {
            if current == EXHAUSTED {
                return Err(ScmError::HandlesExhausted);
            }
            let next = current.checked_add(1).unwrap_or(EXHAUSTED);
            match self
                .next
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return Ok(current),
                Err(observed) => current = observed,
            }
        }
    }

    /// Identifier the next successful allocation would return.
    #[must_use]
    pub fn peek(&self) -> Option<u32> {
        match self.next.load(Ordering::SeqCst) {
            EXHAUSTED => None,
            next => Some(next),
        }
    }
}

// `u32::MAX` doubles as the exhaustion marker, so it is never handed out.
const EXHAUSTED: u32 = u32::MAX;
