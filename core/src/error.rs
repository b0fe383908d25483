//! Errors that might be returned by allocation and by parsing.

use thiserror::Error;


/// The possible errors that might be returned by a [`Sweeper`], or by anything
/// that reads memory through one.
///
/// [`Sweeper`]: crate::Sweeper
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum AllocError {
    /// The request can never fit, not even in a fresh, empty region.
    #[error("allocation of {requested} bytes exceeds the region capacity of {capacity} bytes")]
    TooLarge {
        /// Bytes asked for.
        requested: usize,
        /// Usable bytes of one region.
        capacity: usize,
    },
    /// A budget-limited sweeper has no more room until its next sweep.
    #[error("allocation of {requested} bytes exceeds the remaining budget of {remaining} bytes")]
    Exhausted {
        /// Bytes asked for.
        requested: usize,
        /// Bytes left in the budget.
        remaining: usize,
    },
    /// The block was handed out before the most recent sweep.
    #[error("block from epoch {block} was invalidated by a sweep (current epoch {current})")]
    Stale {
        /// Epoch recorded in the block.
        block: u32,
        /// Epoch of the sweeper now.
        current: u32,
    },
    /// The block was handed out by a different sweeper.
    #[error("block belongs to a different sweeper")]
    Foreign,
    /// The block does not lie within any live region.
    #[error("block does not lie within its region")]
    OutOfBounds,
    /// Bytes read back as an encoded `Output` are not a valid encoding.
    #[error("corrupt output encoding")]
    Corrupt,
    /// The sweeper was deinitialized and has no regions.
    #[error("sweeper has been deinitialized")]
    Deinitialized,
    /// No sweeper is available to the caller: none is selected, or the
    /// selected one is already in use further up the call stack.
    #[error("no sweeper is available")]
    Unavailable,
}


/// Why a parse failed.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum Reason {
    /// The input did not match: a byte or string mismatch, a charset miss,
    /// a failed end-of-input expectation, or a choice with no matching
    /// alternative.
    #[error("unexpected token")]
    UnexpectedToken,
    /// The graph reached a node with no operation to perform.
    #[error("unknown operation")]
    UnknownOperation,
    /// The sweeper could not provide or read memory.
    #[error(transparent)]
    FailedAlloc(#[from] AllocError),
}


/// A failed parse: the position it was reported at and the reason.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
#[error("{reason} at byte {pos}")]
pub struct Failure {
    /// Byte offset into the input.
    pub pos: usize,
    /// What went wrong.
    pub reason: Reason,
}

impl Failure {
    /// Make a failure for the given position and reason.
    #[inline]
    pub fn new(pos: usize, reason: impl Into<Reason>) -> Self {
        Self { pos, reason: reason.into() }
    }

    /// A plain mismatch at `pos`.
    #[inline]
    pub fn unexpected(pos: usize) -> Self {
        Self::new(pos, Reason::UnexpectedToken)
    }

    /// Whether an enclosing `choice` or `optional` may try something else.
    /// Only mismatches are; allocation failures and unknown operations always
    /// propagate to the caller of `parse`.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.reason == Reason::UnexpectedToken
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable() {
        assert!(Failure::unexpected(3).is_recoverable());
        assert!(!Failure::new(3, Reason::UnknownOperation).is_recoverable());
        assert!(!Failure::new(3, AllocError::Foreign).is_recoverable());
    }

    #[test]
    fn from_alloc() {
        let f = Failure::new(7, AllocError::TooLarge { requested: 9, capacity: 8 });
        assert_eq!(f.reason,
                   Reason::FailedAlloc(AllocError::TooLarge { requested: 9, capacity: 8 }));
        assert_eq!(f.pos, 7);
    }

    #[test]
    fn display() {
        assert_eq!(Failure::unexpected(2).to_string(), "unexpected token at byte 2");
        assert_eq!(Failure::new(0, AllocError::Foreign).to_string(),
                   "block belongs to a different sweeper at byte 0");
    }
}
