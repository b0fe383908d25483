use tracing::debug;

use crate::{AllocError, Block, Sweeper};


/// A [`Sweeper`] that refuses to hand out more than a fixed number of bytes
/// between sweeps, passing everything else through to another one.
///
/// Once the budget is spent, allocations fail with
/// [`AllocError::Exhausted`], which makes any parse needing them fail with
/// that reason.  A sweep restores the whole budget.  This bounds the memory a
/// single parse of untrusted input can take.
#[derive(Debug)]
pub struct BoundedSweeper<S> {
    inner: S,
    budget: usize,
    used: usize,
}

impl<S> BoundedSweeper<S>
    where S: Sweeper,
{
    /// Wrap `inner`, allowing `budget` bytes per sweep cycle.
    pub fn new(inner: S, budget: usize) -> Self {
        Self { inner, budget, used: 0 }
    }

    /// Bytes allowed per sweep cycle.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Bytes handed out since the last sweep.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes that can still be handed out before the next sweep.
    pub fn remaining(&self) -> usize {
        self.budget - self.used
    }

    /// The wrapped sweeper.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Sweeper for BoundedSweeper<S>
    where S: Sweeper,
{
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError> {
        if size > self.remaining() {
            debug!(requested = size, remaining = self.remaining(), "allocation budget exhausted");
            return Err(AllocError::Exhausted { requested: size, remaining: self.remaining() });
        }
        let block = self.inner.allocate(size)?;
        self.used += size;
        Ok(block)
    }

    fn sweep(&mut self) {
        self.used = 0;
        self.inner.sweep();
    }

    #[inline]
    fn bytes(&self, block: Block) -> Result<&[u8], AllocError> {
        self.inner.bytes(block)
    }

    #[inline]
    fn bytes_mut(&mut self, block: Block) -> Result<&mut [u8], AllocError> {
        self.inner.bytes_mut(block)
    }
}
