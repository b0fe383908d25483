use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::sync::Arc;

use tracing::debug;

use crate::{AllocError, Block, Sweeper};


/// Counts of what a [`CountingSweeper`] has been asked to do.
///
/// This is a shared handle: get one with [`CountingSweeper::stats`] before
/// handing the sweeper off (e.g. to [`set_allocator`](crate::set_allocator))
/// and read it whenever.
#[derive(Clone, Default, Debug)]
pub struct SweepStats(Arc<Counters>);

#[derive(Default, Debug)]
struct Counters {
    allocations: AtomicUsize,
    bytes: AtomicUsize,
    failures: AtomicUsize,
    sweeps: AtomicUsize,
}

impl SweepStats {
    /// Successful allocations since the start.
    pub fn allocations(&self) -> usize { self.0.allocations.load(Relaxed) }

    /// Bytes handed out since the start.
    pub fn bytes(&self) -> usize { self.0.bytes.load(Relaxed) }

    /// Refused allocations since the start.
    pub fn failures(&self) -> usize { self.0.failures.load(Relaxed) }

    /// Sweeps since the start.
    pub fn sweeps(&self) -> usize { self.0.sweeps.load(Relaxed) }
}


/// A [`Sweeper`] that passes everything through to another one while
/// counting allocations, allocated bytes and sweeps.
#[derive(Debug)]
pub struct CountingSweeper<S> {
    inner: S,
    stats: SweepStats,
}

impl<S> CountingSweeper<S>
    where S: Sweeper,
{
    /// Wrap `inner`, with all counts at zero.
    pub fn new(inner: S) -> Self {
        Self { inner, stats: SweepStats::default() }
    }

    /// A handle to the counts, which stays usable after `self` is moved.
    pub fn stats(&self) -> SweepStats {
        self.stats.clone()
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

impl<S> Sweeper for CountingSweeper<S>
    where S: Sweeper,
{
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError> {
        let counters = &self.stats.0;
        match self.inner.allocate(size) {
            Ok(block) => {
                let _ = counters.allocations.fetch_add(1, Relaxed);
                let _ = counters.bytes.fetch_add(size, Relaxed);
                Ok(block)
            }
            Err(e) => {
                let _ = counters.failures.fetch_add(1, Relaxed);
                Err(e)
            }
        }
    }

    fn sweep(&mut self) {
        let sweeps = self.stats.0.sweeps.fetch_add(1, Relaxed) + 1;
        debug!(sweeps, allocations = self.stats.allocations(), bytes = self.stats.bytes(),
               "counting sweeper swept");
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
