use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::{AllocError, Block, Sweeper};


/// Region size used by [`Arena::default`].
pub const DEFAULT_REGION_SIZE: usize = 8192;

/// Largest usable region size, since block offsets are 32-bit.
const MAX_REGION_SIZE: usize = u32::MAX as usize;

/// Largest region number, since blocks record it in 32 bits.
const MAX_REGIONS: usize = u32::MAX as usize;

/// Source of the identities that let an arena recognize its own blocks.
static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);


/// One fixed-capacity bump region, linked to the region allocated before it.
struct Region {
    data: Box<[u8]>,
    cursor: usize,
    /// Number of the previous region in the chain.
    parent: Option<u32>,
}

impl Region {
    fn new(size: usize, parent: Option<u32>) -> Self {
        Self { data: vec![0; size].into_boxed_slice(), cursor: 0, parent }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }
}


/// A [`Sweeper`] that bump-allocates from a chain of fixed-size regions.
///
/// A request that does not fit in the newest region starts a new region; the
/// older regions stay alive, untouched, until the next [`sweep`], which
/// releases the whole chain at once and starts over with a single region.
/// Nothing is ever freed individually, so interior slack is only reclaimed by
/// sweeping.  This suits parse-then-discard use where everything produced for
/// one input dies together.
///
/// Every `String` and every `Array` is one block, and a block must fit in one
/// region.  An array element takes [`Output::ENCODED_LEN`] bytes, so with
/// [`DEFAULT_REGION_SIZE`] an array holds at most 390 elements: a [`many`] or
/// [`sequence`] that matches more fails with [`AllocError::TooLarge`].  Use a
/// larger region size for longer repetitions.
///
/// Regions are numbered in the order they are allocated and each links to its
/// parent, the one before it.  The chain is stored indexed by number, so
/// reading a block costs the same whichever region it lies in.
///
/// Each sweep starts a new epoch, and blocks record the epoch and the arena
/// they came from, so handles that outlived a sweep are reported as
/// [`AllocError::Stale`] instead of reading recycled bytes.
///
/// [`sweep`]: Sweeper::sweep
/// [`Output::ENCODED_LEN`]: crate::Output::ENCODED_LEN
/// [`many`]: crate::many
/// [`sequence`]: crate::sequence
pub struct Arena {
    id: u32,
    epoch: u32,
    region_size: usize,
    /// Region `n` is at index `n`; the head is the last.
    regions: Vec<Region>,
}

impl Arena {
    /// Make a new arena whose regions each have `region_size` usable bytes,
    /// with its first region already allocated.
    pub fn new(region_size: usize) -> Self {
        let mut arena = Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            region_size: region_size.min(MAX_REGION_SIZE),
            regions: Vec::new(),
        };
        arena.new_region();
        arena
    }

    /// Identity recorded in the blocks this hands out.
    #[inline]
    pub fn id(&self) -> u32 { self.id }

    /// Current sweep cycle.
    #[inline]
    pub fn epoch(&self) -> u32 { self.epoch }

    /// Usable bytes of each region.
    #[inline]
    pub fn region_size(&self) -> usize { self.region_size }

    /// How many regions are currently chained.
    #[inline]
    pub fn region_count(&self) -> usize { self.regions.len() }

    /// Bytes still free in the newest region.
    pub fn remaining(&self) -> usize {
        self.regions.last().map_or(0, Region::remaining)
    }

    /// Release every region and leave this unusable until the next
    /// [`sweep`](Sweeper::sweep).
    pub fn deinit(&mut self) {
        self.release();
        self.epoch = self.epoch.wrapping_add(1);
        debug!(arena = self.id, epoch = self.epoch, "arena deinitialized");
    }

    /// Give the generic capability view of this arena, for code that is
    /// written against any [`Sweeper`].
    #[inline]
    pub fn make_sweeper(&mut self) -> &mut dyn Sweeper {
        self
    }

    /// The regions from the head back to the first, by following the parent
    /// links.
    fn chain(&self) -> impl Iterator<Item = &Region> {
        let head = self.regions.last();
        std::iter::successors(head, move |region| {
            region.parent.and_then(|n| self.regions.get(n as usize))
        })
    }

    // Fits in `u32` because `new_region` refuses to go past `MAX_REGIONS`.
    #[allow(clippy::cast_possible_truncation)]
    fn head_number(&self) -> Option<u32> {
        self.regions.len().checked_sub(1).map(|n| n as u32)
    }

    fn new_region(&mut self) -> bool {
        if self.regions.len() > MAX_REGIONS {
            return false;
        }
        let parent = self.head_number();
        self.regions.push(Region::new(self.region_size, parent));
        debug!(arena = self.id, regions = self.regions.len(), size = self.region_size,
               "arena region allocated");
        true
    }

    fn release(&mut self) {
        self.regions = Vec::new();
    }

    fn region(&self, block: Block) -> Result<&Region, AllocError> {
        self.check(block)?;
        self.regions.get(block.region() as usize).ok_or(AllocError::OutOfBounds)
    }

    fn check(&self, block: Block) -> Result<(), AllocError> {
        if block.owner() != self.id {
            Err(AllocError::Foreign)
        } else if block.epoch() != self.epoch {
            Err(AllocError::Stale { block: block.epoch(), current: self.epoch })
        } else if self.regions.is_empty() {
            Err(AllocError::Deinitialized)
        } else {
            Ok(())
        }
    }

    fn span(block: Block, region: &Region) -> Result<core::ops::Range<usize>, AllocError> {
        let start = block.offset() as usize;
        let end = start + block.len();
        if end <= region.cursor {
            Ok(start .. end)
        } else {
            Err(AllocError::OutOfBounds)
        }
    }
}

/// Must implement this manually because the regions' bytes are not worth
/// printing.
impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used: Vec<usize> = self.chain().map(|region| region.cursor).collect();
        f.debug_struct("Arena")
         .field("id", &self.id)
         .field("epoch", &self.epoch)
         .field("region_size", &self.region_size)
         .field("used", &used)
         .finish()
    }
}

impl Default for Arena {
    /// An arena with [`DEFAULT_REGION_SIZE`] regions, whose arrays hold at
    /// most 390 elements.
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_REGION_SIZE)
    }
}

impl Sweeper for Arena {
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError> {
        if self.regions.is_empty() {
            return Err(AllocError::Deinitialized);
        }
        if size > self.region_size {
            return Err(AllocError::TooLarge { requested: size, capacity: self.region_size });
        }
        if size > self.remaining() && !self.new_region() {
            return Err(AllocError::Exhausted { requested: size, remaining: self.remaining() });
        }
        let region = self.head_number().ok_or(AllocError::Deinitialized)?;
        let head = self.regions.last_mut().ok_or(AllocError::Deinitialized)?;
        let offset = head.cursor;
        head.cursor += size;
        // Both fit in `u32` because the region size is capped at `u32::MAX`.
        #[allow(clippy::cast_possible_truncation)]
        let block = Block::new(self.id, self.epoch, region, offset as u32, size as u32);
        Ok(block)
    }

    fn sweep(&mut self) {
        self.release();
        self.epoch = self.epoch.wrapping_add(1);
        debug!(arena = self.id, epoch = self.epoch, "arena swept");
        let _ = self.new_region();
    }

    fn bytes(&self, block: Block) -> Result<&[u8], AllocError> {
        let region = self.region(block)?;
        let span = Self::span(block, region)?;
        Ok(&region.data[span])
    }

    fn bytes_mut(&mut self, block: Block) -> Result<&mut [u8], AllocError> {
        let span = Self::span(block, self.region(block)?)?;
        let region = self.regions.get_mut(block.region() as usize)
                                 .ok_or(AllocError::OutOfBounds)?;
        Ok(&mut region.data[span])
    }
}
