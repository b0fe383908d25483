//! The memory capability that the parsing engine depends on, and the handles
//! to the memory it hands out.

use crate::AllocError;


/// Implementations provided for ready use.
pub mod premade
{
    mod arena;
    pub use arena::{Arena, DEFAULT_REGION_SIZE};
}


/// A span of bytes handed out by a [`Sweeper`].
///
/// This is a plain handle, not a borrow, so it can be stored inside other
/// allocations and outlive the call that produced it.  Access goes back
/// through the owning sweeper, which checks the handle against its current
/// state: a block from before a [`sweep`](Sweeper::sweep) or from some other
/// sweeper is refused instead of aliasing reused memory.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Block {
    owner: u32,
    epoch: u32,
    region: u32,
    offset: u32,
    len: u32,
}

impl Block {
    /// Size of the fixed little-endian encoding of a block.
    pub const ENCODED_LEN: usize = 20;

    /// Make a handle.  Sweeper implementations use this to describe where
    /// they placed an allocation; the meaning of the fields beyond `len` is
    /// theirs to define.
    #[inline]
    pub const fn new(owner: u32, epoch: u32, region: u32, offset: u32, len: u32) -> Self {
        Self { owner, epoch, region, offset, len }
    }

    /// Identity of the sweeper that handed this out.
    #[inline]
    pub const fn owner(&self) -> u32 { self.owner }

    /// Sweep cycle this was handed out in.
    #[inline]
    pub const fn epoch(&self) -> u32 { self.epoch }

    /// Which region of the owner holds the bytes.
    #[inline]
    pub const fn region(&self) -> u32 { self.region }

    /// Where in the region the bytes start.
    #[inline]
    pub const fn offset(&self) -> u32 { self.offset }

    /// Number of bytes.
    #[inline]
    pub const fn len(&self) -> usize { self.len as usize }

    /// Whether this spans no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    pub(crate) fn encode(&self, dst: &mut [u8]) {
        let fields = [self.owner, self.epoch, self.region, self.offset, self.len];
        for (chunk, field) in dst[.. Self::ENCODED_LEN].chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
    }

    pub(crate) fn decode(src: &[u8]) -> Result<Self, AllocError> {
        let src = src.get(.. Self::ENCODED_LEN).ok_or(AllocError::Corrupt)?;
        let mut fields = [0_u32; 5];
        for (field, chunk) in fields.iter_mut().zip(src.chunks_exact(4)) {
            let mut word = [0_u8; 4];
            word.copy_from_slice(chunk);
            *field = u32::from_le_bytes(word);
        }
        let [owner, epoch, region, offset, len] = fields;
        Ok(Self { owner, epoch, region, offset, len })
    }
}


/// The capability of allocating memory and of releasing everything allocated
/// so far in one go.
///
/// This is the only memory interface the parsing engine uses, so any
/// allocator that can satisfy it (an [`Arena`](premade::Arena), an
/// instrumented or bounds-checked wrapper, ...) can be substituted without
/// changing parsers.
pub trait Sweeper {
    /// Hand out `size` fresh bytes.  An error is returned if the request
    /// cannot be satisfied; nothing is partially allocated in that case.
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError>;

    /// Release everything handed out so far.  Every earlier [`Block`] is
    /// invalid afterwards.
    fn sweep(&mut self);

    /// Read access to the bytes of a block that this sweeper handed out.
    fn bytes(&self, block: Block) -> Result<&[u8], AllocError>;

    /// Write access to the bytes of a block that this sweeper handed out.
    fn bytes_mut(&mut self, block: Block) -> Result<&mut [u8], AllocError>;

    /// Allocate a copy of `text`.
    fn duplicate(&mut self, text: &[u8]) -> Result<Block, AllocError> {
        let block = self.allocate(text.len())?;
        self.bytes_mut(block)?.copy_from_slice(text);
        Ok(block)
    }

    /// Allocate a copy of at most the first `len` bytes of `text`.
    fn duplicate_prefix(&mut self, text: &[u8], len: usize) -> Result<Block, AllocError> {
        self.duplicate(&text[.. len.min(text.len())])
    }
}

impl<S> Sweeper for &mut S
    where S: Sweeper + ?Sized,
{
    #[inline]
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError> {
        (**self).allocate(size)
    }

    #[inline]
    fn sweep(&mut self) {
        (**self).sweep();
    }

    #[inline]
    fn bytes(&self, block: Block) -> Result<&[u8], AllocError> {
        (**self).bytes(block)
    }

    #[inline]
    fn bytes_mut(&mut self, block: Block) -> Result<&mut [u8], AllocError> {
        (**self).bytes_mut(block)
    }
}

impl<S> Sweeper for Box<S>
    where S: Sweeper + ?Sized,
{
    #[inline]
    fn allocate(&mut self, size: usize) -> Result<Block, AllocError> {
        (**self).allocate(size)
    }

    #[inline]
    fn sweep(&mut self) {
        (**self).sweep();
    }

    #[inline]
    fn bytes(&self, block: Block) -> Result<&[u8], AllocError> {
        (**self).bytes(block)
    }

    #[inline]
    fn bytes_mut(&mut self, block: Block) -> Result<&mut [u8], AllocError> {
        (**self).bytes_mut(block)
    }
}
