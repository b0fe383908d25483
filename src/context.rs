//! A per-thread "active sweeper", so that allocation and parsing can be done
//! without passing a sweeper around.
//!
//! Each thread has a default [`Arena`], created by
//! [`init_default_allocator`], and may select some other sweeper in its place
//! with [`set_allocator`] and go back with [`set_default_allocator`].  The
//! functions of this module operate on whichever is selected.
//!
//! Since the selection is per thread, parses running on different threads
//! never share an allocator.  The selected sweeper is exclusively borrowed for
//! the duration of each operation, so using this module from inside an
//! observer or transform that runs under [`parse`] fails with
//! [`AllocError::Unavailable`] instead of aliasing it; such functions should
//! use the sweeper they are given.

use std::cell::RefCell;

use tracing::debug;

use crate::{
    eval, AllocError, Arena, Block, Failure, Output, ParseResult, Parser, Sweeper, Value,
    DEFAULT_REGION_SIZE,
};


thread_local! {
    static CONTEXT: RefCell<Context> = RefCell::new(Context::default());
}

#[derive(Default)]
struct Context {
    default: Option<Arena>,
    custom: Option<Box<dyn Sweeper>>,
}

impl Context {
    fn active(&mut self) -> Option<&mut dyn Sweeper> {
        match (&mut self.custom, &mut self.default) {
            (Some(custom), _) => Some(&mut **custom),
            (None, Some(arena)) => Some(arena),
            (None, None) => None,
        }
    }
}

fn with_context<R>(f: impl FnOnce(&mut Context) -> R) -> Result<R, AllocError> {
    CONTEXT.try_with(|context| {
        let mut context = context.try_borrow_mut().map_err(|_| AllocError::Unavailable)?;
        Ok(f(&mut context))
    })
    .map_err(|_| AllocError::Unavailable)?
}


/// Create this thread's default arena, with [`DEFAULT_REGION_SIZE`] regions,
/// and select it.
///
/// Any previous default arena is dropped, and so is any sweeper that was
/// selected with [`set_allocator`]; use [`set_default_allocator`] first to get
/// that back.
pub fn init_default_allocator() -> Result<(), AllocError> {
    init_default_allocator_with(DEFAULT_REGION_SIZE)
}

/// Like [`init_default_allocator`] but with regions of `region_size` bytes.
pub fn init_default_allocator_with(region_size: usize) -> Result<(), AllocError> {
    with_context(|context| {
        let arena = Arena::new(region_size);
        debug!(arena = arena.id(), region_size, "default allocator initialized");
        context.default = Some(arena);
        context.custom = None;
    })
}

/// Release all the memory of this thread's default arena.  It cannot allocate
/// again until it is swept.
pub fn deinit_default_allocator() -> Result<(), AllocError> {
    with_context(|context| {
        if let Some(arena) = &mut context.default {
            arena.deinit();
        }
    })
}

/// Select this thread's default arena.  Returns the sweeper that was selected
/// instead of it, if any, so it can be selected again later.
pub fn set_default_allocator() -> Result<Option<Box<dyn Sweeper>>, AllocError> {
    with_context(|context| {
        debug!(displaced = context.custom.is_some(), "default allocator selected");
        context.custom.take()
    })
}

/// Select `sweeper` for this thread, in place of the default arena or of the
/// sweeper that was selected before, which is returned.
pub fn set_allocator(sweeper: Box<dyn Sweeper>) -> Result<Option<Box<dyn Sweeper>>, AllocError> {
    with_context(|context| {
        debug!(displaced = context.custom.is_some(), "custom allocator selected");
        context.custom.replace(sweeper)
    })
}

/// Call `f` with the selected sweeper.
///
/// Fails with [`AllocError::Unavailable`] if nothing was selected (no default
/// arena was initialized) or if the selected sweeper is already in use further
/// up this thread's call stack.
pub fn with_allocator<R>(f: impl FnOnce(&mut dyn Sweeper) -> R) -> Result<R, AllocError> {
    with_context(|context| context.active().map(f).ok_or(AllocError::Unavailable))?
}

/// Allocate `size` bytes from the selected sweeper.
pub fn alloc(size: usize) -> Result<Block, AllocError> {
    with_allocator(|sweeper| sweeper.allocate(size))?
}

/// Sweep the selected sweeper.  Every block and output allocated from it
/// before is invalid afterwards.
pub fn sweep() -> Result<(), AllocError> {
    with_allocator(|sweeper| sweeper.sweep())
}

/// Allocate a copy of `text` from the selected sweeper.
pub fn duplicate_string(text: impl AsRef<[u8]>) -> Result<Block, AllocError> {
    with_allocator(|sweeper| sweeper.duplicate(text.as_ref()))?
}

/// Allocate a copy of at most the first `len` bytes of `text` from the
/// selected sweeper.
pub fn duplicate_string_n(text: impl AsRef<[u8]>, len: usize) -> Result<Block, AllocError> {
    with_allocator(|sweeper| sweeper.duplicate_prefix(text.as_ref(), len))?
}

/// Run `parser` against `input`, allocating from the selected sweeper.
///
/// See [`eval::parse`] for the variant that takes the sweeper explicitly.  If
/// no sweeper is available, the failure is reported at position 0.
pub fn parse<'i, I>(parser: &Parser, input: &'i I) -> ParseResult<'i>
    where I: AsRef<[u8]> + ?Sized,
{
    match with_allocator(|sweeper| eval::parse(parser, input, sweeper)) {
        Ok(result) => result,
        Err(e) => Err(Failure::new(0, e)),
    }
}

/// A copy of the bytes of a block allocated from the selected sweeper.
pub fn bytes(block: Block) -> Result<Vec<u8>, AllocError> {
    with_allocator(|sweeper| sweeper.bytes(block).map(<[u8]>::to_vec))?
}

/// An owned copy of an output produced with the selected sweeper.
pub fn value(output: Output) -> Result<Value, AllocError> {
    with_allocator(|sweeper| output.to_value(sweeper))?
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{string, tap};

    #[test]
    fn uninitialized() {
        assert_eq!(alloc(1), Err(AllocError::Unavailable));
        assert_eq!(parse(&string("a"), "a"), Err(Failure::new(0, AllocError::Unavailable)));
    }

    #[test]
    fn reentrant_use_refused() {
        init_default_allocator_with(128).unwrap();
        let p = tap(string("a"), |_, _| {
            assert_eq!(alloc(1), Err(AllocError::Unavailable));
            Ok(())
        });
        assert!(parse(&p, "a").is_ok());
        assert!(alloc(1).is_ok());
    }

    #[test]
    fn threads_are_separate() {
        init_default_allocator().unwrap();
        let block = duplicate_string("here").unwrap();
        std::thread::spawn(move || {
            assert_eq!(bytes(block), Err(AllocError::Unavailable));
            init_default_allocator().unwrap();
            assert_eq!(bytes(block), Err(AllocError::Foreign));
        }).join().unwrap();
        assert_eq!(bytes(block), Ok(b"here".to_vec()));
    }
}
