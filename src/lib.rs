//! Additional, more convenient, functionality layered on top of
//! [`pcomb_core`].
//!
//! This crate:
//!
//! * Re-exports all of [`pcomb_core`].
//!
//! * Provides a per-thread active sweeper, in the [`context`] module, so that
//! allocation and parsing can be done without passing a sweeper around.  Its
//! functions are also re-exported at the top, where [`parse`] shadows the
//! core crate's explicit-sweeper variant (still available as
//! [`eval::parse`]).
//!
//! * Provides premade [`Sweeper`]s that wrap another one:
//! [`CountingSweeper`](sweeper::CountingSweeper) to observe how a parse uses
//! memory, and [`BoundedSweeper`](sweeper::BoundedSweeper) to limit how much
//! it may use.
//!
//! Unlike [`pcomb_core`], this crate's premade items are placed at the top of
//! their respective modules, including for the premade items re-exported from
//! the core crate.
//!
//! ```
//! use pcomb::*;
//!
//! init_default_allocator().unwrap();
//! let greeting = sequence([string_no_case("hello"), combinator::skip_whitespace(),
//!                          combinator::concat_string([combinator::alpha(),
//!                                                     many(combinator::alpha())])]);
//! let success = parse(&greeting, "Hello  world").unwrap();
//! assert_eq!(value(success.output).unwrap(),
//!            Value::Array(vec![Value::text("Hello"), Value::Absence, Value::text("world")]));
//!
//! sweep().unwrap();
//! assert!(value(success.output).is_err());
//! ```

// Re-export everything from the core crate. (Except items shadowed by ours,
// which are re-exported elsewhere.)
#[doc(no_inline)]
pub use pcomb_core::*;

pub mod context;
pub use context::{
    alloc, bytes, deinit_default_allocator, duplicate_string, duplicate_string_n,
    init_default_allocator, init_default_allocator_with, parse, set_allocator,
    set_default_allocator, sweep, value, with_allocator,
};

/// [`Sweeper`]s that wrap another one.  Also re-exports the core crate's
/// module and premades.
pub mod sweeper {
    #[doc(no_inline)]
    pub use pcomb_core::sweeper::{*, premade::*};

    mod counting;
    pub use counting::{CountingSweeper, SweepStats};

    mod bounded;
    pub use bounded::BoundedSweeper;
}
