//! A small algebra for building recursive-descent parsers out of primitive
//! matchers and combinators, whose results are allocated from a region-based
//! arena.
//!
//! A parser is a graph of immutable nodes, built once with the constructor
//! functions ([`string`], [`any_of`], [`sequence`], [`many`], [`map`], ...)
//! and then run any number of times with [`parse`].  Graphs are shared
//! (cloning a [`Parser`] is cheap) and may be used from several threads at
//! once.  Recursive grammars are expressed with [`lazy`], so graphs never
//! contain cycles.
//!
//! Every `String` and `Array` that parsing produces is allocated through a
//! [`Sweeper`]: a capability that can hand out bytes and can release
//! everything handed out so far in one go.  The engine depends on nothing else
//! about memory, so any allocator satisfying it can be substituted.  The
//! premade [`Arena`] bump-allocates from a chain of fixed-size regions.  An
//! [`Output`] is only a handle into its sweeper and is invalidated by the
//! sweeper's next sweep; reading it afterwards is reported as
//! [`AllocError::Stale`], never undefined behaviour.  Use
//! [`Output::to_value`] to keep an owned copy.
//!
//! This core crate passes the sweeper explicitly to every operation.  The full
//! crate adds a per-thread "active sweeper" context on top of it.
//!
//! ```
//! use pcomb_core::*;
//!
//! let digit = any_of("0123456789");
//! let number = combinator::concat_string([digit.clone(), many(digit)]);
//! let list = combinator::comma_separated_list(combinator::whitespace_delimited(number));
//!
//! let mut arena = Arena::default();
//! let success = parse(&list, "1, 23 ,456", &mut arena).unwrap();
//! assert_eq!(success.output.to_value(&arena).unwrap(),
//!            Value::texts(&["1", "23", "456"]));
//!
//! arena.sweep();
//! assert!(success.output.to_value(&arena).is_err());
//! ```

pub mod error;
pub use error::{AllocError, Failure, Reason};

pub mod sweeper;
pub use sweeper::{Block, Sweeper};
#[doc(no_inline)]
pub use sweeper::premade::{Arena, DEFAULT_REGION_SIZE};

pub mod output;
pub use output::{Output, Value};

pub mod parser;
pub use parser::{
    any_of, choice, eof, expect, fail, lazy, literal, many, map, none_of, optional, pure,
    sequence, string, string_no_case, tap, Charset, Node, Parser,
};

pub mod eval;
pub use eval::{parse, parse_at, ParseResult, State, Success, MAX_LAZY_HOPS};

pub mod transform;
pub use transform::Slot;

pub mod combinator;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_of_literals() {
        let mut arena = Arena::new(128);
        let s = parse(&sequence([literal(b'a'), literal(b'b')]), "ab", &mut arena).unwrap();
        assert_eq!(s.end, 2);
        assert_eq!(s.output.to_value(&arena).unwrap(), Value::chars("ab"));
    }

    #[test]
    fn charset_digit() {
        let mut arena = Arena::new(128);
        let s = parse(&any_of("0123456789"), "7x", &mut arena).unwrap();
        assert_eq!((s.end, s.output, s.rest), (1, Output::Character(b'7'), &b"x"[..]));
    }

    #[test]
    fn many_blanks() {
        let mut arena = Arena::new(128);
        let s = parse(&many(any_of(" \t")), "  \tx", &mut arena).unwrap();
        assert_eq!(s.end, 3);
        assert_eq!(s.output.to_value(&arena).unwrap(), Value::chars("  \t"));
    }

    #[test]
    fn no_case() {
        let mut arena = Arena::new(128);
        let s = parse(&string_no_case("foo"), "FOO", &mut arena).unwrap();
        assert_eq!(s.end, 3);
        assert_eq!(s.output.to_value(&arena).unwrap(), Value::text("FOO"));
    }

    #[test]
    fn arena_regions_and_sweep() {
        let mut arena = Arena::new(64);
        let a = arena.allocate(40).unwrap();
        let b = arena.allocate(40).unwrap();
        assert_eq!(arena.region_count(), 2);
        arena.sweep();
        assert!(arena.bytes(a).is_err());
        assert!(arena.bytes(b).is_err());
        assert!(arena.allocate(40).is_ok());
        assert_eq!(arena.region_count(), 1);
    }

    #[test]
    fn through_dyn() {
        let mut arena = Arena::default();
        let sweeper: &mut dyn Sweeper = arena.make_sweeper();
        let s = parse(&string("hi"), "hi!", sweeper).unwrap();
        assert_eq!(s.output.string_bytes(sweeper).unwrap(), Some(&b"hi"[..]));
        let mut boxed: Box<dyn Sweeper> = Box::new(Arena::new(16));
        assert!(parse(&string("hi"), "hi", &mut boxed).is_ok());
    }
}
