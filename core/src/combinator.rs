//! Higher-level parsers composed from the primitive ones.

use crate::transform::{self, Slot};
use crate::{any_of, many, map, sequence, string, tap, Block, Parser};


/// The space, tab, newline and carriage-return bytes.
pub const WHITESPACE: &str = " \t\n\r";

/// ASCII letters.
pub const ALPHA: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// ASCII letters, digits and the underscore.
pub const ALPHANUMERIC_OR_UNDERSCORE: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";


/// Runs `parser` and produces `Absence` in place of its output.
pub fn skip(parser: Parser) -> Parser {
    map(parser, transform::skip)
}

/// Runs `parsers` in sequence and produces everything they matched as one
/// flat `String`.
pub fn concat_string(parsers: impl IntoIterator<Item = Parser>) -> Parser {
    map(sequence(parsers), transform::concat_string)
}

/// Runs `parsers` in sequence and produces an `Array` in which the elements of
/// any `Array` outputs are spliced, one level deep.
pub fn concat_array(parsers: impl IntoIterator<Item = Parser>) -> Parser {
    map(sequence(parsers), transform::concat_array)
}

/// Runs `parser` and produces element `index` of its `Array` output.
pub fn select(parser: Parser, index: usize) -> Parser {
    map(parser, transform::select(index))
}

/// Zero or more whitespace bytes, as an `Array` of `Character`s.
pub fn whitespace() -> Parser {
    many(any_of(WHITESPACE))
}

/// One ASCII letter.
pub fn alpha() -> Parser {
    any_of(ALPHA)
}

/// One ASCII letter, digit or underscore.
pub fn alphanumeric_or_underscore() -> Parser {
    any_of(ALPHANUMERIC_OR_UNDERSCORE)
}

/// Zero or more whitespace bytes, producing `Absence`.
pub fn skip_whitespace() -> Parser {
    skip(whitespace())
}

/// `parser` with optional whitespace around it, producing just `parser`'s
/// output.
pub fn whitespace_delimited(parser: Parser) -> Parser {
    select(sequence([skip_whitespace(), parser, skip_whitespace()]), 1)
}

/// One or more `item`s with a `separator` between each, as one `Array` of the
/// items' outputs.  The separators' outputs are dropped.
///
/// The result is the first item's output followed by the later items'
/// outputs, so if the first item produces an `Array`, its elements are
/// spliced in while every later item's `Array` stays nested.  Wrap an `item`
/// that produces arrays with [`concat_string`] or [`map`] to give every item
/// the same shape.
pub fn separated_list(item: Parser, separator: Parser) -> Parser {
    let rest = many(select(sequence([separator, item.clone()]), 1));
    concat_array([item, rest])
}

/// [`separated_list`] with a `","` separator.
pub fn comma_separated_list(item: Parser) -> Parser {
    separated_list(item, string(","))
}

/// Runs `parser` and stores in `slot` the block of its output if that is a
/// `String`, else clears `slot`.
pub fn copy_string_ref(parser: Parser, slot: &Slot<Block>) -> Parser {
    tap(parser, transform::copy_string_ref(slot))
}

/// Runs `parser` and, if its output is an `Array`, stores in `slot` the block
/// of each element that is a `String` and `None` for the others.  Else clears
/// `slot`.
pub fn copy_string_array_ref(parser: Parser, slot: &Slot<Vec<Option<Block>>>) -> Parser {
    tap(parser, transform::copy_string_array_ref(slot))
}
