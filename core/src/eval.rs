//! Running a parser graph against input.

use tracing::trace;

use crate::{AllocError, Failure, Node, Output, Parser, Reason, Sweeper};


/// How many `lazy` nodes in a row may build yet another `lazy` node before the
/// chain is judged to have no operation at all.
pub const MAX_LAZY_HOPS: usize = 64;


/// A position in some input.
///
/// This is passed by value into every step of a parse, so each step works on
/// its own copy and a failed attempt cannot disturb the position that the
/// next alternative starts from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct State<'i> {
    input: &'i [u8],
    pos: usize,
}

impl<'i> State<'i> {
    /// The position `pos` (clamped to the end) in `input`.
    #[inline]
    pub fn new(input: &'i [u8], pos: usize) -> Self {
        Self { input, pos: pos.min(input.len()) }
    }

    /// Byte offset into the input.
    #[inline]
    pub fn pos(&self) -> usize { self.pos }

    /// The input from this position on.
    #[inline]
    pub fn rest(&self) -> &'i [u8] {
        &self.input[self.pos ..]
    }

    /// The byte at this position, if not at the end.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Whether the whole input has been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn advance(self, n: usize) -> Self {
        Self::new(self.input, self.pos + n)
    }

    #[inline]
    fn at(self, pos: usize) -> Self {
        Self::new(self.input, pos)
    }

    #[inline]
    fn ok(self, output: Output) -> ParseResult<'i> {
        Ok(Success { end: self.pos, output, rest: self.rest() })
    }

    #[inline]
    fn unexpected<T>(self) -> Result<T, Failure> {
        Err(Failure::unexpected(self.pos))
    }
}


/// A successful parse.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Success<'i> {
    /// Offset just after the consumed input.
    pub end: usize,
    /// What was produced.
    pub output: Output,
    /// The input that was not consumed, starting at `end`.
    pub rest: &'i [u8],
}

/// The result of parsing.
pub type ParseResult<'i> = Result<Success<'i>, Failure>;


/// Run `parser` against `input` from its start, allocating outputs through
/// `sweeper`.
///
/// Outputs are only valid until `sweeper` is next swept.  Input is treated as
/// bytes; the end of the input is the end of the slice (a NUL byte is
/// ordinary data).
pub fn parse<'i, I>(parser: &Parser, input: &'i I, sweeper: &mut dyn Sweeper) -> ParseResult<'i>
    where I: AsRef<[u8]> + ?Sized,
{
    parse_at(parser, State::new(input.as_ref(), 0), sweeper)
}

/// Run `parser` starting from `state`.
///
/// | Node | Succeeds when | Consumes | Produces |
/// |---|---|---|---|
/// | `Pure` | always | nothing | `Absence` |
/// | `Fail` | never | | |
/// | `Eof` | at the end | nothing | `Absence` |
/// | `Expect(c)` | next byte is `c` | 1 | `Absence` |
/// | `Literal(c)` | next byte is `c` | 1 | `Character` |
/// | `String(s)` | input starts with `s` | `s.len()` | `String` |
/// | `StringNoCase(s)` | same, ignoring ASCII case | `s.len()` | `String` as written |
/// | `CharsetMember` | next byte is in the set | 1 | `Character` |
/// | `CharsetNonMember` | next byte exists and is not in the set | 1 | `Character` |
/// | `Optional` | always | child's, or nothing | child's, or `Absence` |
/// | `Choice` | the first child that does | its | its |
/// | `Many` | always | every match until a mismatch or the end | `Array` |
/// | `Sequence` | every child, in order | all of theirs | `Array` |
/// | `Map` | child does | child's | the function's result |
/// | `Tap` | child does | child's | child's |
/// | `Lazy` | the built node does | its | its |
///
/// Only mismatches ([`Reason::UnexpectedToken`]) are recovered from, by
/// `Optional` and `Choice`.  Allocation failures end the whole parse.
pub fn parse_at<'i>(parser: &Parser, state: State<'i>, sweeper: &mut dyn Sweeper)
                    -> ParseResult<'i>
{
    trace!(node = parser.kind(), pos = state.pos, "parse");

    let alloc_failed = |e: AllocError| Failure::new(state.pos, e);

    match &**parser {
        Node::Pure => state.ok(Output::Absence),

        Node::Fail => state.unexpected(),

        Node::Eof =>
            if state.at_end() { state.ok(Output::Absence) } else { state.unexpected() },

        Node::Expect(c) =>
            if state.peek() == Some(*c) {
                state.advance(1).ok(Output::Absence)
            } else {
                state.unexpected()
            },

        Node::Literal(c) =>
            if state.peek() == Some(*c) {
                state.advance(1).ok(Output::Character(*c))
            } else {
                state.unexpected()
            },

        Node::String(text) =>
            if state.rest().starts_with(text) {
                let output = Output::string(sweeper, text).map_err(alloc_failed)?;
                state.advance(text.len()).ok(output)
            } else {
                state.unexpected()
            },

        Node::StringNoCase(text) =>
            match state.rest().get(.. text.len()) {
                Some(written) if written.eq_ignore_ascii_case(text) => {
                    let output = Output::string(sweeper, written).map_err(alloc_failed)?;
                    state.advance(text.len()).ok(output)
                }
                _ => state.unexpected(),
            },

        Node::CharsetMember(set) =>
            match state.peek() {
                Some(c) if set.contains(c) => state.advance(1).ok(Output::Character(c)),
                _ => state.unexpected(),
            },

        Node::CharsetNonMember(set) =>
            match state.peek() {
                Some(c) if !set.contains(c) => state.advance(1).ok(Output::Character(c)),
                _ => state.unexpected(),
            },

        Node::Optional(child) =>
            match parse_at(child, state, sweeper) {
                Err(failure) if failure.is_recoverable() => state.ok(Output::Absence),
                result => result,
            },

        Node::Choice(children) => {
            for child in children.iter() {
                match parse_at(child, state, sweeper) {
                    Err(failure) if failure.is_recoverable() => continue,
                    result => return result,
                }
            }
            trace!(pos = state.pos, "no alternative matched");
            state.unexpected()
        }

        Node::Many(child) => {
            let mut cursor = state;
            let mut matches = Vec::new();
            while !cursor.at_end() {
                match parse_at(child, cursor, sweeper) {
                    Ok(success) => {
                        matches.push(success.output);
                        cursor = cursor.at(success.end);
                    }
                    Err(failure) if failure.is_recoverable() => break,
                    Err(failure) => return Err(failure),
                }
            }
            let output = Output::array(sweeper, &matches).map_err(alloc_failed)?;
            cursor.ok(output)
        }

        Node::Sequence(children) => {
            let mut cursor = state;
            let mut outputs = Vec::with_capacity(children.len());
            for child in children.iter() {
                match parse_at(child, cursor, sweeper) {
                    Ok(success) => {
                        outputs.push(success.output);
                        cursor = cursor.at(success.end);
                    }
                    Err(failure) => {
                        trace!(pos = cursor.pos, reason = %failure.reason, "sequence failed");
                        return Err(Failure::new(cursor.pos, failure.reason));
                    }
                }
            }
            let output = Output::array(sweeper, &outputs).map_err(alloc_failed)?;
            cursor.ok(output)
        }

        Node::Map(child, f) => {
            let success = parse_at(child, state, sweeper)?;
            let output = f(success.output, sweeper).map_err(alloc_failed)?;
            Ok(Success { output, ..success })
        }

        Node::Tap(child, f) => {
            let success = parse_at(child, state, sweeper)?;
            f(success.output, sweeper).map_err(alloc_failed)?;
            Ok(success)
        }

        Node::Lazy(build) => {
            let mut target = build();
            let mut hops = 1;
            while let Node::Lazy(next) = &*target {
                if hops >= MAX_LAZY_HOPS {
                    trace!(pos = state.pos, hops, "lazy chain never reached an operation");
                    return Err(Failure::new(state.pos, Reason::UnknownOperation));
                }
                target = next();
                hops += 1;
            }
            parse_at(&target, state, sweeper)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn value(result: ParseResult<'_>, arena: &Arena) -> (usize, Value) {
        let success = result.unwrap();
        (success.end, success.output.to_value(arena).unwrap())
    }

    #[test]
    fn state() {
        let s = State::new(b"abc", 1);
        assert_eq!(s.peek(), Some(b'b'));
        assert_eq!(s.rest(), b"bc");
        assert!(!s.at_end());
        assert!(State::new(b"abc", 9).at_end());
        assert_eq!(State::new(b"abc", 9).pos(), 3);
    }

    #[test]
    fn primitives() {
        let mut a = Arena::new(256);

        assert_eq!(value(parse(&pure(), "x", &mut a), &a), (0, Value::Absence));
        assert_eq!(parse(&fail(), "x", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(value(parse(&eof(), "", &mut a), &a), (0, Value::Absence));
        assert_eq!(parse(&eof(), "x", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(value(parse(&expect(b'x'), "xy", &mut a), &a), (1, Value::Absence));
        assert_eq!(parse(&expect(b'x'), "y", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(value(parse(&literal(b'x'), "xy", &mut a), &a),
                   (1, Value::Character(b'x')));
        assert_eq!(parse(&literal(b'x'), "", &mut a), Err(Failure::unexpected(0)));
    }

    #[test]
    fn rest() {
        let mut a = Arena::new(256);
        let s = parse(&string("ab"), "abcd", &mut a).unwrap();
        assert_eq!(s.rest, b"cd");
        let m = parse(&many(literal(b'a')), "aab", &mut a).unwrap();
        assert_eq!((m.end, m.rest), (2, &b"b"[..]));
        let q = parse(&sequence([literal(b'a'), literal(b'a')]), "aab", &mut a).unwrap();
        assert_eq!((q.end, q.rest), (2, &b"b"[..]));
        let e = parse(&expect(b'a'), "ab", &mut a).unwrap();
        assert_eq!((e.end, e.rest), (1, &b"b"[..]));
    }

    #[test]
    fn nul_is_data() {
        let mut a = Arena::new(64);
        assert_eq!(value(parse(&literal(0), &b"\0"[..], &mut a), &a),
                   (1, Value::Character(0)));
        assert!(parse(&eof(), &b"\0"[..], &mut a).is_err());
        assert!(parse(&none_of("a"), "", &mut a).is_err());
        assert!(parse(&any_of("\0"), "", &mut a).is_err());
    }

    #[test]
    fn strings() {
        let mut a = Arena::new(256);
        assert_eq!(value(parse(&string("foo"), "foobar", &mut a), &a),
                   (3, Value::text("foo")));
        assert_eq!(parse(&string("foo"), "fo", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(value(parse(&string(""), "x", &mut a), &a), (0, Value::text("")));
        assert_eq!(value(parse(&string_no_case("foo"), "FoObar", &mut a), &a),
                   (3, Value::text("FoO")));
        assert_eq!(parse(&string_no_case("foo"), "FO", &mut a), Err(Failure::unexpected(0)));
    }

    #[test]
    fn charsets() {
        let mut a = Arena::new(64);
        assert_eq!(value(parse(&any_of("0123456789"), "7x", &mut a), &a),
                   (1, Value::Character(b'7')));
        assert_eq!(parse(&any_of("0123456789"), "x7", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(value(parse(&none_of("0123456789"), "x7", &mut a), &a),
                   (1, Value::Character(b'x')));
        assert_eq!(parse(&none_of("0123456789"), "7x", &mut a), Err(Failure::unexpected(0)));
    }

    #[test]
    fn optional_and_choice() {
        let mut a = Arena::new(256);
        assert_eq!(value(parse(&optional(literal(b'a')), "b", &mut a), &a),
                   (0, Value::Absence));
        assert_eq!(value(parse(&optional(literal(b'a')), "a", &mut a), &a),
                   (1, Value::Character(b'a')));

        // The first alternative consumes "a" before failing; the second still
        // starts from the beginning.
        let p = choice([sequence([literal(b'a'), literal(b'x')]),
                        sequence([literal(b'a'), literal(b'b')])]);
        assert_eq!(value(parse(&p, "ab", &mut a), &a), (2, Value::chars("ab")));
        assert_eq!(parse(&p, "ac", &mut a), Err(Failure::unexpected(0)));
        assert_eq!(parse(&choice([]), "a", &mut a), Err(Failure::unexpected(0)));
    }

    #[test]
    fn many_and_sequence() {
        let mut a = Arena::new(256);
        assert_eq!(value(parse(&many(any_of(" \t")), "  x", &mut a), &a),
                   (2, Value::chars("  ")));
        assert_eq!(value(parse(&many(literal(b'a')), "", &mut a), &a),
                   (0, Value::Array(vec![])));
        assert_eq!(value(parse(&sequence([literal(b'a'), literal(b'b')]), "ab", &mut a), &a),
                   (2, Value::chars("ab")));
        assert_eq!(value(parse(&sequence([]), "ab", &mut a), &a), (0, Value::Array(vec![])));
        // Reported where the failing child was attempted.
        let p = sequence([literal(b'a'), literal(b'b'), literal(b'c')]);
        assert_eq!(parse(&p, "abx", &mut a), Err(Failure::unexpected(2)));
    }

    #[test]
    fn many_scratch_grows() {
        let mut a = Arena::new(1 << 20);
        let input = "a".repeat(10_000);
        let s = parse(&many(literal(b'a')), &input, &mut a).unwrap();
        assert_eq!(s.end, 10_000);
        assert_eq!(s.output.array_len(), Some(10_000));
    }

    #[test]
    fn map_and_tap() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut a = Arena::new(256);
        let p = map(literal(b'a'), |_, _| Ok(Output::Character(b'z')));
        assert_eq!(value(parse(&p, "a", &mut a), &a), (1, Value::Character(b'z')));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let p = tap(many(literal(b'a')), move |output, _| {
            counter.store(output.array_len().unwrap_or(0), Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(value(parse(&p, "aaa", &mut a), &a), (3, Value::chars("aaa")));
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        // Neither function runs when the child fails.
        seen.store(99, Ordering::SeqCst);
        assert!(parse(&p, "b", &mut a).is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        let q = tap(literal(b'a'), |_, _| panic!("must not run"));
        assert!(parse(&q, "b", &mut a).is_err());
    }

    #[test]
    fn alloc_failures_propagate() {
        let mut a = Arena::new(4);
        let p = choice([string("abcdefgh"), pure()]);
        assert_eq!(parse(&p, "abcdefgh", &mut a),
                   Err(Failure::new(0, AllocError::TooLarge { requested: 8, capacity: 4 })));
        let q = optional(string("abcdefgh"));
        assert!(matches!(parse(&q, "abcdefgh", &mut a),
                         Err(Failure { reason: Reason::FailedAlloc(_), .. })));
        let r = map(pure(), |_, _| Err(AllocError::Foreign));
        assert_eq!(parse(&r, "", &mut a), Err(Failure::new(0, AllocError::Foreign)));
    }

    #[test]
    fn array_must_fit_region() {
        let mut a = Arena::default();
        let p = many(literal(b'x'));
        let most = DEFAULT_REGION_SIZE / Output::ENCODED_LEN;
        assert_eq!(most, 390);
        let fits = vec![b'x'; most];
        let s = parse(&p, &fits, &mut a).unwrap();
        assert_eq!(s.output.array_len(), Some(most));

        let over = vec![b'x'; 400];
        let requested = over.len() * Output::ENCODED_LEN;
        assert_eq!(parse(&p, &over, &mut a),
                   Err(Failure::new(0, AllocError::TooLarge { requested,
                                                              capacity: DEFAULT_REGION_SIZE })));
        // A larger region makes room.
        let mut big = Arena::new(requested);
        assert!(parse(&p, &over, &mut big).is_ok());
    }

    fn parens() -> Parser {
        choice([sequence([literal(b'('), lazy(parens), literal(b')')]), pure()])
    }

    #[test]
    fn recursion() {
        let mut a = Arena::new(1024);
        let p = sequence([parens(), eof()]);
        assert!(parse(&p, "((()))", &mut a).is_ok());
        assert!(parse(&p, "(()", &mut a).is_err());
    }

    fn bottomless() -> Parser {
        lazy(bottomless)
    }

    #[test]
    fn lazy_without_operation() {
        let mut a = Arena::new(64);
        assert_eq!(parse(&bottomless(), "x", &mut a),
                   Err(Failure::new(0, Reason::UnknownOperation)));
        // Not recoverable.
        assert_eq!(parse(&optional(bottomless()), "x", &mut a),
                   Err(Failure::new(0, Reason::UnknownOperation)));
    }

    #[test]
    fn graph_reuse_across_arenas() {
        let p = many(string("ab"));
        let mut a1 = Arena::new(256);
        let mut a2 = Arena::new(256);
        let s1 = parse(&p, "abab", &mut a1).unwrap();
        let s2 = parse(&p, "ab", &mut a2).unwrap();
        assert_eq!(s1.output.to_value(&a1).unwrap(), Value::texts(&["ab", "ab"]));
        assert_eq!(s2.output.to_value(&a2).unwrap(), Value::texts(&["ab"]));
        assert_eq!(s1.output.to_value(&a2), Err(AllocError::Foreign));

        // Sweeping drops the outputs but not the graph.
        a1.sweep();
        assert!(s1.output.to_value(&a1).is_err());
        let s3 = parse(&p, "ab", &mut a1).unwrap();
        assert_eq!(s3.output.to_value(&a1).unwrap(), Value::texts(&["ab"]));
    }
}
