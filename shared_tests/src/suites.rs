//! Suites of tests applied across multiple crates and sweepers.

use pcomb_core::*;
use pcomb_core::combinator::*;

use crate::utils::*;


/// A grammar of balanced parentheses, which needs recursion.
fn parens() -> Parser {
    many(sequence([expect(b'('), lazy(parens), expect(b')')]))
}

/// What `parens` produces for one pair around `inner`.
fn pair(inner: Vec<Value>) -> Value {
    Value::Array(vec![Value::Absence, Value::Array(inner), Value::Absence])
}

/// A letter followed by any letters, digits and underscores, as one `String`.
fn identifier() -> Parser {
    concat_string([alpha(), many(alphanumeric_or_underscore())])
}


/// Basic test suite that checks every kind of node and the derived
/// combinators.  Requires `sweeper` to be able to hand out at least a few
/// hundred bytes at a time.
pub fn test_suite0(sweeper: &mut dyn Sweeper) {
    macro_rules! test {
        ($parser:expr, $input:expr => $expected:expr)
            =>
        {assert_eq!(run(&$parser, $input, sweeper), $expected, "input: {:?}", $input);};
    }

    // Basics
    test!(sequence([literal(b'a'), literal(b'b')]), "ab" => ok(2, Value::chars("ab")));
    test!(any_of("0123456789"), "7x" => ok(1, Value::Character(b'7')));
    test!(many(any_of(" \t")), "  \tx" => ok(3, Value::chars("  \t")));
    test!(string_no_case("foo"), "FOO" => ok(3, Value::text("FOO")));

    test!(pure(), "" => ok(0, Value::Absence));
    test!(pure(), "x" => ok(0, Value::Absence));
    test!(fail(), "" => mismatch(0));
    test!(fail(), "x" => mismatch(0));
    test!(eof(), "" => ok(0, Value::Absence));
    test!(eof(), "x" => mismatch(0));
    test!(expect(b'x'), "x" => ok(1, Value::Absence));
    test!(expect(b'x'), "" => mismatch(0));
    test!(literal(b'x'), "xx" => ok(1, Value::Character(b'x')));
    test!(literal(b'x'), "X" => mismatch(0));
    test!(string("let"), "let x" => ok(3, Value::text("let")));
    test!(string("let"), "le" => mismatch(0));
    test!(string("let"), "Let" => mismatch(0));
    test!(string(""), "" => ok(0, Value::text("")));
    test!(string_no_case("let"), "LeT" => ok(3, Value::text("LeT")));
    test!(string_no_case("let"), "lex" => mismatch(0));
    test!(none_of("abc"), "d" => ok(1, Value::Character(b'd')));
    test!(none_of("abc"), "b" => mismatch(0));
    test!(none_of("abc"), "" => mismatch(0));

    // Combinators
    test!(optional(literal(b'a')), "b" => ok(0, Value::Absence));
    test!(optional(literal(b'a')), "ab" => ok(1, Value::Character(b'a')));
    test!(choice([literal(b'a'), literal(b'b')]), "b" => ok(1, Value::Character(b'b')));
    test!(choice([literal(b'a'), literal(b'b')]), "c" => mismatch(0));
    test!(choice([string("ab"), string("ac")]), "ac" => ok(2, Value::text("ac")));
    test!(choice([]), "" => mismatch(0));
    test!(many(literal(b'a')), "" => ok(0, Value::Array(vec![])));
    test!(many(literal(b'a')), "b" => ok(0, Value::Array(vec![])));
    test!(many(string("ab")), "ababa" => ok(4, Value::texts(&["ab", "ab"])));
    test!(sequence([]), "x" => ok(0, Value::Array(vec![])));
    test!(sequence([string("a"), expect(b'='), string("b")]), "a=b"
          => ok(3, Value::Array(vec![Value::text("a"), Value::Absence, Value::text("b")])));
    test!(sequence([string("a"), expect(b'='), string("b")]), "a=c" => mismatch(2));
    test!(sequence([string("a"), eof()]), "ab" => mismatch(1));
    test!(sequence([many(literal(b'a')), many(literal(b'b'))]), "aab"
          => ok(3, Value::Array(vec![Value::chars("aa"), Value::chars("b")])));
    test!(map(literal(b'a'), |_, _| Ok(Output::Character(b'b'))), "a"
          => ok(1, Value::Character(b'b')));
    test!(map(literal(b'a'), |_, s| Output::string(s, b"mapped")), "a"
          => ok(1, Value::text("mapped")));
    test!(tap(literal(b'a'), |_, _| Ok(())), "a" => ok(1, Value::Character(b'a')));

    // Recursion
    test!(sequence([parens(), eof()]), "(()())"
          => ok(6, Value::Array(vec![
              Value::Array(vec![pair(vec![pair(vec![]), pair(vec![])])]),
              Value::Absence])));
    test!(parens(), "()(x" => ok(2, Value::Array(vec![pair(vec![])])));
    test!(sequence([parens(), eof()]), "(()" => mismatch(0));

    // Derived
    test!(skip(string("abc")), "abc" => ok(3, Value::Absence));
    test!(concat_string([identifier(), string("::"), identifier()]), "a_1::b2 "
          => ok(7, Value::text("a_1::b2")));
    test!(concat_array([literal(b'x'), many(literal(b'y'))]), "xyy"
          => ok(3, Value::chars("xyy")));
    test!(select(sequence([literal(b'a'), literal(b'b')]), 1), "ab"
          => ok(2, Value::Character(b'b')));
    test!(select(sequence([literal(b'a'), literal(b'b')]), 2), "ab"
          => ok(2, Value::Absence));
    test!(whitespace(), " \r\n\tx" => ok(4, Value::chars(" \r\n\t")));
    test!(skip_whitespace(), "   " => ok(3, Value::Absence));
    test!(whitespace_delimited(identifier()), " \n ident  " => ok(10, Value::text("ident")));
    test!(comma_separated_list(identifier()), "a,b,c" => ok(5, Value::texts(&["a", "b", "c"])));
    test!(comma_separated_list(identifier()), "a" => ok(1, Value::texts(&["a"])));
    test!(comma_separated_list(identifier()), "" => mismatch(0));
    test!(comma_separated_list(identifier()), "1,a" => mismatch(0));
    test!(separated_list(whitespace_delimited(identifier()), literal(b'|')), "x | y|z"
          => ok(7, Value::texts(&["x", "y", "z"])));
}


/// Checks how outputs relate to sweeping.  Requires `sweeper` to detect the
/// use of blocks from before its last sweep and from other sweepers, as the
/// premade ones all do.
pub fn test_suite_sweep(sweeper: &mut dyn Sweeper) {
    let list = comma_separated_list(identifier());

    let success = parse(&list, "one,two", sweeper).unwrap();
    assert_eq!(outcome(Ok(success), sweeper), ok(7, Value::texts(&["one", "two"])));

    sweeper.sweep();
    assert!(matches!(success.output.to_value(sweeper), Err(AllocError::Stale { .. })));

    // Still usable afterwards, and the graph is unaffected.
    assert_eq!(run(&list, "three", sweeper), ok(5, Value::texts(&["three"])));

    let mut other = Arena::new(256);
    let foreign = parse(&list, "x", &mut other).unwrap();
    assert_eq!(foreign.output.to_value(sweeper), Err(AllocError::Foreign));
    assert_eq!(outcome(Ok(foreign), &other), ok(1, Value::texts(&["x"])));

    sweeper.sweep();
}
