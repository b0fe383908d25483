//! Parser nodes and the constructors of the primitive combinators.
//!
//! A parser is a graph of immutable [`Node`]s built once and then run any
//! number of times by [`parse`](crate::parse).  Nodes are shared, not owned
//! exclusively: the same sub-parser can appear in many graphs, and cloning a
//! [`Parser`] only clones a reference.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::{AllocError, Output, Sweeper};


/// The function of a [`Node::Map`]: transforms the output of a successful
/// child.  It may allocate through the sweeper it is given.
pub type MapFn = dyn Fn(Output, &mut dyn Sweeper) -> Result<Output, AllocError> + Send + Sync;

/// The function of a [`Node::Tap`]: observes the output of a successful child,
/// for its side effects.
pub type TapFn = dyn Fn(Output, &mut dyn Sweeper) -> Result<(), AllocError> + Send + Sync;

/// The function of a [`Node::Lazy`]: builds the node to run in its place.
pub type LazyFn = dyn Fn() -> Parser + Send + Sync;


/// A set of bytes, for the charset matchers.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Charset([u64; 4]);

impl Charset {
    /// The set of the bytes of `chars`.
    pub fn new(chars: &[u8]) -> Self {
        let mut bits = [0_u64; 4];
        for &c in chars {
            bits[usize::from(c >> 6)] |= 1_u64 << (c & 63);
        }
        Self(bits)
    }

    /// Whether `c` is in the set.
    #[inline]
    pub fn contains(&self, c: u8) -> bool {
        self.0[usize::from(c >> 6)] & (1_u64 << (c & 63)) != 0
    }

    /// The members, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0 ..= u8::MAX).filter(move |&c| self.contains(c))
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<u8> = self.iter().collect();
        write!(f, "Charset({:?})", String::from_utf8_lossy(&members))
    }
}


/// What a parser does.  See [`parse`](crate::parse) for how each variant is
/// evaluated.
pub enum Node {
    /// Succeed without consuming.
    Pure,
    /// Never succeed.
    Fail,
    /// Succeed only at the end of the input.
    Eof,
    /// Consume the given byte, producing nothing.
    Expect(u8),
    /// Consume the given byte, producing it.
    Literal(u8),
    /// Consume the given byte string exactly.
    String(Box<[u8]>),
    /// Consume the given byte string, ignoring ASCII case.
    StringNoCase(Box<[u8]>),
    /// Consume one byte that is in the set.
    CharsetMember(Charset),
    /// Consume one byte that is not in the set.
    CharsetNonMember(Charset),
    /// Run the child; a mismatch becomes an empty success.
    Optional(Parser),
    /// Run the children in order until one succeeds.
    Choice(Box<[Parser]>),
    /// Run the child repeatedly until it mismatches or the input ends.
    Many(Parser),
    /// Run all the children, one after another.
    Sequence(Box<[Parser]>),
    /// Run the child and transform its output.
    Map(Parser, Arc<MapFn>),
    /// Run the child and show its output to an observer.
    Tap(Parser, Arc<TapFn>),
    /// Build the node to run when it is needed.  This is how recursive
    /// grammars are expressed without cycles in the graph.
    Lazy(Arc<LazyFn>),
}

impl Node {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Pure => "pure",
            Node::Fail => "fail",
            Node::Eof => "eof",
            Node::Expect(_) => "expect",
            Node::Literal(_) => "literal",
            Node::String(_) => "string",
            Node::StringNoCase(_) => "string_no_case",
            Node::CharsetMember(_) => "any_of",
            Node::CharsetNonMember(_) => "none_of",
            Node::Optional(_) => "optional",
            Node::Choice(_) => "choice",
            Node::Many(_) => "many",
            Node::Sequence(_) => "sequence",
            Node::Map(..) => "map",
            Node::Tap(..) => "tap",
            Node::Lazy(_) => "lazy",
        }
    }
}

/// Must implement this manually because the functions of some variants are
/// not `Debug`.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = |f: &mut fmt::Formatter<'_>, name, t: &[u8]|
                       write!(f, "{}({:?})", name, String::from_utf8_lossy(t));
        match self {
            Node::Pure => f.write_str("Pure"),
            Node::Fail => f.write_str("Fail"),
            Node::Eof => f.write_str("Eof"),
            Node::Expect(c) => write!(f, "Expect({:?})", char::from(*c)),
            Node::Literal(c) => write!(f, "Literal({:?})", char::from(*c)),
            Node::String(s) => text(f, "String", &s[..]),
            Node::StringNoCase(s) => text(f, "StringNoCase", &s[..]),
            Node::CharsetMember(set) => f.debug_tuple("CharsetMember").field(set).finish(),
            Node::CharsetNonMember(set) => f.debug_tuple("CharsetNonMember").field(set).finish(),
            Node::Optional(p) => f.debug_tuple("Optional").field(p).finish(),
            Node::Choice(ps) => f.debug_tuple("Choice").field(ps).finish(),
            Node::Many(p) => f.debug_tuple("Many").field(p).finish(),
            Node::Sequence(ps) => f.debug_tuple("Sequence").field(ps).finish(),
            Node::Map(p, _) => write!(f, "Map({:?}, ..)", p),
            Node::Tap(p, _) => write!(f, "Tap({:?}, ..)", p),
            Node::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}


/// A shared reference to a [`Node`].  Cheap to clone; clones refer to the same
/// node.
///
/// Nodes, and the text and child lists they were built from, are owned by the
/// graph itself and not allocated from any [`Sweeper`](crate::Sweeper).  Only
/// the outputs of parsing are.  So sweeping never invalidates a parser, and
/// one graph can be reused across sweeps, sweepers and threads.
#[derive(Clone)]
pub struct Parser(Arc<Node>);

impl Parser {
    /// Wrap a node.
    #[inline]
    pub fn new(node: Node) -> Self {
        Self(Arc::new(node))
    }

    /// Whether both refer to the very same node.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

impl Deref for Parser {
    type Target = Node;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Node> for Parser {
    #[inline]
    fn from(node: Node) -> Self {
        Self::new(node)
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}


/// Always succeeds, consuming nothing and producing `Absence`.
pub fn pure() -> Parser {
    Parser::new(Node::Pure)
}

/// Always fails.
pub fn fail() -> Parser {
    Parser::new(Node::Fail)
}

/// Succeeds, producing `Absence`, only at the end of the input.
pub fn eof() -> Parser {
    Parser::new(Node::Eof)
}

/// Consumes the byte `c`, producing `Absence`.
pub fn expect(c: u8) -> Parser {
    Parser::new(Node::Expect(c))
}

/// Consumes the byte `c`, producing it as a `Character`.
pub fn literal(c: u8) -> Parser {
    Parser::new(Node::Literal(c))
}

/// Consumes exactly `text`, producing a `String` of it.
pub fn string(text: impl AsRef<[u8]>) -> Parser {
    Parser::new(Node::String(text.as_ref().into()))
}

/// Consumes `text` compared without regard to ASCII case, producing a `String`
/// of the input as it was written.
pub fn string_no_case(text: impl AsRef<[u8]>) -> Parser {
    Parser::new(Node::StringNoCase(text.as_ref().into()))
}

/// Consumes one byte that is any of `chars`, producing it as a `Character`.
pub fn any_of(chars: impl AsRef<[u8]>) -> Parser {
    Parser::new(Node::CharsetMember(Charset::new(chars.as_ref())))
}

/// Consumes one byte that is none of `chars`, producing it as a `Character`.
pub fn none_of(chars: impl AsRef<[u8]>) -> Parser {
    Parser::new(Node::CharsetNonMember(Charset::new(chars.as_ref())))
}

/// Runs `parser`, but turns a mismatch into success with `Absence`.
pub fn optional(parser: Parser) -> Parser {
    Parser::new(Node::Optional(parser))
}

/// Runs each of `parsers`, from the same position, until one succeeds.
pub fn choice(parsers: impl IntoIterator<Item = Parser>) -> Parser {
    Parser::new(Node::Choice(parsers.into_iter().collect()))
}

/// Runs `parser` as many times as it matches, producing an `Array` of the
/// outputs.  Never fails on a mismatch.
///
/// `parser` must consume input whenever it succeeds, e.g. must not be an
/// `optional`, or this never finishes.
///
/// The `Array` is one allocation of [`Output::ENCODED_LEN`] bytes per match,
/// so it fails with [`AllocError::TooLarge`] if that exceeds the sweeper's
/// region size.  With [`DEFAULT_REGION_SIZE`] that is past 390 matches.
///
/// [`Output::ENCODED_LEN`]: crate::Output::ENCODED_LEN
/// [`AllocError::TooLarge`]: crate::AllocError::TooLarge
/// [`DEFAULT_REGION_SIZE`]: crate::DEFAULT_REGION_SIZE
pub fn many(parser: Parser) -> Parser {
    Parser::new(Node::Many(parser))
}

/// Runs all of `parsers`, each starting where the previous one ended,
/// producing an `Array` of their outputs.
pub fn sequence(parsers: impl IntoIterator<Item = Parser>) -> Parser {
    Parser::new(Node::Sequence(parsers.into_iter().collect()))
}

/// Runs `parser` and replaces its output with what `f` makes of it.
pub fn map<F>(parser: Parser, f: F) -> Parser
    where F: Fn(Output, &mut dyn Sweeper) -> Result<Output, AllocError> + Send + Sync + 'static,
{
    Parser::new(Node::Map(parser, Arc::new(f)))
}

/// Runs `parser` and calls `f` with its output, which is passed on unchanged.
pub fn tap<F>(parser: Parser, f: F) -> Parser
    where F: Fn(Output, &mut dyn Sweeper) -> Result<(), AllocError> + Send + Sync + 'static,
{
    Parser::new(Node::Tap(parser, Arc::new(f)))
}

/// Defers building a parser until it runs.  A grammar rule can refer to itself
/// through this without the graph containing a cycle.
pub fn lazy<F>(f: F) -> Parser
    where F: Fn() -> Parser + Send + Sync + 'static,
{
    Parser::new(Node::Lazy(Arc::new(f)))
}
