//! The tagged value produced by successful parses, and its owned mirror.

use std::fmt;

use crate::{AllocError, Block, Sweeper};


/// The value a successful parse produces.
///
/// Strings and arrays live in the [`Sweeper`] the parse allocated from; this
/// is just a tagged handle to them, so it is `Copy` and stays valid exactly as
/// long as that memory does (until the sweeper's next sweep).  Use
/// [`to_value`](Output::to_value) to get an owned copy of a whole tree.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Output {
    /// Nothing.  Produced by matchers whose value is dropped.
    Absence,
    /// A single input byte.
    Character(u8),
    /// A byte string.
    String(Block),
    /// An ordered sequence of other `Output`s, possibly arrays themselves.
    Array(Block),
}

const TAG_ABSENCE: u8 = 0;
const TAG_CHARACTER: u8 = 1;
const TAG_STRING: u8 = 2;
const TAG_ARRAY: u8 = 3;

impl Output {
    /// Size of the fixed encoding of one array element: a tag byte followed by
    /// the payload.
    pub const ENCODED_LEN: usize = 1 + Block::ENCODED_LEN;

    /// Allocate a copy of `text` and make a `String` of it.
    pub fn string(sweeper: &mut dyn Sweeper, text: &[u8]) -> Result<Self, AllocError> {
        Ok(Output::String(sweeper.duplicate(text)?))
    }

    /// Allocate storage for `elements` and make an `Array` of them.  The
    /// elements themselves are not deep-copied.
    pub fn array(sweeper: &mut dyn Sweeper, elements: &[Output]) -> Result<Self, AllocError> {
        let size = elements.len().checked_mul(Self::ENCODED_LEN)
                                 .ok_or(AllocError::TooLarge { requested: usize::MAX,
                                                               capacity: 0 })?;
        let block = sweeper.allocate(size)?;
        let bytes = sweeper.bytes_mut(block)?;
        for (dst, element) in bytes.chunks_exact_mut(Self::ENCODED_LEN).zip(elements) {
            element.encode(dst);
        }
        Ok(Output::Array(block))
    }

    /// Whether this is `Absence`.
    #[inline]
    pub fn is_absence(&self) -> bool {
        matches!(self, Output::Absence)
    }

    /// The bytes of a `String`, or `None` for any other variant.
    pub fn string_bytes<'s>(&self, sweeper: &'s dyn Sweeper)
                            -> Result<Option<&'s [u8]>, AllocError>
    {
        match *self {
            Output::String(block) => sweeper.bytes(block).map(Some),
            _ => Ok(None),
        }
    }

    /// The number of elements of an `Array`, or `None` for any other variant.
    #[inline]
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Output::Array(block) => Some(block.len() / Self::ENCODED_LEN),
            _ => None,
        }
    }

    /// Element `index` of an `Array`.  `None` for any other variant or when
    /// `index` is out of range.
    pub fn element(&self, sweeper: &dyn Sweeper, index: usize)
                   -> Result<Option<Output>, AllocError>
    {
        match *self {
            Output::Array(block) => {
                let bytes = sweeper.bytes(block)?;
                let span = index.checked_mul(Self::ENCODED_LEN)
                                .and_then(|start| Some(start .. start.checked_add(Self::ENCODED_LEN)?));
                match span.and_then(|span| bytes.get(span)) {
                    Some(encoded) => Self::decode(encoded).map(Some),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// All elements of an `Array`, or `None` for any other variant.
    pub fn elements(&self, sweeper: &dyn Sweeper) -> Result<Option<Vec<Output>>, AllocError> {
        match *self {
            Output::Array(block) =>
                sweeper.bytes(block)?
                       .chunks_exact(Self::ENCODED_LEN)
                       .map(Self::decode)
                       .collect::<Result<Vec<_>, _>>()
                       .map(Some),
            _ => Ok(None),
        }
    }

    /// Copy this whole tree out of the sweeper.
    pub fn to_value(&self, sweeper: &dyn Sweeper) -> Result<Value, AllocError> {
        Ok(match *self {
            Output::Absence => Value::Absence,
            Output::Character(c) => Value::Character(c),
            Output::String(block) => Value::String(sweeper.bytes(block)?.to_vec()),
            Output::Array(_) => {
                let elements = self.elements(sweeper)?.unwrap_or_default();
                Value::Array(elements.iter()
                                     .map(|e| e.to_value(sweeper))
                                     .collect::<Result<_, _>>()?)
            }
        })
    }

    fn encode(&self, dst: &mut [u8]) {
        dst.fill(0);
        match *self {
            Output::Absence => dst[0] = TAG_ABSENCE,
            Output::Character(c) => {
                dst[0] = TAG_CHARACTER;
                dst[1] = c;
            }
            Output::String(block) => {
                dst[0] = TAG_STRING;
                block.encode(&mut dst[1 ..]);
            }
            Output::Array(block) => {
                dst[0] = TAG_ARRAY;
                block.encode(&mut dst[1 ..]);
            }
        }
    }

    fn decode(src: &[u8]) -> Result<Self, AllocError> {
        match src.first() {
            Some(&TAG_ABSENCE) => Ok(Output::Absence),
            Some(&TAG_CHARACTER) =>
                src.get(1).map(|&c| Output::Character(c)).ok_or(AllocError::Corrupt),
            Some(&TAG_STRING) => Ok(Output::String(Block::decode(&src[1 ..])?)),
            Some(&TAG_ARRAY) => Ok(Output::Array(Block::decode(&src[1 ..])?)),
            _ => Err(AllocError::Corrupt),
        }
    }
}


/// An owned copy of an [`Output`] tree that no longer depends on any sweeper.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Nothing.
    Absence,
    /// A single byte.
    Character(u8),
    /// A byte string.
    String(Vec<u8>),
    /// An ordered sequence.
    Array(Vec<Value>),
}

impl Value {
    /// A `String` of the bytes of `text`.
    pub fn text(text: &str) -> Self {
        Value::String(text.as_bytes().to_vec())
    }

    /// An `Array` of `Character`s, one per byte of `text`.
    pub fn chars(text: &str) -> Self {
        Value::Array(text.bytes().map(Value::Character).collect())
    }

    /// An `Array` of `String`s.
    pub fn texts(texts: &[&str]) -> Self {
        Value::Array(texts.iter().map(|t| Value::text(t)).collect())
    }

    /// The bytes, if this is a `String`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Strings print as (lossily decoded) text to keep test failures readable.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absence => f.write_str("Absence"),
            Value::Character(c) => write!(f, "Character({:?})", char::from(*c)),
            Value::String(s) => write!(f, "String({:?})", String::from_utf8_lossy(s)),
            Value::Array(a) => {
                f.write_str("Array")?;
                f.debug_list().entries(a).finish()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arena;

    #[test]
    fn strings() {
        let mut arena = Arena::new(64);
        let s = Output::string(&mut arena, b"abc").unwrap();
        assert_eq!(s.string_bytes(&arena), Ok(Some(&b"abc"[..])));
        assert_eq!(Output::Character(b'a').string_bytes(&arena), Ok(None));
        assert_eq!(s.to_value(&arena), Ok(Value::text("abc")));
    }

    #[test]
    fn nested_arrays() {
        let mut arena = Arena::new(256);
        let s = Output::string(&mut arena, b"xy").unwrap();
        let inner = Output::array(&mut arena, &[Output::Character(b'q'), Output::Absence])
                          .unwrap();
        let outer = Output::array(&mut arena, &[s, inner, Output::Character(b'z')]).unwrap();

        assert_eq!(outer.array_len(), Some(3));
        assert_eq!(outer.element(&arena, 1), Ok(Some(inner)));
        assert_eq!(outer.element(&arena, 3), Ok(None));
        assert_eq!(s.array_len(), None);
        assert_eq!(outer.to_value(&arena),
                   Ok(Value::Array(vec![
                       Value::text("xy"),
                       Value::Array(vec![Value::Character(b'q'), Value::Absence]),
                       Value::Character(b'z'),
                   ])));
    }

    #[test]
    fn huge_index() {
        let mut arena = Arena::new(64);
        let arr = Output::array(&mut arena, &[Output::Character(b'a'), Output::Character(b'b')])
                        .unwrap();
        assert_eq!(arr.element(&arena, usize::MAX), Ok(None));
        // Wraps around to a small, misaligned offset if multiplied unchecked.
        let wrapping = (usize::MAX / Output::ENCODED_LEN) + 1;
        assert_eq!(arr.element(&arena, wrapping), Ok(None));
    }

    #[test]
    fn empty_array() {
        let mut arena = Arena::new(8);
        let a = Output::array(&mut arena, &[]).unwrap();
        assert_eq!(a.array_len(), Some(0));
        assert_eq!(a.elements(&arena), Ok(Some(vec![])));
        assert_eq!(a.to_value(&arena), Ok(Value::Array(vec![])));
    }

    #[test]
    fn corrupt() {
        let mut arena = Arena::new(64);
        let block = arena.allocate(Output::ENCODED_LEN).unwrap();
        arena.bytes_mut(block).unwrap()[0] = 9;
        assert_eq!(Output::Array(block).element(&arena, 0), Err(AllocError::Corrupt));
    }

    #[test]
    fn swept() {
        let mut arena = Arena::new(64);
        let s = Output::string(&mut arena, b"gone").unwrap();
        arena.sweep();
        assert!(matches!(s.to_value(&arena), Err(AllocError::Stale { .. })));
    }

    #[test]
    fn value_debug() {
        assert_eq!(format!("{:?}", Value::Array(vec![Value::text("a"), Value::Character(b'b')])),
                   r#"Array[String("a"), Character('b')]"#);
    }
}
