//! Ready-made functions for [`map`](crate::map) and [`tap`](crate::tap).
//!
//! The [`combinator`](crate::combinator) module wraps these into parsers, but
//! they can also be given directly to `map` and `tap` to apply them to any
//! parser.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{AllocError, Block, Output, Sweeper};


/// Replace any output with `Absence`.
pub fn skip(_output: Output, _sweeper: &mut dyn Sweeper) -> Result<Output, AllocError> {
    Ok(Output::Absence)
}

/// Flatten an output tree into one `String`: `Absence` is empty, a
/// `Character` is itself, and an `Array` is the concatenation, depth first,
/// of its elements.  A `String` is returned unchanged.  Everything else is
/// copied in a single allocation.
pub fn concat_string(output: Output, sweeper: &mut dyn Sweeper) -> Result<Output, AllocError> {
    if let Output::String(_) = output {
        return Ok(output);
    }
    let mut text = Vec::new();
    flatten(output, sweeper, &mut text)?;
    Output::string(sweeper, &text)
}

fn flatten(output: Output, sweeper: &dyn Sweeper, text: &mut Vec<u8>) -> Result<(), AllocError> {
    match output {
        Output::Absence => {}
        Output::Character(c) => text.push(c),
        Output::String(block) => text.extend_from_slice(sweeper.bytes(block)?),
        Output::Array(_) =>
            for element in output.elements(sweeper)?.unwrap_or_default() {
                flatten(element, sweeper, text)?;
            },
    }
    Ok(())
}

/// Splice the elements of every `Array` element of an `Array` into it, one
/// level deep.  Other elements stay as they are, and a non-array is returned
/// unchanged.
pub fn concat_array(output: Output, sweeper: &mut dyn Sweeper) -> Result<Output, AllocError> {
    let Some(elements) = output.elements(sweeper)? else {
        return Ok(output);
    };
    let mut flat = Vec::with_capacity(elements.len());
    for element in elements {
        match element.elements(sweeper)? {
            Some(inner) => flat.extend(inner),
            None => flat.push(element),
        }
    }
    Output::array(sweeper, &flat)
}

/// Make a function that picks element `index` of an `Array`, or gives
/// `Absence` when there is no such element.  A non-array is returned
/// unchanged.
pub fn select(index: usize)
              -> impl Fn(Output, &mut dyn Sweeper) -> Result<Output, AllocError>
                     + Copy + Send + Sync + 'static
{
    move |output, sweeper| {
        if output.array_len().is_none() {
            return Ok(output);
        }
        Ok(output.element(sweeper, index)?.unwrap_or(Output::Absence))
    }
}

/// Make an observer that stores the block of a `String` output in `slot`, or
/// clears `slot` for any other output.
pub fn copy_string_ref(slot: &Slot<Block>)
                       -> impl Fn(Output, &mut dyn Sweeper) -> Result<(), AllocError>
                              + Send + Sync + 'static
{
    let slot = slot.clone();
    move |output, _| {
        match output {
            Output::String(block) => slot.set(block),
            _ => slot.clear(),
        }
        Ok(())
    }
}

/// Make an observer that stores, for an `Array` output, the block of each
/// element that is a `String` (`None` for the others) in `slot`.  Clears
/// `slot` for any other output.
pub fn copy_string_array_ref(slot: &Slot<Vec<Option<Block>>>)
                             -> impl Fn(Output, &mut dyn Sweeper) -> Result<(), AllocError>
                                    + Send + Sync + 'static
{
    let slot = slot.clone();
    move |output, sweeper| {
        match output.elements(sweeper)? {
            Some(elements) =>
                slot.set(elements.into_iter()
                                 .map(|e| match e {
                                     Output::String(block) => Some(block),
                                     _ => None,
                                 })
                                 .collect()),
            None => slot.clear(),
        }
        Ok(())
    }
}


/// A place, held by the host, that observers write results into.
///
/// Clones share the same place, so a clone can be moved into an observer
/// while the host keeps another to read from after parsing.  Can be shared
/// across threads along with the parser that writes to it.
pub struct Slot<T>(Arc<Mutex<Option<T>>>);

impl<T> Slot<T> {
    /// An empty slot.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    /// Store `value`, replacing any previous one.
    pub fn set(&self, value: T) {
        *self.lock() = Some(value);
    }

    /// Make empty.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Remove and return the stored value.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Whether a value is stored.
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// A copy of the stored value.
    pub fn get(&self) -> Option<T>
        where T: Clone,
    {
        self.lock().clone()
    }

    /// A panicking observer cannot leave a half-written value behind, so a
    /// poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Must implement this manually because deriving would require `T: Clone`.
impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Slot<T>
    where T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.lock()).finish()
    }
}
