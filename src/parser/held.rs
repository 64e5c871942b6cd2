//! Input units and the held-sequence buffer
//!
//! Every character the parser sees travels together with a caller-defined
//! tag. While the parser cannot yet tell whether a run of characters is a
//! terminal response or user input, those units sit in a [`HeldBuffer`] in
//! arrival order so they can either be stitched back into a response string
//! or replayed unchanged.

use std::fmt;

use serde::Serialize;

/// A single character plus the caller's correlation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InputUnit<T> {
    /// The character
    pub ch: char,
    /// Opaque tag, echoed back unchanged on passthrough
    pub tag: T,
}

impl<T> InputUnit<T> {
    /// Create a tagged unit
    pub fn new(ch: char, tag: T) -> Self {
        Self { ch, tag }
    }
}

impl InputUnit<()> {
    /// Create an untagged unit
    pub fn plain(ch: char) -> Self {
        Self { ch, tag: () }
    }
}

impl<T> From<(char, T)> for InputUnit<T> {
    fn from((ch, tag): (char, T)) -> Self {
        Self { ch, tag }
    }
}

impl From<char> for InputUnit<()> {
    fn from(ch: char) -> Self {
        Self::plain(ch)
    }
}

/// Units accumulated while an escape sequence is in flight
pub struct HeldBuffer<T> {
    units: Vec<InputUnit<T>>,
}

impl<T> Default for HeldBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HeldBuffer<T> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            // ESC [ < b ; x ; y M fits comfortably
            units: Vec::with_capacity(16),
        }
    }

    /// Append a unit at the end
    pub fn push(&mut self, unit: InputUnit<T>) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The held units in arrival order
    pub fn units(&self) -> &[InputUnit<T>] {
        &self.units
    }

    /// Characters of the held units, in order
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.units.iter().map(|unit| unit.ch)
    }

    /// Reconstruct the held sequence as a string
    pub fn to_text(&self) -> String {
        self.chars().collect()
    }

    /// Take every held unit, leaving the buffer empty
    pub fn drain(&mut self) -> impl Iterator<Item = InputUnit<T>> + '_ {
        self.units.drain(..)
    }

    /// Drop every held unit
    pub fn clear(&mut self) {
        self.units.clear();
    }
}

impl<T> fmt::Debug for HeldBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeldBuffer")
            .field("text", &self.to_text())
            .field("len", &self.units.len())
            .finish()
    }
}
