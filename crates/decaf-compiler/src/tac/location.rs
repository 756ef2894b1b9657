//! Storage locations.

use std::fmt;

use decaf_core::WORD_SIZE;

/// Register a location's offset is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Relative to the frame pointer: parameters, locals and temporaries.
    FpRelative,
    /// Relative to the global pointer: global variables.
    GpRelative,
}

/// A word of storage.
///
/// A location with a base is one level of indirection: the word at
/// `offset` bytes past the address held in the base location. Fields read
/// through the implicit `this` use this form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    segment: Segment,
    offset: i32,
    name: String,
    base: Option<Box<Location>>,
}

impl Location {
    pub fn new(segment: Segment, offset: i32, name: impl Into<String>) -> Self {
        debug_assert_eq!(offset % WORD_SIZE, 0, "unaligned location");
        Self {
            segment,
            offset,
            name: name.into(),
            base: None,
        }
    }

    /// A frame slot.
    pub fn frame(offset: i32, name: impl Into<String>) -> Self {
        Self::new(Segment::FpRelative, offset, name)
    }

    /// A global slot.
    pub fn global(offset: i32, name: impl Into<String>) -> Self {
        Self::new(Segment::GpRelative, offset, name)
    }

    /// The word `offset` bytes past the address held in `base`.
    pub fn based(base: Location, offset: i32, name: impl Into<String>) -> Self {
        Self {
            base: Some(Box::new(base)),
            ..Self::new(Segment::FpRelative, offset, name)
        }
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Location> {
        self.base.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
