use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::checker::CharClass;
use crate::errors::Error;

/// One slot in a [`FixedGroup`]: exactly `width` characters, all of them
/// belonging to `class`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FixedSlot {
    name: Option<Arc<str>>,
    width: usize,
    class: CharClass,
}

impl FixedSlot {
    /// Creates an anonymous slot.
    pub fn new(width: usize, class: CharClass) -> Self {
        Self { name: None, width, class }
    }

    /// Sets the name under which the slot is captured.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&Arc<str>> {
        self.name.as_ref()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn class(&self) -> &CharClass {
        &self.class
    }
}

/// A group of consecutive fixed-width slots.
///
/// Fixed groups extract structured data from inputs with a rigid layout,
/// like dates or serial numbers, without going through a full sub-grammar.
/// When used as the payload of a pattern entry, the parse result gets one
/// sub-entry per slot.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
#[serde(try_from = "FixedGroupRepr")]
pub struct FixedGroup {
    slots: Vec<FixedSlot>,
}

#[derive(Deserialize)]
struct FixedGroupRepr {
    slots: Vec<FixedSlot>,
}

impl TryFrom<FixedGroupRepr> for FixedGroup {
    type Error = Error;

    fn try_from(repr: FixedGroupRepr) -> Result<Self, Self::Error> {
        FixedGroup::new(repr.slots)
    }
}

impl FixedGroup {
    /// Creates a new fixed group.
    ///
    /// Fails if `slots` is empty or any of the slots has zero width.
    pub fn new(slots: Vec<FixedSlot>) -> Result<Self, Error> {
        if slots.is_empty() {
            return Err(Error::InvalidFixedGroup(
                "a fixed group must have at least one slot".to_string(),
            ));
        }
        if let Some(pos) = slots.iter().position(|slot| slot.width == 0) {
            return Err(Error::InvalidFixedGroup(format!(
                "slot #{} has zero width",
                pos
            )));
        }
        Ok(Self { slots })
    }

    #[inline]
    pub fn slots(&self) -> &[FixedSlot] {
        self.slots.as_slice()
    }

    /// Matches the group at `offset`, calling `f` with the index and end
    /// offset of every slot. Returns the length of the whole group.
    ///
    /// `f` may be called for some slots even if the group as a whole
    /// doesn't match.
    pub(crate) fn match_slots(
        &self,
        text: &str,
        offset: usize,
        mut f: impl FnMut(usize, usize),
    ) -> Option<usize> {
        let mut pos = offset;
        for (i, slot) in self.slots.iter().enumerate() {
            for _ in 0..slot.width {
                pos += slot.class.match_at(text, pos)?;
            }
            f(i, pos);
        }
        Some(pos - offset)
    }

    #[inline]
    pub(crate) fn match_at(&self, text: &str, offset: usize) -> Option<usize> {
        self.match_slots(text, offset, |_, _| {})
    }
}

impl Display for FixedGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if let Some(name) = &slot.name {
                write!(f, "{}=", name)?;
            }
            write!(f, "{}:{}", slot.width, slot.class)?;
        }
        write!(f, "}}")
    }
}
