use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-checked address of an entity slot.
///
/// Slots are reused after an entity is destroyed; the generation is bumped on
/// every release so an id held past its entity's lifetime no longer resolves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
