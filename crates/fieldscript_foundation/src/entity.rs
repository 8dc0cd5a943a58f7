//! Generational handles for field entities.

use std::fmt;

/// Handle to an entity placed on the field (an NPC, a door, a trigger line).
///
/// Slots are reused when a field is reloaded; the generation counter makes a
/// handle from a previous scene compare unequal to the slot's new occupant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId {
    /// Slot in the field's entity table.
    pub slot: u32,
    /// Generation of the slot when the handle was issued.
    pub generation: u32,
}

impl EntityId {
    /// Creates a handle for the given slot and generation.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.slot, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.slot)
    }
}
