//! Field entity table with generational slots.
//!
//! Slots are handed out from a free list when available. Destroying an
//! entity bumps its slot's generation so handles held by scripts from an
//! earlier scene stop resolving.

#![allow(clippy::cast_possible_truncation)]

use fieldscript_foundation::{EntityId, RuntimeFault};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-entity state scripts can observe or change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityRecord {
    /// Display name, for tooling.
    pub name: String,
    /// Whether other entities may walk through this one.
    pub passable: bool,
}

impl EntityRecord {
    /// Creates a solid (non-passable) entity record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passable: false,
        }
    }
}

/// Allocates entity handles and stores their records.
///
/// Even generations are free, odd generations are alive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityTable {
    generations: Vec<u32>,
    free_list: Vec<u32>,
    records: im::OrdMap<u32, EntityRecord>,
}

impl EntityTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a new entity and returns its handle.
    pub fn spawn(&mut self, record: EntityRecord) -> EntityId {
        let slot = if let Some(slot) = self.free_list.pop() {
            self.generations[slot as usize] += 1;
            slot
        } else {
            self.generations.push(1);
            (self.generations.len() - 1) as u32
        };
        self.records.insert(slot, record);
        EntityId::new(slot, self.generations[slot as usize])
    }

    /// Removes an entity.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::UnknownEntity`] if the handle is stale or was
    /// never issued.
    pub fn destroy(&mut self, id: EntityId) -> Result<EntityRecord, RuntimeFault> {
        self.validate(id)?;
        self.generations[id.slot as usize] += 1;
        self.free_list.push(id.slot);
        self.records
            .remove(&id.slot)
            .ok_or(RuntimeFault::UnknownEntity(id))
    }

    /// Returns true if the handle names a live entity.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.validate(id).is_ok()
    }

    fn validate(&self, id: EntityId) -> Result<(), RuntimeFault> {
        match self.generations.get(id.slot as usize) {
            Some(&generation) if generation == id.generation && generation % 2 == 1 => Ok(()),
            _ => Err(RuntimeFault::UnknownEntity(id)),
        }
    }

    /// Looks up a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::UnknownEntity`] for stale or unknown handles.
    pub fn get(&self, id: EntityId) -> Result<&EntityRecord, RuntimeFault> {
        self.validate(id)?;
        self.records
            .get(&id.slot)
            .ok_or(RuntimeFault::UnknownEntity(id))
    }

    /// Looks up a live entity for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::UnknownEntity`] for stale or unknown handles.
    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, RuntimeFault> {
        self.validate(id)?;
        self.records
            .get_mut(&id.slot)
            .ok_or(RuntimeFault::UnknownEntity(id))
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> + '_ {
        self.records
            .iter()
            .map(|(&slot, record)| (EntityId::new(slot, self.generations[slot as usize]), record))
    }
}
