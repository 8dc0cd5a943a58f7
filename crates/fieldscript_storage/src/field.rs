//! Field state: everything scripts on the current field read and mutate.
//!
//! `FieldState` is cheap to clone (all collections are persistent), which
//! lets the runtime keep snapshots and compare before/after states in tests.

use fieldscript_foundation::{EntityId, RuntimeFault, VarBank};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::entity::{EntityRecord, EntityTable};
use crate::memory::FieldMemory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of addressable flags.
pub const FLAG_COUNT: usize = 2048;

/// Mutable world state for one field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldState {
    memory: FieldMemory,
    flags: im::OrdSet<u16>,
    entities: EntityTable,
    /// Seed for the script-visible random stream.
    seed: u64,
    /// Number of random words drawn so far.
    draws: u64,
}

impl Default for FieldState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl FieldState {
    /// Creates an empty field with the given random seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            memory: FieldMemory::default(),
            flags: im::OrdSet::new(),
            entities: EntityTable::new(),
            seed,
            draws: 0,
        }
    }

    /// Replaces the memory with a zeroed block of the given size.
    #[must_use]
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory = FieldMemory::new(size);
        self
    }

    /// Returns the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the field memory.
    #[must_use]
    pub fn memory(&self) -> &FieldMemory {
        &self.memory
    }

    /// Returns the entity table.
    #[must_use]
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Reads a memory-backed variable.
    ///
    /// # Errors
    ///
    /// Faults on non-memory banks and out-of-range addresses.
    pub fn read(&self, bank: VarBank, index: u16) -> Result<i32, RuntimeFault> {
        self.memory.read(bank, index)
    }

    /// Writes a memory-backed variable.
    ///
    /// # Errors
    ///
    /// Faults on non-memory banks and out-of-range addresses.
    pub fn write(&mut self, bank: VarBank, index: u16, value: i32) -> Result<(), RuntimeFault> {
        self.memory.write(bank, index, value)
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// Returns the value of a flag.
    ///
    /// # Errors
    ///
    /// Faults on indices past [`FLAG_COUNT`].
    pub fn flag(&self, index: u16) -> Result<bool, RuntimeFault> {
        check_flag(index)?;
        Ok(self.flags.contains(&index))
    }

    /// Sets or clears a flag.
    ///
    /// # Errors
    ///
    /// Faults on indices past [`FLAG_COUNT`].
    pub fn set_flag(&mut self, index: u16, value: bool) -> Result<(), RuntimeFault> {
        check_flag(index)?;
        if value {
            self.flags.insert(index);
        } else {
            self.flags.remove(&index);
        }
        Ok(())
    }

    /// Iterates the set flags in ascending order.
    pub fn set_flags(&self) -> impl Iterator<Item = u16> + '_ {
        self.flags.iter().copied()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Places a new entity on the field.
    pub fn spawn_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.entities.spawn(EntityRecord::new(name))
    }

    /// Removes an entity from the field.
    ///
    /// # Errors
    ///
    /// Faults if the handle is stale.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<EntityRecord, RuntimeFault> {
        self.entities.destroy(id)
    }

    /// Returns an entity's record.
    ///
    /// # Errors
    ///
    /// Faults if the handle is stale.
    pub fn entity(&self, id: EntityId) -> Result<&EntityRecord, RuntimeFault> {
        self.entities.get(id)
    }

    /// Returns whether an entity can be walked through.
    ///
    /// # Errors
    ///
    /// Faults if the handle is stale.
    pub fn is_passable(&self, id: EntityId) -> Result<bool, RuntimeFault> {
        Ok(self.entities.get(id)?.passable)
    }

    /// Sets whether an entity can be walked through.
    ///
    /// # Errors
    ///
    /// Faults if the handle is stale.
    pub fn set_passable(&mut self, id: EntityId, passable: bool) -> Result<(), RuntimeFault> {
        self.entities.get_mut(id)?.passable = passable;
        Ok(())
    }

    // =========================================================================
    // Randomness
    // =========================================================================

    /// Draws the next byte of the field's deterministic random stream.
    ///
    /// The stream position is part of the state, so a restored snapshot
    /// continues with the same bytes the original would have produced.
    pub fn random_byte(&mut self) -> u8 {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_word_pos(u128::from(self.draws));
        self.draws += 1;
        rng.next_u32().to_le_bytes()[0]
    }
}

fn check_flag(index: u16) -> Result<(), RuntimeFault> {
    if usize::from(index) < FLAG_COUNT {
        Ok(())
    } else {
        Err(RuntimeFault::AddressOutOfRange {
            bank: VarBank::Flag,
            index,
        })
    }
}
