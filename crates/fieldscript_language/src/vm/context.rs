//! The world-state interface scripts execute against.
//!
//! The interpreter never owns world state. It borrows an
//! [`ExecutionContext`] for the duration of a step and reaches variables,
//! flags and entities only through it.

use fieldscript_foundation::{EntityId, RuntimeFault, VarBank};
use fieldscript_storage::FieldState;

// =============================================================================
// ExecutionContext Trait
// =============================================================================

/// Mutable world state supplied by the host.
pub trait ExecutionContext {
    /// Reads a memory-backed variable.
    ///
    /// # Errors
    ///
    /// Faults on banks the context does not serve or addresses out of range.
    fn read_var(&self, bank: VarBank, index: u16) -> Result<i32, RuntimeFault>;

    /// Writes a memory-backed variable, truncating to the bank's width.
    ///
    /// # Errors
    ///
    /// Faults on banks the context does not serve or addresses out of range.
    fn write_var(&mut self, bank: VarBank, index: u16, value: i32) -> Result<(), RuntimeFault>;

    /// Returns a flag.
    ///
    /// # Errors
    ///
    /// Faults on flag indices out of range.
    fn flag(&self, index: u16) -> Result<bool, RuntimeFault>;

    /// Sets or clears a flag.
    ///
    /// # Errors
    ///
    /// Faults on flag indices out of range.
    fn set_flag(&mut self, index: u16, value: bool) -> Result<(), RuntimeFault>;

    /// Returns whether an entity can be walked through.
    ///
    /// # Errors
    ///
    /// Faults if the entity does not exist.
    fn is_passable(&self, entity: EntityId) -> Result<bool, RuntimeFault>;

    /// Sets whether an entity can be walked through.
    ///
    /// # Errors
    ///
    /// Faults if the entity does not exist.
    fn set_passable(&mut self, entity: EntityId, passable: bool) -> Result<(), RuntimeFault>;

    /// Draws the next script-visible random byte.
    fn random_byte(&mut self) -> u8;
}

// =============================================================================
// FieldState
// =============================================================================

impl ExecutionContext for FieldState {
    fn read_var(&self, bank: VarBank, index: u16) -> Result<i32, RuntimeFault> {
        self.read(bank, index)
    }

    fn write_var(&mut self, bank: VarBank, index: u16, value: i32) -> Result<(), RuntimeFault> {
        self.write(bank, index, value)
    }

    fn flag(&self, index: u16) -> Result<bool, RuntimeFault> {
        FieldState::flag(self, index)
    }

    fn set_flag(&mut self, index: u16, value: bool) -> Result<(), RuntimeFault> {
        FieldState::set_flag(self, index, value)
    }

    fn is_passable(&self, entity: EntityId) -> Result<bool, RuntimeFault> {
        FieldState::is_passable(self, entity)
    }

    fn set_passable(&mut self, entity: EntityId, passable: bool) -> Result<(), RuntimeFault> {
        FieldState::set_passable(self, entity, passable)
    }

    fn random_byte(&mut self) -> u8 {
        FieldState::random_byte(self)
    }
}
