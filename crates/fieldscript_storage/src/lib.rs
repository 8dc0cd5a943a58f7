//! Field memory, flags, and entity state for Fieldscript.
//!
//! This crate provides:
//! - [`FieldMemory`] - Byte-addressed variable memory with typed views
//! - [`EntityTable`] - Generational allocation of field entities
//! - [`FieldState`] - The world state scripts read and mutate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod field;
pub mod memory;

pub use entity::{EntityRecord, EntityTable};
pub use field::{FLAG_COUNT, FieldState};
pub use memory::{FieldMemory, MEMORY_SIZE};
