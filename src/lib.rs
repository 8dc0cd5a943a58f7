//! Fieldscript - field-script bytecode engine
//!
//! This crate re-exports all layers of the Fieldscript system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: fieldscript_runtime   : Session, snapshots, REPL, CLI
//! Layer 4: fieldscript_debug     : Trace records, ring buffer, formatters
//! Layer 3: fieldscript_engine    : Script instances, cooperative scheduler
//! Layer 2: fieldscript_language  : Expressions, opcode table, decoder, VM step
//! Layer 1: fieldscript_storage   : Field memory, flags, entities
//! Layer 0: fieldscript_foundation: Core types (EntityId, VarBank, errors)
//! ```

pub use fieldscript_debug as debug;
pub use fieldscript_engine as engine;
pub use fieldscript_foundation as foundation;
pub use fieldscript_language as language;
pub use fieldscript_runtime as runtime;
pub use fieldscript_storage as storage;
