//! Integration tests for Layer 3: Engine
//!
//! Tests for the cooperative scheduler: ordering, quotas, waits and
//! snapshots.

mod scheduler;
mod waits;
