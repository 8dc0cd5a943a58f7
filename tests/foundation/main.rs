//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: `EntityId`, variable banks and errors.

mod banks;
mod errors;
