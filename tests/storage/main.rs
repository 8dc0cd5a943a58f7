//! Integration tests for Layer 1: Storage
//!
//! Tests for field memory, flags, entities and the random stream.

mod entities;
mod field;
