//! Integration tests for Layer 2: Language
//!
//! Tests for decoding byte streams, rendering listings and stepping the VM.

mod decoder;
mod disasm;
mod vm;
