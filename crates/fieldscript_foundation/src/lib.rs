//! Core types and error definitions for Fieldscript.
//!
//! This crate provides:
//! - [`EntityId`] - Generational handles for field entities
//! - [`VarBank`] / [`VarRef`] - Addressing into variable and flag banks
//! - [`DecodeError`] - Failures while decoding a script's byte stream
//! - [`RuntimeFault`] - Failures that fault a single running script instance
//! - [`Error`] - Crate-wide error type with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bank;
pub mod entity;
pub mod error;

pub use bank::{TEMP_SLOTS, VarBank, VarRef};
pub use entity::EntityId;
pub use error::{DecodeError, Error, ErrorContext, ErrorKind, RuntimeFault};

/// Result type using the Fieldscript error type.
pub type Result<T> = std::result::Result<T, Error>;
