//! Session, snapshots, REPL and CLI for Fieldscript.
//!
//! This crate provides:
//! - [`Session`] - Field state, loaded scripts, scheduler and timers in one place
//! - [`SessionSnapshot`] - `MessagePack` save and restore
//! - [`Repl`] - Interactive command loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod repl;
pub mod serialize;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{Command, Repl, demo_script};
pub use serialize::{SessionSnapshot, from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::Session;
