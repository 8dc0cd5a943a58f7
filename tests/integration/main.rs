//! End-to-end tests for Layer 5: Runtime
//!
//! Scripts are assembled to bytes, loaded into a [`Session`] and driven
//! frame by frame, the way a host would.
//!
//! [`Session`]: fieldscript_runtime::Session

mod scenarios;
mod session;
mod snapshots;
