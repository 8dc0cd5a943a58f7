//! Execution tracing for Fieldscript.
//!
//! This crate provides:
//! - [`Tracer`] - Records scheduler activity into a bounded buffer
//! - [`TraceBuffer`] - Ring buffer of timestamped records
//! - [`HumanFormatter`] / [`JsonFormatter`] - Record rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod trace;

pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceEvent, TraceFormatter,
    TraceFormat, TraceOutput, TraceRecord, Tracer, TracerConfig,
};
