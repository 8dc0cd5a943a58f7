//! Cooperative scheduling of Fieldscript instances.
//!
//! This crate provides:
//! - [`Scheduler`] - Round-robin, quota-bounded execution of many instances
//! - [`Instance`] / [`ExecState`] - Per-instance execution point and lifecycle
//! - [`WaitEvent`] - Host notifications that release suspended instances
//! - [`TickReport`] - What happened during one frame

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod event;
pub mod instance;
pub mod scheduler;

pub use config::{DEFAULT_INSTRUCTION_QUOTA, SchedulerConfig};
pub use event::{SchedulerEvent, TickReport, WaitEvent};
pub use instance::{ExecState, Instance, InstanceId, InstanceSnapshot};
pub use scheduler::{Scheduler, SchedulerSnapshot};
