//! Trace event and record types.

use fieldscript_engine::{InstanceId, SchedulerEvent, WaitEvent};
use fieldscript_foundation::{DecodeError, EntityId, RuntimeFault};
use fieldscript_language::SuspendReason;

// =============================================================================
// Trace Event
// =============================================================================

/// Events that can be traced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// A tick has started.
    TickStart {
        /// The tick number.
        tick: u64,
    },

    /// A tick has ended.
    TickEnd {
        /// The tick number.
        tick: u64,
        /// Instructions executed during the tick.
        executed: usize,
    },

    /// A script decoded and became a program.
    ScriptLoaded {
        /// Script name.
        script: String,
        /// Number of instructions.
        instructions: usize,
    },

    /// A script failed to decode and was not registered.
    DecodeFailed {
        /// Script name.
        script: String,
        /// The failure.
        error: DecodeError,
    },

    /// An instance was registered.
    InstanceSpawned {
        /// New instance.
        instance: InstanceId,
        /// Script it runs.
        script: String,
        /// Owning entity.
        owner: EntityId,
    },

    /// An instruction is about to execute.
    Instruction {
        /// Executing instance.
        instance: InstanceId,
        /// Group start offset.
        offset: usize,
        /// Rendered instruction.
        rendered: String,
    },

    /// An instance blocked.
    Suspended {
        /// Blocked instance.
        instance: InstanceId,
        /// What it waits for.
        reason: SuspendReason,
    },

    /// A host event was delivered.
    Notified {
        /// The event.
        event: WaitEvent,
        /// Instances it released.
        released: Vec<InstanceId>,
    },

    /// An instance was released explicitly.
    Resumed {
        /// Released instance.
        instance: InstanceId,
    },

    /// An instance ended normally.
    Halted {
        /// Ended instance.
        instance: InstanceId,
    },

    /// An instance faulted.
    Faulted {
        /// Faulted instance.
        instance: InstanceId,
        /// The fault.
        fault: RuntimeFault,
    },

    /// An instance used its whole quota.
    Preempted {
        /// Preempted instance.
        instance: InstanceId,
    },

    /// An instance was cancelled.
    Cancelled {
        /// Cancelled instance.
        instance: InstanceId,
    },

    /// Custom user event.
    Custom {
        /// Event name.
        name: String,
        /// Event data.
        data: String,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TickStart { .. } => "tick-start",
            Self::TickEnd { .. } => "tick-end",
            Self::ScriptLoaded { .. } => "script-loaded",
            Self::DecodeFailed { .. } => "decode-failed",
            Self::InstanceSpawned { .. } => "spawned",
            Self::Instruction { .. } => "instruction",
            Self::Suspended { .. } => "suspended",
            Self::Notified { .. } => "notified",
            Self::Resumed { .. } => "resumed",
            Self::Halted { .. } => "halted",
            Self::Faulted { .. } => "faulted",
            Self::Preempted { .. } => "preempted",
            Self::Cancelled { .. } => "cancelled",
            Self::Custom { .. } => "custom",
        }
    }

    /// Returns true if this is a tick boundary event.
    #[must_use]
    pub fn is_tick_boundary(&self) -> bool {
        matches!(self, Self::TickStart { .. } | Self::TickEnd { .. })
    }

    /// Returns the instance the event concerns, if any.
    #[must_use]
    pub fn instance(&self) -> Option<InstanceId> {
        match self {
            Self::InstanceSpawned { instance, .. }
            | Self::Instruction { instance, .. }
            | Self::Suspended { instance, .. }
            | Self::Resumed { instance }
            | Self::Halted { instance }
            | Self::Faulted { instance, .. }
            | Self::Preempted { instance }
            | Self::Cancelled { instance } => Some(*instance),
            _ => None,
        }
    }
}

impl From<SchedulerEvent> for TraceEvent {
    fn from(event: SchedulerEvent) -> Self {
        match event {
            SchedulerEvent::Executed {
                instance,
                offset,
                instruction,
            } => Self::Instruction {
                instance,
                offset,
                rendered: instruction,
            },
            SchedulerEvent::Suspended { instance, reason } => Self::Suspended { instance, reason },
            SchedulerEvent::Halted { instance } => Self::Halted { instance },
            SchedulerEvent::Faulted { instance, fault } => Self::Faulted { instance, fault },
            SchedulerEvent::QuotaExhausted { instance } => Self::Preempted { instance },
        }
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// The tick when this event occurred.
    pub tick: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, tick: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            tick,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

// =============================================================================
// Tests
// =============================================================================
