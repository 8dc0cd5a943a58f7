//! Events flowing into and out of the scheduler.

use std::fmt;

use fieldscript_foundation::{EntityId, RuntimeFault};
use fieldscript_language::SuspendReason;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instance::InstanceId;

// =============================================================================
// Wait Events
// =============================================================================

/// A host notification that may release suspended instances.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WaitEvent {
    /// A message window on this channel closed.
    DialogueClosed {
        /// Window channel.
        channel: i32,
    },
    /// An animation finished playing on an entity.
    AnimationFinished {
        /// Animated entity.
        entity: EntityId,
        /// Animation id.
        animation: u16,
    },
    /// The timer an instance was waiting on elapsed.
    TimerElapsed {
        /// The waiting instance.
        instance: InstanceId,
    },
}

impl WaitEvent {
    /// Returns true if this event ends the given instance's wait.
    #[must_use]
    pub fn releases(&self, instance: InstanceId, reason: &SuspendReason) -> bool {
        match (self, reason) {
            (Self::DialogueClosed { channel }, SuspendReason::Dialogue { channel: c, .. }) => {
                channel == c
            }
            (
                Self::AnimationFinished { entity, animation },
                SuspendReason::Animation {
                    entity: e,
                    animation: a,
                },
            ) => entity == e && animation == a,
            (Self::TimerElapsed { instance: target }, SuspendReason::Timer { .. }) => {
                *target == instance
            }
            _ => false,
        }
    }
}

impl fmt::Display for WaitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DialogueClosed { channel } => write!(f, "dialogue-closed(channel {channel})"),
            Self::AnimationFinished { entity, animation } => {
                write!(f, "animation-finished({animation} on {entity})")
            }
            Self::TimerElapsed { instance } => write!(f, "timer-elapsed({instance})"),
        }
    }
}

// =============================================================================
// Scheduler Events
// =============================================================================

/// Something that happened to an instance during a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// An instruction is about to execute. Only reported when instruction
    /// tracing is on.
    Executed {
        /// Executing instance.
        instance: InstanceId,
        /// Group start offset of the instruction.
        offset: usize,
        /// Rendered instruction.
        instruction: String,
    },
    /// The instance blocked.
    Suspended {
        /// Blocked instance.
        instance: InstanceId,
        /// What it waits for.
        reason: SuspendReason,
    },
    /// The instance ended normally.
    Halted {
        /// Ended instance.
        instance: InstanceId,
    },
    /// The instance hit a runtime fault.
    Faulted {
        /// Faulted instance.
        instance: InstanceId,
        /// The fault.
        fault: RuntimeFault,
    },
    /// The instance used its whole quota and stays runnable.
    QuotaExhausted {
        /// Preempted instance.
        instance: InstanceId,
    },
}

impl SchedulerEvent {
    /// The instance the event concerns.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        match self {
            Self::Executed { instance, .. }
            | Self::Suspended { instance, .. }
            | Self::Halted { instance }
            | Self::Faulted { instance, .. }
            | Self::QuotaExhausted { instance } => *instance,
        }
    }
}

// =============================================================================
// Tick Report
// =============================================================================

/// What happened during one tick, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Instructions executed across all instances.
    pub executed: usize,
    /// Events in the order they happened.
    pub events: Vec<SchedulerEvent>,
}

impl TickReport {
    /// Instances that faulted this tick.
    #[must_use]
    pub fn faulted(&self) -> Vec<(InstanceId, &RuntimeFault)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SchedulerEvent::Faulted { instance, fault } => Some((*instance, fault)),
                _ => None,
            })
            .collect()
    }

    /// Instances that halted this tick.
    #[must_use]
    pub fn halted(&self) -> Vec<InstanceId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SchedulerEvent::Halted { instance } => Some(*instance),
                _ => None,
            })
            .collect()
    }

    /// Instances that suspended this tick, with their reasons.
    #[must_use]
    pub fn suspended(&self) -> Vec<(InstanceId, &SuspendReason)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SchedulerEvent::Suspended { instance, reason } => Some((*instance, reason)),
                _ => None,
            })
            .collect()
    }
}
