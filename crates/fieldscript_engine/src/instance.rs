//! Script instances.
//!
//! An instance is one running occurrence of a program. It owns its
//! execution point and state; the program itself is shared.

use std::fmt;
use std::sync::Arc;

use fieldscript_foundation::{EntityId, RuntimeFault};
use fieldscript_language::{Cursor, Program, SuspendReason};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// InstanceId
// =============================================================================

/// Identifies a script instance. Ids are never reused within a scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// ExecState
// =============================================================================

/// Lifecycle state of an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecState {
    /// Runnable on the next tick.
    Running,
    /// Blocked until a matching event arrives.
    Suspended(SuspendReason),
    /// Ended normally. Terminal.
    Halted,
    /// Ended by a runtime fault. Terminal.
    Faulted(RuntimeFault),
}

impl ExecState {
    /// Returns true for `Halted` and `Faulted`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted | Self::Faulted(_))
    }

    /// Returns the wait reason if suspended.
    #[must_use]
    pub fn suspend_reason(&self) -> Option<&SuspendReason> {
        match self {
            Self::Suspended(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Suspended(reason) => write!(f, "suspended on {reason}"),
            Self::Halted => f.write_str("halted"),
            Self::Faulted(fault) => write!(f, "faulted: {fault}"),
        }
    }
}

// =============================================================================
// Instance
// =============================================================================

/// One running occurrence of a program.
#[derive(Clone, Debug)]
pub struct Instance {
    id: InstanceId,
    program: Arc<Program>,
    owner: EntityId,
    pub(crate) cursor: Cursor,
    pub(crate) state: ExecState,
}

impl Instance {
    pub(crate) fn new(id: InstanceId, program: Arc<Program>, owner: EntityId) -> Self {
        Self {
            id,
            program,
            owner,
            cursor: Cursor::new(),
            state: ExecState::Running,
        }
    }

    /// Instance id.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The shared program.
    #[must_use]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Entity the script runs on.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Execution point.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> &ExecState {
        &self.state
    }

    /// Captures the instance as plain data.
    #[must_use]
    pub fn snapshot(&self) -> InstanceSnapshot {
        InstanceSnapshot {
            id: self.id,
            script: self.program.name().to_string(),
            owner: self.owner,
            cursor: self.cursor.clone(),
            state: self.state.clone(),
        }
    }
}

/// Serializable form of an [`Instance`]. The program is named, not stored.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceSnapshot {
    /// Instance id.
    pub id: InstanceId,
    /// Name of the program the instance runs.
    pub script: String,
    /// Owning entity.
    pub owner: EntityId,
    /// Execution point.
    pub cursor: Cursor,
    /// Lifecycle state.
    pub state: ExecState,
}

impl InstanceSnapshot {
    pub(crate) fn into_instance(self, program: Arc<Program>) -> Instance {
        Instance {
            id: self.id,
            program,
            owner: self.owner,
            cursor: self.cursor,
            state: self.state,
        }
    }
}
