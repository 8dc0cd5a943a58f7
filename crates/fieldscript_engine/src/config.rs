//! Scheduler configuration.

use fieldscript_language::DEFAULT_MAX_CALL_DEPTH;

/// Default instructions an instance may execute per tick.
pub const DEFAULT_INSTRUCTION_QUOTA: usize = 256;

/// Scheduler settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum instructions one instance executes per tick.
    pub instruction_quota: usize,
    /// Maximum nested `CALL`s per instance.
    pub max_call_depth: usize,
    /// Report every executed instruction in the tick report.
    pub trace_instructions: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            instruction_quota: DEFAULT_INSTRUCTION_QUOTA,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace_instructions: false,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-tick instruction quota. Zero is treated as one.
    #[must_use]
    pub fn with_instruction_quota(mut self, quota: usize) -> Self {
        self.instruction_quota = quota.max(1);
        self
    }

    /// Sets the call depth bound.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Reports every executed instruction.
    #[must_use]
    pub fn trace_instructions(mut self) -> Self {
        self.trace_instructions = true;
        self
    }
}
