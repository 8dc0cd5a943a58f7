//! Cooperative scheduling of script instances.
//!
//! The scheduler is ticked once per frame. Each tick visits instances in
//! registration order and runs every `Running` one until it suspends, halts,
//! faults, or uses up its instruction quota. Only one instance executes at a
//! time, so the shared context needs no locking, and the order is fully
//! determined by registration order.
//!
//! A fault ends only the faulting instance. Suspended instances wait for a
//! host [`WaitEvent`]; there is no timeout, so a wait whose event never
//! arrives stalls that instance forever.

use std::sync::Arc;

use fieldscript_foundation::{EntityId, Error, ErrorKind, Result};
use fieldscript_language::{ExecutionContext, Program, Step, SuspendReason, Vm};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::event::{SchedulerEvent, TickReport, WaitEvent};
use crate::instance::{ExecState, Instance, InstanceId, InstanceSnapshot};

/// Serializable scheduler state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchedulerSnapshot {
    /// Ticks run so far.
    pub tick: u64,
    /// Next instance id to hand out.
    pub next_id: u64,
    /// Instances in registration order.
    pub instances: Vec<InstanceSnapshot>,
}

/// Runs many script instances against one shared context.
#[derive(Clone, Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    vm: Vm,
    instances: Vec<Instance>,
    next_id: u64,
    tick: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let vm = Vm::with_max_call_depth(config.max_call_depth);
        Self {
            config,
            vm,
            instances: Vec::new(),
            next_id: 1,
            tick: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Turns per-instruction reporting on or off.
    pub fn set_trace_instructions(&mut self, on: bool) {
        self.config.trace_instructions = on;
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Number of registered instances, terminal ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if no instances are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterates instances in registration order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.instances.iter()
    }

    /// Looks up an instance.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.iter().find(|instance| instance.id() == id)
    }

    /// Returns an instance's state.
    #[must_use]
    pub fn state(&self, id: InstanceId) -> Option<&ExecState> {
        self.get(id).map(Instance::state)
    }

    /// Iterates suspended instances with their wait reasons.
    pub fn suspended(&self) -> impl Iterator<Item = (InstanceId, &SuspendReason)> + '_ {
        self.instances
            .iter()
            .filter_map(|instance| Some((instance.id(), instance.state().suspend_reason()?)))
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a new instance of `program` running on `owner`.
    ///
    /// The instance starts `Running` at its first instruction and first
    /// executes on the next tick.
    pub fn spawn(&mut self, program: Arc<Program>, owner: EntityId) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.push(Instance::new(id, program, owner));
        id
    }

    /// Removes an instance. A pending wait is dropped with it.
    ///
    /// # Errors
    ///
    /// Fails if no instance has this id.
    pub fn cancel(&mut self, id: InstanceId) -> Result<Instance> {
        let pos = self
            .instances
            .iter()
            .position(|instance| instance.id() == id)
            .ok_or_else(|| Error::unknown_instance(id.0))?;
        Ok(self.instances.remove(pos))
    }

    /// Removes every instance running on `owner`, returning their ids.
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> Vec<InstanceId> {
        let mut cancelled = Vec::new();
        self.instances.retain(|instance| {
            if instance.owner() == owner {
                cancelled.push(instance.id());
                false
            } else {
                true
            }
        });
        cancelled
    }

    /// Removes every instance, returning how many were removed.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.instances.len();
        self.instances.clear();
        count
    }

    /// Removes and returns halted and faulted instances.
    pub fn reap(&mut self) -> Vec<Instance> {
        let (done, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.instances)
            .into_iter()
            .partition(|instance| instance.state().is_terminal());
        self.instances = live;
        done
    }

    // =========================================================================
    // Waits
    // =========================================================================

    /// Releases every suspended instance the event matches, in registration
    /// order. Released instances run on the next tick.
    pub fn notify(&mut self, event: &WaitEvent) -> Vec<InstanceId> {
        let mut released = Vec::new();
        for instance in &mut self.instances {
            let matches = match &instance.state {
                ExecState::Suspended(reason) => event.releases(instance.id(), reason),
                _ => false,
            };
            if matches {
                instance.state = ExecState::Running;
                released.push(instance.id());
            }
        }
        released
    }

    /// Releases one suspended instance regardless of what it waits for.
    ///
    /// # Errors
    ///
    /// Fails if the instance does not exist or is not suspended.
    pub fn resume(&mut self, id: InstanceId) -> Result<()> {
        let instance = self
            .instances
            .iter_mut()
            .find(|instance| instance.id() == id)
            .ok_or_else(|| Error::unknown_instance(id.0))?;
        if !matches!(instance.state, ExecState::Suspended(_)) {
            return Err(Error::new(ErrorKind::NotSuspended(id.0)));
        }
        instance.state = ExecState::Running;
        Ok(())
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs one frame.
    pub fn tick<C>(&mut self, ctx: &mut C) -> TickReport
    where
        C: ExecutionContext + ?Sized,
    {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        for instance in &mut self.instances {
            if instance.state == ExecState::Running {
                run_slice(&self.vm, &self.config, instance, ctx, &mut report);
            }
        }
        report
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures every instance's execution point.
    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            tick: self.tick,
            next_id: self.next_id,
            instances: self.instances.iter().map(Instance::snapshot).collect(),
        }
    }

    /// Replaces all instances with those in a snapshot.
    ///
    /// `programs` supplies the decoded program for each saved instance.
    ///
    /// # Errors
    ///
    /// Fails if `programs` has no program for some instance. The scheduler
    /// is left unchanged in that case.
    pub fn restore<F>(&mut self, snapshot: SchedulerSnapshot, programs: F) -> Result<()>
    where
        F: Fn(&InstanceSnapshot) -> Option<Arc<Program>>,
    {
        let mut instances = Vec::with_capacity(snapshot.instances.len());
        for saved in snapshot.instances {
            let program =
                programs(&saved).ok_or_else(|| Error::unknown_script(saved.script.clone()))?;
            instances.push(saved.into_instance(program));
        }
        self.instances = instances;
        self.tick = snapshot.tick;
        self.next_id = snapshot.next_id;
        Ok(())
    }
}

/// Runs one instance for up to its quota.
fn run_slice<C>(
    vm: &Vm,
    config: &SchedulerConfig,
    instance: &mut Instance,
    ctx: &mut C,
    report: &mut TickReport,
) where
    C: ExecutionContext + ?Sized,
{
    let id = instance.id();
    let owner = instance.owner();
    let program = Arc::clone(instance.program());
    for _ in 0..config.instruction_quota {
        if config.trace_instructions {
            if let Some(instruction) = program.get(instance.cursor.pc()) {
                report.events.push(SchedulerEvent::Executed {
                    instance: id,
                    offset: program.offset_of(instance.cursor.pc()).unwrap_or_default(),
                    instruction: instruction.to_string(),
                });
            }
        }
        let at_instruction = program.get(instance.cursor.pc()).is_some();
        let step = vm.step(&program, &mut instance.cursor, owner, ctx);
        if at_instruction {
            report.executed += 1;
        }
        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Suspend(reason)) => {
                instance.state = ExecState::Suspended(reason.clone());
                report.events.push(SchedulerEvent::Suspended {
                    instance: id,
                    reason,
                });
                return;
            }
            Ok(Step::Halt) => {
                instance.state = ExecState::Halted;
                report.events.push(SchedulerEvent::Halted { instance: id });
                return;
            }
            Err(fault) => {
                instance.state = ExecState::Faulted(fault.clone());
                report.events.push(SchedulerEvent::Faulted {
                    instance: id,
                    fault,
                });
                return;
            }
        }
    }
    report
        .events
        .push(SchedulerEvent::QuotaExhausted { instance: id });
}
