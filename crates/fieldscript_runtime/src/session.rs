//! Session state.
//!
//! A session ties together the field state scripts run against, the
//! decoded scripts, the scheduler, frame timers and the tracer. Scripts are
//! registered only after they decode; a script that fails to decode never
//! becomes spawnable.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use fieldscript_debug::{TraceEvent, Tracer};
use fieldscript_engine::{
    Instance, InstanceId, Scheduler, SchedulerConfig, TickReport, WaitEvent,
};
use fieldscript_foundation::{EntityId, Error, ErrorContext, ErrorKind, Result};
use fieldscript_language::{Decoder, DecoderConfig, Program, SuspendReason, disasm};
use fieldscript_storage::FieldState;

use crate::serialize::SessionSnapshot;

/// A decoded script and the bytes it came from.
#[derive(Clone, Debug)]
struct LoadedScript {
    source: Vec<u8>,
    program: Arc<Program>,
}

/// Everything needed to run field scripts frame by frame.
#[derive(Debug)]
pub struct Session {
    field: FieldState,
    scheduler: Scheduler,
    decoder: Decoder,
    scripts: BTreeMap<String, LoadedScript>,
    /// Replaced scripts that live instances still run.
    retired: Vec<LoadedScript>,
    /// Tick at which each timer-suspended instance is released.
    timers: BTreeMap<InstanceId, u64>,
    tracer: Tracer,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Session {
    /// Creates a session over an empty field with the given random seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_field(FieldState::new(seed))
    }

    /// Creates a session over an existing field.
    #[must_use]
    pub fn with_field(field: FieldState) -> Self {
        Self {
            field,
            scheduler: Scheduler::new(SchedulerConfig::default()),
            decoder: Decoder::default(),
            scripts: BTreeMap::new(),
            retired: Vec::new(),
            timers: BTreeMap::new(),
            tracer: Tracer::disabled(),
        }
    }

    /// Replaces the decoder configuration.
    #[must_use]
    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder = Decoder::new(config);
        self
    }

    /// Replaces the scheduler. Instances already spawned are dropped.
    #[must_use]
    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = Scheduler::new(config);
        self.timers.clear();
        self.retired.clear();
        self
    }

    /// Replaces the tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.scheduler.set_trace_instructions(tracer.is_enabled());
        self.tracer = tracer;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the field state.
    #[must_use]
    pub fn field(&self) -> &FieldState {
        &self.field
    }

    /// Returns the field state mutably.
    pub fn field_mut(&mut self) -> &mut FieldState {
        &mut self.field
    }

    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the tracer.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Returns the tracer mutably.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Turns tracing on or off, including per-instruction events.
    pub fn set_tracing(&mut self, on: bool) {
        if on {
            self.tracer.enable();
        } else {
            self.tracer.disable();
        }
        self.scheduler.set_trace_instructions(on);
    }

    /// Returns the decoded program registered under `name`.
    #[must_use]
    pub fn program(&self, name: &str) -> Option<&Arc<Program>> {
        self.scripts.get(name).map(|script| &script.program)
    }

    /// Names of every registered script, sorted.
    pub fn script_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scripts.keys().map(String::as_str)
    }

    /// Tick at which a timer-suspended instance will be released.
    #[must_use]
    pub fn timer_deadline(&self, id: InstanceId) -> Option<u64> {
        self.timers.get(&id).copied()
    }

    // =========================================================================
    // Scripts
    // =========================================================================

    /// Decodes `bytes` and registers the result under `name`.
    ///
    /// Replacing a script does not affect instances already running the
    /// previous program.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the bytes are malformed. Nothing is
    /// registered in that case.
    pub fn load_script(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<Arc<Program>> {
        let name = name.into();
        let source = bytes.into();
        let program = match self.decoder.decode(&name, &source) {
            Ok(program) => Arc::new(program),
            Err(error) => {
                self.tracer.record(TraceEvent::DecodeFailed {
                    script: name.clone(),
                    error: error.clone(),
                });
                let mut context = ErrorContext::new().with_source(name);
                if let Some(offset) = error.offset() {
                    context = context.with_offset(offset);
                }
                return Err(Error::from(error).with_context(context));
            }
        };
        self.tracer.record(TraceEvent::ScriptLoaded {
            script: name.clone(),
            instructions: program.len(),
        });
        let loaded = LoadedScript {
            source,
            program: Arc::clone(&program),
        };
        if let Some(replaced) = self.scripts.insert(name, loaded) {
            self.retired.push(replaced);
            self.prune_retired();
        }
        Ok(program)
    }

    /// Drops replaced scripts no instance runs any more.
    fn prune_retired(&mut self) {
        let scheduler = &self.scheduler;
        self.retired.retain(|script| {
            scheduler
                .instances()
                .any(|instance| Arc::ptr_eq(instance.program(), &script.program))
        });
    }

    /// Source bytes of the program an instance runs.
    fn source_of(&self, instance: &Instance) -> Option<&[u8]> {
        self.scripts
            .values()
            .chain(&self.retired)
            .find(|script| Arc::ptr_eq(&script.program, instance.program()))
            .map(|script| script.source.as_slice())
    }

    fn decode_saved(&self, name: &str, source: Vec<u8>) -> Result<LoadedScript> {
        let program = self.decoder.decode(name, &source).map_err(|e| {
            Error::from(e).with_context(ErrorContext::new().with_source(name.to_string()))
        })?;
        Ok(LoadedScript {
            source,
            program: Arc::new(program),
        })
    }

    /// Reads a script file and registers it under the file's stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not decode.
    pub fn load_script_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<Program>> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::new(ErrorKind::IoError(format!(
                "failed to read script '{}': {e}",
                path.display()
            )))
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        self.load_script(name, bytes)
    }

    /// Renders a registered script as a listing.
    ///
    /// # Errors
    ///
    /// Fails if no script has that name.
    pub fn disassemble(&self, name: &str) -> Result<String> {
        self.program(name)
            .map(|program| disasm::listing_with_header(program))
            .ok_or_else(|| Error::unknown_script(name))
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates a named entity in the field.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.field.spawn_entity(name)
    }

    /// Finds a live entity by name.
    #[must_use]
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.field
            .entities()
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(id, _)| id)
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Starts an instance of a registered script on behalf of `owner`.
    ///
    /// # Errors
    ///
    /// Fails if the script is not registered or the owner is not a live
    /// entity.
    pub fn spawn(&mut self, script: &str, owner: EntityId) -> Result<InstanceId> {
        let program = Arc::clone(self.program(script).ok_or_else(|| Error::unknown_script(script))?);
        self.field.entity(owner)?;
        let id = self.scheduler.spawn(program, owner);
        self.tracer.record(TraceEvent::InstanceSpawned {
            instance: id,
            script: script.to_string(),
            owner,
        });
        Ok(id)
    }

    /// Runs one frame.
    ///
    /// Timers that are due are released first, then every runnable
    /// instance gets its slice.
    pub fn tick(&mut self) -> TickReport {
        let upcoming = self.scheduler.tick_count() + 1;
        let due: Vec<InstanceId> = self
            .timers
            .iter()
            .filter(|&(_, &deadline)| deadline <= upcoming)
            .map(|(&id, _)| id)
            .collect();
        for id in due {
            self.timers.remove(&id);
            let event = WaitEvent::TimerElapsed { instance: id };
            let released = self.scheduler.notify(&event);
            self.tracer.record(TraceEvent::Notified { event, released });
        }

        let report = self.scheduler.tick(&mut self.field);
        for (id, reason) in report.suspended() {
            if let SuspendReason::Timer { frames } = reason {
                let frames = u64::try_from(*frames).unwrap_or(0).max(1);
                self.timers.insert(id, report.tick + frames);
            }
        }
        self.tracer.record_report(&report);
        report
    }

    /// Runs `ticks` frames and returns their reports.
    pub fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Delivers a host event, releasing every instance waiting on it.
    pub fn notify(&mut self, event: &WaitEvent) -> Vec<InstanceId> {
        let released = self.scheduler.notify(event);
        for id in &released {
            self.timers.remove(id);
        }
        self.tracer.record(TraceEvent::Notified {
            event: event.clone(),
            released: released.clone(),
        });
        released
    }

    /// Releases one suspended instance regardless of what it waits for.
    ///
    /// # Errors
    ///
    /// Fails if the instance does not exist or is not suspended.
    pub fn resume(&mut self, id: InstanceId) -> Result<()> {
        self.scheduler.resume(id)?;
        self.timers.remove(&id);
        self.tracer.record(TraceEvent::Resumed { instance: id });
        Ok(())
    }

    /// Removes an instance. Its pending wait is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the instance does not exist.
    pub fn cancel(&mut self, id: InstanceId) -> Result<Instance> {
        let instance = self.scheduler.cancel(id)?;
        self.timers.remove(&id);
        self.prune_retired();
        self.tracer.record(TraceEvent::Cancelled { instance: id });
        Ok(instance)
    }

    /// Removes every instance owned by `owner`.
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> Vec<InstanceId> {
        let cancelled = self.scheduler.cancel_owned_by(owner);
        for &id in &cancelled {
            self.timers.remove(&id);
            self.tracer.record(TraceEvent::Cancelled { instance: id });
        }
        self.prune_retired();
        cancelled
    }

    /// Removes every instance and returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let ids: Vec<InstanceId> = self.scheduler.instances().map(Instance::id).collect();
        self.timers.clear();
        self.retired.clear();
        let count = self.scheduler.cancel_all();
        for instance in ids {
            self.tracer.record(TraceEvent::Cancelled { instance });
        }
        count
    }

    /// Removes halted and faulted instances.
    pub fn reap(&mut self) -> Vec<Instance> {
        let reaped = self.scheduler.reap();
        for instance in &reaped {
            self.timers.remove(&instance.id());
        }
        self.prune_retired();
        reaped
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures the field, every instance, timers and script sources.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            field: self.field.clone(),
            scheduler: self.scheduler.snapshot(),
            scripts: self
                .scripts
                .iter()
                .map(|(name, script)| (name.clone(), script.source.clone()))
                .collect(),
            detached: self
                .scheduler
                .instances()
                .filter(|instance| {
                    self.scripts
                        .get(instance.program().name())
                        .is_none_or(|script| !Arc::ptr_eq(&script.program, instance.program()))
                })
                .filter_map(|instance| {
                    self.source_of(instance)
                        .map(|source| (instance.id(), source.to_vec()))
                })
                .collect(),
            timers: self.timers.iter().map(|(&id, &tick)| (id, tick)).collect(),
        }
    }

    /// Replaces the session state with a snapshot.
    ///
    /// Scripts are decoded again from their saved sources. An instance that
    /// was running a since-replaced script gets that older program back.
    ///
    /// # Errors
    ///
    /// Fails if a saved script no longer decodes or an instance names a
    /// script that was not saved. The session is unchanged on failure.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<()> {
        let mut scripts = BTreeMap::new();
        for (name, source) in snapshot.scripts {
            let script = self.decode_saved(&name, source)?;
            scripts.insert(name, script);
        }

        let mut detached: BTreeMap<InstanceId, LoadedScript> = BTreeMap::new();
        let mut retired: Vec<LoadedScript> = Vec::new();
        for (id, source) in snapshot.detached {
            let Some(saved) = snapshot.scheduler.instances.iter().find(|s| s.id == id) else {
                continue;
            };
            let shared = retired
                .iter()
                .find(|r| r.source == source && r.program.name() == saved.script)
                .cloned();
            let script = match shared {
                Some(shared) => shared,
                None => {
                    let script = self.decode_saved(&saved.script, source)?;
                    retired.push(script.clone());
                    script
                }
            };
            detached.insert(id, script);
        }

        let mut scheduler = self.scheduler.clone();
        scheduler.restore(snapshot.scheduler, |saved| {
            detached
                .get(&saved.id)
                .or_else(|| scripts.get(&saved.script))
                .map(|script| Arc::clone(&script.program))
        })?;

        self.scheduler = scheduler;
        self.scripts = scripts;
        self.retired = retired;
        self.field = snapshot.field;
        self.timers = snapshot.timers.into_iter().collect();
        Ok(())
    }
}
