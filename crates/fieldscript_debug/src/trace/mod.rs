//! Tracing of script execution.
//!
//! Recording costs nothing when tracing is disabled. Records go into a
//! bounded ring buffer and can optionally be echoed to stderr as they
//! happen, in human-readable or JSON form.

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{DEFAULT_BUFFER_SIZE, TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

use fieldscript_engine::{InstanceId, TickReport};

/// Destination for records as they are made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// Keep records in the buffer only.
    #[default]
    None,
    /// Also echo each record to stderr.
    Stderr,
}

/// Rendering used for echoed and dumped records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceFormat {
    /// One indented line per record.
    #[default]
    Human,
    /// One JSON object per record.
    Json,
}

/// Tracer settings.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Record anything at all.
    pub enabled: bool,
    /// Ring buffer capacity.
    pub capacity: usize,
    /// Echo destination.
    pub output: TraceOutput,
    /// Echo and dump rendering.
    pub format: TraceFormat,
    /// Event kinds to keep; empty keeps every kind.
    pub kinds: Vec<String>,
    /// Keep only events about this instance, plus tick boundaries.
    pub focus: Option<InstanceId>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_BUFFER_SIZE,
            output: TraceOutput::None,
            format: TraceFormat::Human,
            kinds: Vec::new(),
            focus: None,
        }
    }
}

impl TracerConfig {
    /// Disabled, human-readable, default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns recording on.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Sets the ring buffer capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Echoes records to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Sets the rendering.
    #[must_use]
    pub fn with_format(mut self, format: TraceFormat) -> Self {
        self.format = format;
        self
    }

    /// Keeps only the named event kinds (see [`TraceEvent::event_type`]).
    #[must_use]
    pub fn only_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Follows a single instance.
    #[must_use]
    pub fn focus_on(mut self, instance: InstanceId) -> Self {
        self.focus = Some(instance);
        self
    }

    fn keeps(&self, event: &TraceEvent) -> bool {
        if !self.kinds.is_empty() && !self.kinds.iter().any(|k| k == event.event_type()) {
            return false;
        }
        match self.focus {
            Some(target) => event.is_tick_boundary() || event.instance() == Some(target),
            None => true,
        }
    }
}

/// Records what scripts and the scheduler do.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    tick: u64,
    epoch: Instant,
}

impl Tracer {
    /// Creates a tracer.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        Self {
            buffer: TraceBuffer::new(config.capacity),
            config,
            tick: 0,
            epoch: Instant::now(),
        }
    }

    /// A tracer that records nothing until enabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Whether records are being made.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Starts recording.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Stops recording. The buffer is kept.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Tick stamped on new records.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Changes the rendering.
    pub fn set_format(&mut self, format: TraceFormat) {
        self.config.format = format;
    }

    /// Changes the echo destination.
    pub fn set_output(&mut self, output: TraceOutput) {
        self.config.output = output;
    }

    /// Follows one instance, or every instance with `None`.
    pub fn set_focus(&mut self, focus: Option<InstanceId>) {
        self.config.focus = focus;
    }

    /// Records an event at the current tick.
    #[inline]
    pub fn record(&mut self, event: TraceEvent) {
        if self.config.enabled && self.config.keeps(&event) {
            self.push(event);
        }
    }

    fn push(&mut self, event: TraceEvent) {
        let elapsed = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.buffer.push(self.tick, elapsed, event);
        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = self.buffer.last() {
                let line = self.format_record(record);
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
    }

    /// Records a whole tick: its boundaries and every scheduler event.
    pub fn record_report(&mut self, report: &TickReport) {
        if !self.config.enabled {
            return;
        }
        self.tick = report.tick;
        self.record(TraceEvent::TickStart { tick: report.tick });
        for event in &report.events {
            self.record(event.clone().into());
        }
        self.record(TraceEvent::TickEnd {
            tick: report.tick,
            executed: report.executed,
        });
    }

    /// Renders one record in the configured format.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        match self.config.format {
            TraceFormat::Human => HumanFormatter::new().format(record),
            TraceFormat::Json => JsonFormatter::new().format(record),
        }
    }

    /// Renders several records in the configured format.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        match self.config.format {
            TraceFormat::Human => HumanFormatter::new().format_many(records),
            TraceFormat::Json => JsonFormatter::new().format_many(records),
        }
    }

    /// Records kept so far.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Drops every kept record.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Counts by event kind.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.buffer.stats()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

// =============================================================================
// Tests
// =============================================================================
