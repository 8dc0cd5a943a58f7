//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    /// Formats timestamp in microseconds.
    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }

    fn describe(event: &TraceEvent) -> String {
        match event {
            TraceEvent::TickStart { tick } => format!("=== TICK {tick} START ==="),
            TraceEvent::TickEnd { tick, executed } => {
                format!("=== TICK {tick} END ({executed} executed) ===")
            }
            TraceEvent::ScriptLoaded {
                script,
                instructions,
            } => format!("  LOAD {script} ({instructions} instructions)"),
            TraceEvent::DecodeFailed { script, error } => {
                format!("  REJECT {script}: {error}")
            }
            TraceEvent::InstanceSpawned {
                instance,
                script,
                owner,
            } => format!("  SPAWN {instance} {script} on {owner}"),
            TraceEvent::Instruction {
                instance,
                offset,
                rendered,
            } => format!("    {instance} {offset:#06x} {rendered}"),
            TraceEvent::Suspended { instance, reason } => {
                format!("  WAIT {instance} {reason}")
            }
            TraceEvent::Notified { event, released } => {
                let ids: Vec<String> = released.iter().map(ToString::to_string).collect();
                format!("  NOTIFY {event} -> [{}]", ids.join(", "))
            }
            TraceEvent::Resumed { instance } => format!("  RESUME {instance}"),
            TraceEvent::Halted { instance } => format!("  HALT {instance}"),
            TraceEvent::Faulted { instance, fault } => format!("  FAULT {instance}: {fault}"),
            TraceEvent::Preempted { instance } => format!("  YIELD {instance}"),
            TraceEvent::Cancelled { instance } => format!("  CANCEL {instance}"),
            TraceEvent::Custom { name, data } => format!("  CUSTOM {name}: {data}"),
        }
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut line = String::new();
        if self.show_ids {
            let _ = write!(line, "[{:06}] ", record.id);
        }
        let _ = write!(line, "T{:04} ", record.tick);
        if self.show_timestamps {
            let _ = write!(line, "{:>10} ", Self::format_timestamp(record.timestamp_ns));
        }
        line.push_str(&Self::describe(&record.event));
        line
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to put each record of a list on its own line.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for pretty printing.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Escapes a string for JSON.
    fn escape_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    fn quoted(s: &str) -> String {
        format!("\"{}\"", Self::escape_string(s))
    }

    fn event_fields(event: &TraceEvent) -> String {
        match event {
            TraceEvent::TickStart { tick } => format!("\"tick\":{tick}"),
            TraceEvent::TickEnd { tick, executed } => {
                format!("\"tick\":{tick},\"executed\":{executed}")
            }
            TraceEvent::ScriptLoaded {
                script,
                instructions,
            } => format!(
                "\"script\":{},\"instructions\":{instructions}",
                Self::quoted(script)
            ),
            TraceEvent::DecodeFailed { script, error } => format!(
                "\"script\":{},\"error\":{}",
                Self::quoted(script),
                Self::quoted(&error.to_string())
            ),
            TraceEvent::InstanceSpawned {
                instance,
                script,
                owner,
            } => format!(
                "\"instance\":{},\"script\":{},\"owner\":{}",
                instance.0,
                Self::quoted(script),
                Self::quoted(&owner.to_string())
            ),
            TraceEvent::Instruction {
                instance,
                offset,
                rendered,
            } => format!(
                "\"instance\":{},\"offset\":{offset},\"instruction\":{}",
                instance.0,
                Self::quoted(rendered)
            ),
            TraceEvent::Suspended { instance, reason } => format!(
                "\"instance\":{},\"reason\":{}",
                instance.0,
                Self::quoted(&reason.to_string())
            ),
            TraceEvent::Notified { event, released } => {
                let ids: Vec<String> = released.iter().map(|id| id.0.to_string()).collect();
                format!(
                    "\"event\":{},\"released\":[{}]",
                    Self::quoted(&event.to_string()),
                    ids.join(",")
                )
            }
            TraceEvent::Resumed { instance }
            | TraceEvent::Halted { instance }
            | TraceEvent::Preempted { instance }
            | TraceEvent::Cancelled { instance } => format!("\"instance\":{}", instance.0),
            TraceEvent::Faulted { instance, fault } => format!(
                "\"instance\":{},\"fault\":{}",
                instance.0,
                Self::quoted(&fault.to_string())
            ),
            TraceEvent::Custom { name, data } => {
                format!("\"name\":{},\"data\":{}", Self::quoted(name), Self::quoted(data))
            }
        }
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        format!(
            "{{\"id\":{},\"tick\":{},\"timestamp_ns\":{},\"type\":\"{}\",{}}}",
            record.id,
            record.tick,
            record.timestamp_ns,
            record.event_type(),
            Self::event_fields(&record.event)
        )
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<_> = records.iter().map(|r| self.format(r)).collect();
        if self.pretty {
            format!("[\n  {}\n]", items.join(",\n  "))
        } else {
            format!("[{}]", items.join(","))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
