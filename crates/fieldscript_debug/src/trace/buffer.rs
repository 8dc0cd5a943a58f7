//! Ring buffer for trace records.
//!
//! Keeps the most recent records up to a fixed capacity; the oldest are
//! discarded first. Record ids keep increasing across evictions and clears.

use std::collections::{HashMap, VecDeque};

use super::record::{TraceEvent, TraceRecord};

/// Default buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

// =============================================================================
// Trace Buffer
// =============================================================================

/// A bounded buffer of trace records, oldest first.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    max_size: usize,
    next_id: u64,
}

impl TraceBuffer {
    /// Creates a buffer holding at most `max_size` records.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            next_id: 0,
        }
    }

    /// Appends an event and returns the assigned record id.
    pub fn push(&mut self, tick: u64, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.max_size == 0 {
            return id;
        }
        while self.records.len() >= self.max_size {
            self.records.pop_front();
        }
        self.records
            .push_back(TraceRecord::new(id, tick, timestamp_ns, event));
        id
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record. Ids are not reset.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Returns the most recently pushed record.
    #[must_use]
    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.back()
    }

    /// Records from one tick.
    #[must_use]
    pub fn records_for_tick(&self, tick: u64) -> Vec<&TraceRecord> {
        self.filter(|r| r.tick == tick)
    }

    /// Records in a tick range (inclusive).
    #[must_use]
    pub fn records_in_range(&self, start_tick: u64, end_tick: u64) -> Vec<&TraceRecord> {
        self.filter(|r| (start_tick..=end_tick).contains(&r.tick))
    }

    /// The most recent `count` records, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&TraceRecord> {
        let start = self.records.len().saturating_sub(count);
        self.records.iter().skip(start).collect()
    }

    /// Records matching a predicate.
    pub fn filter<F>(&self, predicate: F) -> Vec<&TraceRecord>
    where
        F: Fn(&TraceRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Records of one event type.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.filter(|r| r.event_type() == event_type)
    }

    /// Oldest tick held.
    #[must_use]
    pub fn oldest_tick(&self) -> Option<u64> {
        self.records.front().map(|r| r.tick)
    }

    /// Newest tick held.
    #[must_use]
    pub fn newest_tick(&self) -> Option<u64> {
        self.records.back().map(|r| r.tick)
    }

    /// Distinct ticks held, in order.
    #[must_use]
    pub fn ticks(&self) -> Vec<u64> {
        let mut ticks: Vec<u64> = self.records.iter().map(|r| r.tick).collect();
        ticks.dedup();
        ticks
    }

    /// Summary statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        let mut event_counts = HashMap::new();
        for record in &self.records {
            *event_counts.entry(record.event_type()).or_insert(0) += 1;
        }
        TraceBufferStats {
            record_count: self.records.len(),
            max_size: self.max_size,
            oldest_tick: self.oldest_tick(),
            newest_tick: self.newest_tick(),
            tick_count: self.ticks().len(),
            event_counts,
        }
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

// =============================================================================
// Buffer Statistics
// =============================================================================

/// Statistics about a trace buffer.
#[derive(Clone, Debug)]
pub struct TraceBufferStats {
    /// Records currently held.
    pub record_count: usize,
    /// Capacity.
    pub max_size: usize,
    /// Oldest tick held.
    pub oldest_tick: Option<u64>,
    /// Newest tick held.
    pub newest_tick: Option<u64>,
    /// Distinct ticks held.
    pub tick_count: usize,
    /// Count of each event type.
    pub event_counts: HashMap<&'static str, usize>,
}

// =============================================================================
// Tests
// =============================================================================
