//! Leveled diagnostic sink.
//!
//! The controller reports every interesting state transition (jump start,
//! landing, coyote expiry, wall clamp, stuck kick, respawn) to a sink it
//! receives at construction, and always calls it. The game decides what gets
//! recorded by choosing the sink.

use std::fmt;
use std::sync::{Arc, Mutex};

use bevy::log::{debug, info, trace, warn};
use bevy::prelude::*;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

/// Receiver of controller diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, level: DiagnosticLevel, body: Entity, message: fmt::Arguments<'_>);
}

/// Forwards diagnostics to Bevy's `tracing` based logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, level: DiagnosticLevel, body: Entity, message: fmt::Arguments<'_>) {
        match level {
            DiagnosticLevel::Trace => trace!(target: "locomotion", ?body, "{message}"),
            DiagnosticLevel::Debug => debug!(target: "locomotion", ?body, "{message}"),
            DiagnosticLevel::Info => info!(target: "locomotion", ?body, "{message}"),
            DiagnosticLevel::Warn => warn!(target: "locomotion", ?body, "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _level: DiagnosticLevel, _body: Entity, _message: fmt::Arguments<'_>) {}
}

/// Keeps diagnostics in memory at or above a minimum level.
///
/// Clones share the same buffer, so one clone can be handed to a controller
/// and the other inspected.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    min_level: DiagnosticLevel,
    records: Arc<Mutex<Vec<(DiagnosticLevel, String)>>>,
}

impl RecordingSink {
    pub fn new(min_level: DiagnosticLevel) -> Self {
        Self {
            min_level,
            records: Arc::default(),
        }
    }

    /// Snapshot of the recorded messages.
    pub fn records(&self) -> Vec<(DiagnosticLevel, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|(_, m)| m.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, level: DiagnosticLevel, _body: Entity, message: fmt::Arguments<'_>) {
        if level < self.min_level {
            return;
        }
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((level, message.to_string()));
    }
}
