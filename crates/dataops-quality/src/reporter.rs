use std::sync::Mutex;

use tracing::{info, warn};

use dataops_core::CheckKind;

use crate::model::CheckWarning;

/// Observable events of a check run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    RunStarted {
        run_id: String,
        fields: usize,
        rows: usize,
    },
    Metric {
        field: String,
        kind: CheckKind,
        value: u64,
    },
    Warning(CheckWarning),
    RunFinished {
        run_id: String,
        violations: u64,
    },
}

/// Sink for check-run events, passed into the engine.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ReportEvent) {
        match event {
            ReportEvent::RunStarted {
                run_id,
                fields,
                rows,
            } => info!(run_id = %run_id, fields, rows, "quality check started"),
            ReportEvent::Metric { field, kind, value } => info!(
                event = "metric",
                field = %field,
                metric = kind.metric_name(),
                value,
                "{field}: {} = {value}",
                kind.metric_name()
            ),
            ReportEvent::Warning(warning) => warn!(event = "check_warning", "{warning}"),
            ReportEvent::RunFinished { run_id, violations } => {
                info!(run_id = %run_id, violations, "quality check finished")
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<CheckWarning> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Warning(warning) => Some(warning),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
