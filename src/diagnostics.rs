//! Structured diagnostics for cartonization runs.
//!
//! Every decision the engine takes is reported as a [`DiagnosticEvent`] to an
//! injectable [`DiagnosticsSink`]. Closures, `Vec<DiagnosticEvent>` and the two
//! provided sinks all implement the trait, so callers can stream events (SSE),
//! record them for assertions, forward them to `tracing`, or drop them.

use serde::Serialize;
use utoipa::ToSchema;

/// Events emitted while evaluating boxes and splitting strategies.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum DiagnosticEvent {
    /// A non-fatal observation from the packer pre-checks.
    PrecheckWarning {
        box_id: String,
        item_id: String,
        message: String,
    },
    /// A box was rejected by the geometric packer.
    PackingRejected {
        box_id: String,
        reason_code: String,
        reason: String,
    },
    /// A box was evaluated by the single-container selector.
    BoxEvaluated {
        box_id: String,
        fits: bool,
        utilization: f64,
        confidence: f64,
    },
    /// A splitting strategy finished.
    StrategyEvaluated {
        strategy: String,
        success: bool,
        packages: usize,
    },
    /// A named business rule influenced the outcome.
    RuleApplied { rule: String },
    /// Cartonization finished.
    Finished {
        found: bool,
        packages: usize,
        processing_time_ms: f64,
    },
}

/// Receiver for diagnostic events.
pub trait DiagnosticsSink {
    fn record(&mut self, event: &DiagnosticEvent);
}

impl<F> DiagnosticsSink for F
where
    F: FnMut(&DiagnosticEvent),
{
    fn record(&mut self, event: &DiagnosticEvent) {
        self(event)
    }
}

impl DiagnosticsSink for Vec<DiagnosticEvent> {
    fn record(&mut self, event: &DiagnosticEvent) {
        self.push(event.clone());
    }
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _event: &DiagnosticEvent) {}
}

/// Sink that forwards events to `tracing` at debug and trace level.
///
/// Pre-check warnings are already logged at warn level by the packer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&mut self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::RuleApplied { rule } => tracing::debug!(rule = %rule, "rule applied"),
            other => tracing::trace!(event = ?other, "cartonization event"),
        }
    }
}

/// Ordered trail of applied rules, mirrored to a sink as it grows.
pub(crate) struct RuleTrail<'a> {
    rules: Vec<String>,
    sink: &'a mut dyn DiagnosticsSink,
}

impl<'a> RuleTrail<'a> {
    pub(crate) fn new(sink: &'a mut dyn DiagnosticsSink) -> Self {
        Self {
            rules: Vec::new(),
            sink,
        }
    }

    pub(crate) fn apply(&mut self, rule: impl Into<String>) {
        let rule = rule.into();
        let event = DiagnosticEvent::RuleApplied { rule: rule.clone() };
        self.sink.record(&event);
        self.rules.push(rule);
    }

    pub(crate) fn sink(&mut self) -> &mut dyn DiagnosticsSink {
        &mut *self.sink
    }

    pub(crate) fn into_rules(self) -> Vec<String> {
        self.rules
    }
}
