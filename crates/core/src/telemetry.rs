//! Injected telemetry for dialog handling.
//!
//! Handlers receive an `Arc<dyn TelemetrySink>` instead of writing to a
//! process-wide logger, so tests can capture exactly what a request emitted.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event_id: String,
    pub event_name: String,
    pub correlation_id: String,
    pub user_id: String,
    pub intent_name: String,
    pub outcome: TelemetryOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(
        event_name: impl Into<String>,
        correlation_id: impl Into<String>,
        user_id: impl Into<String>,
        intent_name: impl Into<String>,
        outcome: TelemetryOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_name: event_name.into(),
            correlation_id: correlation_id.into(),
            user_id: user_id.into(),
            intent_name: intent_name.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match event.outcome {
            TelemetryOutcome::Success | TelemetryOutcome::Rejected => tracing::info!(
                event_name = %event.event_name,
                correlation_id = %event.correlation_id,
                user_id = %event.user_id,
                intent_name = %event.intent_name,
                outcome = ?event.outcome,
                metadata = ?event.metadata,
                "dialog telemetry"
            ),
            TelemetryOutcome::Failed => tracing::warn!(
                event_name = %event.event_name,
                correlation_id = %event.correlation_id,
                user_id = %event.user_id,
                intent_name = %event.intent_name,
                outcome = ?event.outcome,
                metadata = ?event.metadata,
                "dialog telemetry"
            ),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTelemetrySink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl InMemoryTelemetrySink {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.event_name).collect()
    }
}

impl TelemetrySink for InMemoryTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::telemetry::{
        InMemoryTelemetrySink, TelemetryEvent, TelemetryOutcome, TelemetrySink,
        TracingTelemetrySink,
    };

    #[test]
    fn in_memory_sink_records_events_with_correlation_fields() {
        let sink = InMemoryTelemetrySink::default();
        sink.emit(
            TelemetryEvent::new(
                "lex.slot.rejected",
                "req-123",
                "user-9",
                "recommendPortfolio",
                TelemetryOutcome::Rejected,
            )
            .with_metadata("violated_slot", "age"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-123");
        assert_eq!(events[0].user_id, "user-9");
        assert_eq!(events[0].metadata.get("violated_slot").map(String::as_str), Some("age"));
        assert_eq!(sink.event_names(), vec!["lex.slot.rejected".to_owned()]);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().expect("log buffer").clone();
            String::from_utf8(bytes)
                .expect("utf8 log output")
                .lines()
                .map(|line| serde_json::from_str(line).expect("json log line"))
                .collect()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(emit: impl FnOnce()) -> Vec<serde_json::Value> {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, emit);
        log.lines()
    }

    #[test]
    fn tracing_sink_logs_failures_at_warn_with_correlation_fields() {
        let lines = capture(|| {
            TracingTelemetrySink.emit(TelemetryEvent::new(
                "lex.dialog.failed",
                "req-1",
                "user-1",
                "recommendPortfolio",
                TelemetryOutcome::Failed,
            ));
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "WARN");
        assert_eq!(lines[0]["fields"]["event_name"], "lex.dialog.failed");
        assert_eq!(lines[0]["fields"]["correlation_id"], "req-1");
        assert_eq!(lines[0]["fields"]["intent_name"], "recommendPortfolio");
    }

    #[test]
    fn tracing_sink_logs_successes_at_info() {
        let lines = capture(|| {
            TracingTelemetrySink.emit(TelemetryEvent::new(
                "lex.dialog.closed",
                "req-2",
                "user-2",
                "recommendPortfolio",
                TelemetryOutcome::Success,
            ));
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["fields"]["event_name"], "lex.dialog.closed");
    }
}
