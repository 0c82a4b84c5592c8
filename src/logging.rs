/// Structured logging utilities
///
/// Provides helpers for:
/// - Structured JSON log events
/// - Helper macros for wizard milestones (stage changes, lockouts, passcodes, settlement)

use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Structured log event builder
///
/// Usage:
/// ```
/// use transfer_gate::logging::LogEvent;
///
/// let log_value = LogEvent::new("STAGE_TRANSITION")
///     .field("user_id", "u-1001")
///     .field("from", "confirm")
///     .field("to", "passcode")
///     .service("transfer_wizard")
///     .build();
///
/// log::info!("{}", log_value);
/// ```
pub struct LogEvent {
    fields: serde_json::Map<String, Value>,
}

impl LogEvent {
    /// Create a new log event with the given event name
    pub fn new(event: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), json!(event));
        fields.insert("timestamp_ms".to_string(), json!(now_ms()));

        Self { fields }
    }

    /// Add a field to the log event
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Add service name
    pub fn service(mut self, service: &str) -> Self {
        self.fields.insert("service".to_string(), json!(service));
        self
    }

    /// Build the final JSON value
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

#[macro_export]
macro_rules! log_stage_transition {
    ($user_id:expr, $from:expr, $to:expr) => {
        log::info!(
            "{}",
            $crate::logging::LogEvent::new("STAGE_TRANSITION")
                .field("user_id", $user_id)
                .field("from", $from)
                .field("to", $to)
                .service("transfer_wizard")
                .build()
        );
    };
}

#[macro_export]
macro_rules! log_lockout {
    ($user_id:expr, $credential:expr, $failures:expr) => {
        log::warn!(
            "{}",
            $crate::logging::LogEvent::new("CREDENTIAL_LOCKOUT")
                .field("user_id", $user_id)
                .field("credential", $credential)
                .field("failures", $failures)
                .service("transfer_wizard")
                .build()
        );
    };
}

#[macro_export]
macro_rules! log_passcode_issued {
    ($key:expr, $expires_at_ms:expr) => {
        log::info!(
            "{}",
            $crate::logging::LogEvent::new("PASSCODE_ISSUED")
                .field("key", $key)
                .field("expires_at_ms", $expires_at_ms)
                .service("passcode")
                .build()
        );
    };
}

#[macro_export]
macro_rules! log_settlement {
    ($user_id:expr, $transaction_id:expr, $status:expr, $amount:expr) => {
        log::info!(
            "{}",
            $crate::logging::LogEvent::new("TRANSFER_SETTLED")
                .field("user_id", $user_id)
                .field("transaction_id", $transaction_id)
                .field("status", $status)
                .field("amount", $amount)
                .service("transfer_wizard")
                .build()
        );
    };
}

/// Generate trace_id for a wizard run
pub fn gen_wizard_trace_id(user_id: &str) -> String {
    format!("wizard_{}_{}", user_id, now_ms())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_builder() {
        let log = LogEvent::new("TEST_EVENT")
            .field("user_id", "u-1001")
            .field("amount", "100.00")
            .service("test")
            .build();

        assert_eq!(log["event"], "TEST_EVENT");
        assert_eq!(log["user_id"], "u-1001");
        assert_eq!(log["amount"], "100.00");
        assert_eq!(log["service"], "test");
        assert!(log.get("timestamp_ms").is_some());
    }

    #[test]
    fn test_trace_id_format() {
        let trace_id = gen_wizard_trace_id("u-1");
        assert!(trace_id.starts_with("wizard_u-1_"));
    }

    #[test]
    fn test_macros_expand() {
        crate::log_stage_transition!("u-1", "confirm", "passcode");
        crate::log_lockout!("u-1", "tac", 3);
        crate::log_passcode_issued!("u-1/Jane/100", 0);
        crate::log_settlement!("u-1", "id", "completed", "-100.00");
    }
}
