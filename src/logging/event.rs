use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Severity;

/// Free-form event attributes. Keys are unique and serialize in sorted order.
pub type Metadata = BTreeMap<String, Value>;

/// A single log event.
///
/// Events are immutable once built. Every driver receives a shared borrow of
/// the same instance and clones or serializes it as it sees fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    timestamp: DateTime<Utc>,
    level: Severity,
    message: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
    #[serde(
        default,
        deserialize_with = "non_empty_trace",
        skip_serializing_if = "Option::is_none"
    )]
    trace_id: Option<String>,
}

fn non_empty_trace<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let trace_id = Option::<String>::deserialize(deserializer)?;
    Ok(trace_id.filter(|id| !id.is_empty()))
}

impl Event {
    /// Builds an event stamped with the current time. An empty trace id is
    /// treated as no trace id.
    pub fn new(
        level: Severity,
        message: impl Into<String>,
        metadata: Option<Metadata>,
        trace_id: Option<&str>,
    ) -> Self {
        Self::at(Utc::now(), level, message, metadata, trace_id)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        level: Severity,
        message: impl Into<String>,
        metadata: Option<Metadata>,
        trace_id: Option<&str>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            metadata: metadata.unwrap_or_default(),
            trace_id: trace_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Canonical single-line JSON form shared by every serializing driver.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn omits_empty_metadata_and_missing_trace() {
        let event = Event::at(fixed_time(), Severity::Info, "hello", None, None);
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "timestamp": "2024-05-01T12:30:00Z",
                "level": "INFO",
                "message": "hello",
            })
        );
    }

    #[test]
    fn includes_metadata_and_trace_when_present() {
        let metadata = Metadata::from([("k".to_string(), json!("v"))]);
        let event = Event::at(
            fixed_time(),
            Severity::Error,
            "boom",
            Some(metadata),
            Some("abc"),
        );
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["metadata"], json!({"k": "v"}));
        assert_eq!(value["trace_id"], json!("abc"));
        assert_eq!(value["level"], json!("ERROR"));
    }

    #[test]
    fn empty_trace_id_means_no_trace() {
        let event = Event::new(Severity::Debug, "x", None, Some(""));
        assert_eq!(event.trace_id(), None);
    }

    #[test]
    fn parses_lines_written_by_other_drivers() {
        let line = r#"{"timestamp":"2024-05-01T12:30:00Z","level":"WARN","message":"disk"}"#;
        let event: Event = serde_json::from_str(line).unwrap();

        assert_eq!(event.level(), Severity::Warn);
        assert_eq!(event.timestamp(), fixed_time());
        assert!(event.metadata().is_empty());
        assert_eq!(event.trace_id(), None);
    }

    #[test]
    fn parsed_empty_trace_id_means_no_trace() {
        for trace_id in [json!(""), Value::Null] {
            let event: Event = serde_json::from_value(json!({
                "timestamp": "2024-05-01T12:30:00Z",
                "level": "INFO",
                "message": "m",
                "trace_id": trace_id,
            }))
            .unwrap();

            assert_eq!(event.trace_id(), None);
            assert!(!event.to_json().unwrap().contains("trace_id"));
        }
    }
}
