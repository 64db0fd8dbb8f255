use chrono::Local;
use serde_json::Value;
use yansi::Paint;

use crate::errors::DeliveryError;

use super::{Event, EventFormatter, Severity};

/// One JSON object per line, in the shape consumers parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl EventFormatter for JsonFormatter {
    fn format(&self, event: &Event) -> Result<String, DeliveryError> {
        Ok(event.to_json()?)
    }
}

#[derive(Debug, Clone)]
pub struct TextConfig {
    pub datetime_format: String,
    pub use_ansi: bool,
}

impl TextConfig {
    pub fn new() -> Self {
        Self {
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            use_ansi: true,
        }
    }

    pub fn with_ansi(self, use_ansi: bool) -> Self {
        Self { use_ansi, ..self }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Human readable `[time] LVL: message key=value trace_id=...` lines.
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    fn timestamp(&self, event: &Event) -> String {
        let time = event
            .timestamp()
            .with_timezone(&Local)
            .format(&self.config.datetime_format);
        let time = format!("[{}]", time);

        if self.config.use_ansi {
            time.bright_black().to_string()
        } else {
            time
        }
    }

    fn format_level(&self, level: Severity) -> String {
        let label = match level {
            Severity::Error => "ERR",
            Severity::Warn => "WRN",
            Severity::Info => "INF",
            Severity::Debug => "DEB",
        };

        if !self.config.use_ansi {
            return label.to_string();
        }

        match level {
            Severity::Error => label.red().to_string(),
            Severity::Warn => label.yellow().to_string(),
            Severity::Info => label.green().to_string(),
            Severity::Debug => label.blue().to_string(),
        }
    }

    fn format_msg(&self, message: &str) -> String {
        if self.config.use_ansi {
            message.bold().to_string()
        } else {
            message.to_string()
        }
    }

    fn format_fields(&self, event: &Event) -> String {
        let mut fields = String::new();

        for (key, value) in event.metadata() {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            fields.push_str(&format!(" {}={}", key, value));
        }

        if let Some(trace_id) = event.trace_id() {
            fields.push_str(&format!(" trace_id={}", trace_id));
        }

        fields
    }
}

impl EventFormatter for TextFormatter {
    fn format(&self, event: &Event) -> Result<String, DeliveryError> {
        Ok(format!(
            "{} {}: {}{}",
            self.timestamp(event),
            self.format_level(event.level()),
            self.format_msg(event.message()),
            self.format_fields(event),
        ))
    }
}
