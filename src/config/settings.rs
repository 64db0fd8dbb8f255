use std::time::Duration;

use serde_json::Value;

use crate::{
    errors::{ConfigurationError, UnknownSeverity},
    logging::Severity,
};

/// Free-form settings of one driver entry.
pub type Settings = serde_json::Map<String, Value>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed access to a driver's settings map. Every accessor reports missing
/// or malformed values as a [`ConfigurationError`] naming the driver and key.
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings<'a> {
    driver: &'a str,
    settings: &'a Settings,
    default_level: Severity,
}

impl<'a> DriverSettings<'a> {
    pub fn new(driver: &'a str, settings: &'a Settings, default_level: Severity) -> Self {
        Self {
            driver,
            settings,
            default_level,
        }
    }

    pub fn driver(&self) -> &'a str {
        self.driver
    }

    fn invalid(&self, key: &'static str, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::InvalidSetting {
            driver: self.driver.to_string(),
            key,
            reason: reason.into(),
        }
    }

    pub fn optional_str(&self, key: &'static str) -> Result<Option<&'a str>, ConfigurationError> {
        match self.settings.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(self.invalid(key, format!("expected a string, found {}", other))),
        }
    }

    pub fn required_str(&self, key: &'static str) -> Result<&'a str, ConfigurationError> {
        match self.optional_str(key)? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            Some(_) => Err(self.invalid(key, "must not be empty")),
            None => Err(ConfigurationError::MissingSetting {
                driver: self.driver.to_string(),
                key,
            }),
        }
    }

    pub fn str_or(
        &self,
        key: &'static str,
        default: &'a str,
    ) -> Result<&'a str, ConfigurationError> {
        Ok(self.optional_str(key)?.unwrap_or(default))
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigurationError> {
        match self.settings.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(self.invalid(key, format!("expected a boolean, found {}", other))),
        }
    }

    /// The driver's own threshold, falling back to the document's level.
    pub fn level(&self) -> Result<Severity, ConfigurationError> {
        match self.optional_str("level")? {
            Some(name) => name
                .parse()
                .map_err(|err: UnknownSeverity| self.invalid("level", err.to_string())),
            None => Ok(self.default_level),
        }
    }

    /// `timeout` as a humantime string (`"250ms"`, `"5s"`) or whole
    /// milliseconds.
    pub fn timeout(&self) -> Result<Duration, ConfigurationError> {
        match self.settings.get("timeout") {
            None | Some(Value::Null) => Ok(DEFAULT_TIMEOUT),
            Some(Value::String(text)) => humantime::parse_duration(text)
                .map_err(|err| self.invalid("timeout", err.to_string())),
            Some(Value::Number(millis)) => millis
                .as_u64()
                .map(Duration::from_millis)
                .ok_or_else(|| {
                    self.invalid("timeout", "expected a positive number of milliseconds")
                }),
            Some(other) => {
                Err(self.invalid("timeout", format!("expected a duration, found {}", other)))
            }
        }
    }

    /// A single string or an array of strings.
    pub fn string_list(
        &self,
        key: &'static str,
    ) -> Result<Option<Vec<String>>, ConfigurationError> {
        match self.settings.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(vec![value.clone()])),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(key, "expected an array of strings"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => {
                Err(self.invalid(key, format!("expected a string list, found {}", other)))
            }
        }
    }

    /// An object whose values are all strings.
    pub fn string_map(
        &self,
        key: &'static str,
    ) -> Result<Vec<(String, String)>, ConfigurationError> {
        match self.settings.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(name, value)| match value {
                    Value::String(value) => Ok((name.clone(), value.clone())),
                    _ => Err(self.invalid(key, format!("value of `{}` must be a string", name))),
                })
                .collect(),
            Some(other) => Err(self.invalid(key, format!("expected an object, found {}", other))),
        }
    }
}
