use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, EventFormatter, JsonFormatter, Severity, TextConfig, TextFormatter},
};

/// Writes one formatted line per event to stdout, stderr or any writer.
pub struct ConsoleDriver {
    level: Severity,
    writer: Mutex<Box<dyn Write + Send>>,
    formatter: Box<dyn EventFormatter>,
}

impl ConsoleDriver {
    /// JSON lines on stdout.
    pub fn new(level: Severity) -> Self {
        Self::stdout(level, Box::new(JsonFormatter))
    }

    pub fn stdout(level: Severity, formatter: Box<dyn EventFormatter>) -> Self {
        Self::with_writer(level, std::io::stdout(), formatter)
    }

    pub fn stderr(level: Severity, formatter: Box<dyn EventFormatter>) -> Self {
        Self::with_writer(level, std::io::stderr(), formatter)
    }

    pub fn with_writer(
        level: Severity,
        writer: impl Write + Send + 'static,
        formatter: Box<dyn EventFormatter>,
    ) -> Self {
        Self {
            level,
            writer: Mutex::new(Box::new(writer)),
            formatter,
        }
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        let level = settings.level()?;
        let formatter = formatter_from_settings(settings)?;

        match settings.str_or("stream", "stdout")? {
            "stdout" => Ok(Self::stdout(level, formatter)),
            "stderr" => Ok(Self::stderr(level, formatter)),
            other => Err(ConfigurationError::InvalidSetting {
                driver: settings.driver().to_string(),
                key: "stream",
                reason: format!("expected `stdout` or `stderr`, found `{}`", other),
            }),
        }
    }
}

/// `format` = `json` (default) or `text`; `ansi` toggles colours for text.
pub(crate) fn formatter_from_settings(
    settings: &DriverSettings<'_>,
) -> Result<Box<dyn EventFormatter>, ConfigurationError> {
    match settings.str_or("format", "json")? {
        "json" => Ok(Box::new(JsonFormatter)),
        "text" => {
            let config = TextConfig::new().with_ansi(settings.bool_or("ansi", true)?);
            Ok(Box::new(TextFormatter::new(config)))
        }
        other => Err(ConfigurationError::InvalidSetting {
            driver: settings.driver().to_string(),
            key: "format",
            reason: format!("expected `json` or `text`, found `{}`", other),
        }),
    }
}

impl Driver for ConsoleDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let line = self.formatter.format(event)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn flush(&self) {
        let _ = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}
