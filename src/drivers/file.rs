use std::{
    fs::File,
    io::{LineWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, EventFormatter, JsonFormatter, Severity},
};

use super::console::formatter_from_settings;

/// Appends one line per event to a file, JSON by default.
pub struct FileDriver {
    level: Severity,
    file: Mutex<LineWriter<File>>,
    file_path: PathBuf,
    formatter: Box<dyn EventFormatter>,
}

impl FileDriver {
    pub fn open(level: Severity, path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::with_formatter(level, path, Box::new(JsonFormatter))
    }

    /// Opens `path` for appending, creating it and any missing parent
    /// directories.
    pub fn with_formatter(
        level: Severity,
        path: impl AsRef<Path>,
        formatter: Box<dyn EventFormatter>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            level,
            file: Mutex::new(LineWriter::new(file)),
            file_path: path.to_path_buf(),
            formatter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        let path = settings.required_str("file_path")?;
        let formatter = formatter_from_settings(settings)?;

        Self::with_formatter(settings.level()?, path, formatter).map_err(|err| {
            ConfigurationError::unavailable(
                settings.driver(),
                format!("failed opening or creating log file {}: {}", path, err),
            )
        })
    }
}

impl Driver for FileDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let line = self.formatter.format(event)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)?;
        file.flush()?;

        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }

    fn flush(&self) {
        let _ = self
            .file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}
