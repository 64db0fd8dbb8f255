use std::{
    fmt::Display,
    net::{ToSocketAddrs, UdpSocket},
    str::FromStr,
    time::Duration,
};

use chrono::SecondsFormat;

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, Severity},
    utils::hostname,
};

pub const DEFAULT_ADDRESS: &str = "localhost:514";
pub const DEFAULT_APP_NAME: &str = "telemetry-app";

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Syslog facility codes (RFC 5424 section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Daemon = 3,
    Auth = 4,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl FromStr for Facility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let facility = match s.to_ascii_lowercase().as_str() {
            "kern" => Self::Kern,
            "user" => Self::User,
            "daemon" => Self::Daemon,
            "auth" => Self::Auth,
            "local0" => Self::Local0,
            "local1" => Self::Local1,
            "local2" => Self::Local2,
            "local3" => Self::Local3,
            "local4" => Self::Local4,
            "local5" => Self::Local5,
            "local6" => Self::Local6,
            "local7" => Self::Local7,
            other => return Err(format!("unknown syslog facility `{}`", other)),
        };
        Ok(facility)
    }
}

impl Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn severity_code(level: Severity) -> u8 {
    match level {
        Severity::Error => 3,
        Severity::Warn => 4,
        Severity::Info => 6,
        Severity::Debug => 7,
    }
}

pub fn priority(facility: Facility, level: Severity) -> u8 {
    (facility as u8) * 8 + severity_code(level)
}

/// Sends each event as an RFC 3164 style datagram to a syslog collector.
pub struct SyslogDriver {
    level: Severity,
    socket: UdpSocket,
    facility: Facility,
    app_name: String,
    hostname: String,
    pid: u32,
}

impl SyslogDriver {
    pub fn connect(
        level: Severity,
        address: &str,
        app_name: impl Into<String>,
        facility: Facility,
    ) -> std::io::Result<Self> {
        let target = address.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", address),
            )
        })?;

        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind)?;
        socket.connect(target)?;
        socket.set_write_timeout(Some(WRITE_TIMEOUT))?;

        Ok(Self {
            level,
            socket,
            facility,
            app_name: app_name.into(),
            hostname: hostname(),
            pid: std::process::id(),
        })
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        let address = settings.str_or("address", DEFAULT_ADDRESS)?;
        let app_name = settings.str_or("app_name", DEFAULT_APP_NAME)?;
        let facility = settings
            .str_or("facility", "user")?
            .parse()
            .map_err(|reason| ConfigurationError::InvalidSetting {
                driver: settings.driver().to_string(),
                key: "facility",
                reason,
            })?;

        Self::connect(settings.level()?, address, app_name, facility)
            .map_err(|err| ConfigurationError::unavailable(settings.driver(), err))
    }

    fn format(&self, event: &Event) -> String {
        let mut body = event.message().to_string();
        if let Some(trace_id) = event.trace_id() {
            body.push_str(&format!(" trace_id={}", trace_id));
        }

        format!(
            "<{}>{} {} {}[{}]: {}",
            priority(self.facility, event.level()),
            event.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
            self.hostname,
            self.app_name,
            self.pid,
            body
        )
    }
}

impl Driver for SyslogDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        self.socket.send(self.format(event).as_bytes())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "syslog"
    }
}
