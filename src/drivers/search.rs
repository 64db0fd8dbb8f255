use std::time::Duration;

use http::{HeaderMap, Uri};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, Severity},
};

use super::{
    network::{header_map, parse_uri, JsonPoster},
    runtime::DriverRuntime,
};

pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Indexes each event as a document in an Elasticsearch-compatible search
/// index (`POST {url}/{index}/_doc`).
pub struct SearchIndexDriver {
    level: Severity,
    document_uri: Uri,
    poster: JsonPoster,
    runtime: DriverRuntime,
}

impl SearchIndexDriver {
    pub fn new(
        level: Severity,
        url: &str,
        index: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        Self::with_headers(level, url, index, timeout, HeaderMap::new())
    }

    pub fn with_headers(
        level: Severity,
        url: &str,
        index: &str,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self, ConfigurationError> {
        if index.is_empty() || index.contains('/') {
            return Err(ConfigurationError::InvalidSetting {
                driver: "elasticsearch".to_string(),
                key: "index",
                reason: format!("`{}` is not a valid index name", index),
            });
        }

        let document_uri = parse_uri(
            "elasticsearch",
            "url",
            &format!("{}/{}/_doc", url.trim_end_matches('/'), index),
        )?;
        let runtime = DriverRuntime::new("search", timeout)
            .map_err(|err| ConfigurationError::unavailable("elasticsearch", err))?;

        Ok(Self {
            level,
            document_uri,
            poster: JsonPoster::new(headers),
            runtime,
        })
    }

    pub fn document_uri(&self) -> &Uri {
        &self.document_uri
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_headers(
            settings.level()?,
            settings.str_or("url", DEFAULT_URL)?,
            settings.required_str("index")?,
            settings.timeout()?,
            header_map(settings)?,
        )
    }
}

impl Driver for SearchIndexDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let body = event.to_json()?;
        let poster = self.poster.clone();
        let uri = self.document_uri.clone();

        self.runtime.run(async move { poster.post(uri, body).await })
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}
