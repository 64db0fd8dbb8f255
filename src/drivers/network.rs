use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue, CONTENT_TYPE},
    HeaderMap, Method, Request, Uri,
};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use rustls::{ClientConfig, RootCertStore};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, Severity},
};

use super::runtime::DriverRuntime;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Shared HTTP plumbing for drivers that POST JSON documents.
#[derive(Clone)]
pub(crate) struct JsonPoster {
    client: HttpsClient,
    headers: Arc<HeaderMap>,
}

impl JsonPoster {
    pub(crate) fn new(headers: HeaderMap) -> Self {
        let builder = match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(err) => {
                // Plain http endpoints still work; https handshakes will fail.
                log::warn!("no native root certificates available: {}", err);
                let config = ClientConfig::builder()
                    .with_root_certificates(RootCertStore::empty())
                    .with_no_client_auth();
                HttpsConnectorBuilder::new().with_tls_config(config)
            }
        };

        let connector = builder.https_or_http().enable_http1().build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            headers: Arc::new(headers),
        }
    }

    pub(crate) async fn post(&self, uri: Uri, body: String) -> Result<(), DeliveryError> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(DeliveryError::transport)?;

        for (name, value) in self.headers.iter() {
            request.headers_mut().insert(name.clone(), value.clone());
        }

        let response = self
            .client
            .request(request)
            .await
            .map_err(DeliveryError::transport)?;
        let status = response.status();

        // Drain the body so the connection can be reused.
        let _ = response.into_body().collect().await;

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

pub(crate) fn parse_uri(
    driver: &str,
    key: &'static str,
    text: &str,
) -> Result<Uri, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidSetting {
        driver: driver.to_string(),
        key,
        reason,
    };

    let uri: Uri = text.parse().map_err(|err: http::uri::InvalidUri| invalid(err.to_string()))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => Ok(uri),
        _ => Err(invalid(format!("`{}` is not an http(s) URL", text))),
    }
}

pub(crate) fn header_map(
    settings: &DriverSettings<'_>,
) -> Result<HeaderMap, ConfigurationError> {
    let mut headers = HeaderMap::new();
    for (name, value) in settings.string_map("headers")? {
        let invalid = |reason: String| ConfigurationError::InvalidSetting {
            driver: settings.driver().to_string(),
            key: "headers",
            reason,
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| invalid(err.to_string()))?;
        let value = HeaderValue::from_str(&value).map_err(|err| invalid(err.to_string()))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// POSTs each event as a JSON document to a fixed endpoint.
pub struct HttpDriver {
    level: Severity,
    endpoint: Uri,
    poster: JsonPoster,
    runtime: DriverRuntime,
}

impl HttpDriver {
    pub fn new(
        level: Severity,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        Self::with_headers(level, endpoint, timeout, HeaderMap::new())
    }

    pub fn with_headers(
        level: Severity,
        endpoint: &str,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self, ConfigurationError> {
        let endpoint = parse_uri("http", "endpoint", endpoint)?;
        let runtime = DriverRuntime::new("http", timeout)
            .map_err(|err| ConfigurationError::unavailable("http", err))?;

        Ok(Self {
            level,
            endpoint,
            poster: JsonPoster::new(headers),
            runtime,
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_headers(
            settings.level()?,
            settings.required_str("endpoint")?,
            settings.timeout()?,
            header_map(settings)?,
        )
    }
}

impl Driver for HttpDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let body = event.to_json()?;
        let poster = self.poster.clone();
        let endpoint = self.endpoint.clone();

        self.runtime
            .run(async move { poster.post(endpoint, body).await })
    }

    fn name(&self) -> &str {
        "http"
    }
}
