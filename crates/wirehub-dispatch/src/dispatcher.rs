//! Shared HTTP client and unary request execution.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use wirehub_core::config::http::HttpConfig;
use wirehub_core::{NetError, NetResult};

use crate::decode::ResponseDecoder;

/// Streaming HTTP request dispatcher.
///
/// One shared client serves every call; the client is constructed once and
/// read-mostly afterwards, so the dispatcher is cheap to share behind an
/// `Arc`. Each dispatch call is a self-contained task with no cross-call
/// state.
#[derive(Debug)]
pub struct HttpDispatcher {
    pub(crate) client: reqwest::Client,
    pub(crate) config: HttpConfig,
}

impl HttpDispatcher {
    /// Builds the shared client with the configured fixed timeouts.
    pub fn new(config: &HttpConfig) -> NetResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .read_timeout(Duration::from_secs(config.read_timeout_seconds))
            .build()
            .map_err(|e| {
                NetError::with_source(
                    wirehub_core::ErrorKind::Configuration,
                    "failed to build HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Unary GET.
    ///
    /// Awaits the full response body and decodes it with the supplied
    /// strategy. Any failure, network or decode, is logged and funneled
    /// into the fallback producer; nothing is raised past this boundary.
    pub async fn get<T>(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        decoder: &dyn ResponseDecoder<T>,
        fallback: impl FnOnce(&NetError) -> Option<T>,
    ) -> Option<T> {
        let result = self
            .request_text(self.client.get(url), url, headers, None, None)
            .await
            .and_then(|body| decoder.decode(&body));

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url = %url, error = %e, "GET request failed");
                fallback(&e)
            }
        }
    }

    /// Unary POST.
    ///
    /// Same contract as [`get`], with a string body and optional
    /// content type.
    ///
    /// [`get`]: Self::get
    pub async fn post<T>(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        content_type: Option<&str>,
        body: String,
        decoder: &dyn ResponseDecoder<T>,
        fallback: impl FnOnce(&NetError) -> Option<T>,
    ) -> Option<T> {
        let result = self
            .request_text(self.client.post(url), url, headers, content_type, Some(body))
            .await
            .and_then(|b| decoder.decode(&b));

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url = %url, error = %e, "POST request failed");
                fallback(&e)
            }
        }
    }

    /// Sends one request and awaits the full response body.
    async fn request_text(
        &self,
        builder: reqwest::RequestBuilder,
        url: &str,
        headers: &HashMap<String, String>,
        content_type: Option<&str>,
        body: Option<String>,
    ) -> NetResult<String> {
        let mut builder = apply_headers(builder, headers);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        debug!(url = %url, header_count = headers.len(), "sending unary request");

        let response = builder.send().await.map_err(|e| {
            NetError::with_source(wirehub_core::ErrorKind::Connection, "request failed", e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            NetError::with_source(
                wirehub_core::ErrorKind::Connection,
                "failed to read response body",
                e,
            )
        })?;

        if !status.is_success() {
            return Err(NetError::connection(format!(
                "HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }

        debug!(url = %url, len = text.len(), "unary request succeeded");
        Ok(text)
    }
}

/// Appends a caller-supplied header mapping to a request.
pub(crate) fn apply_headers(
    mut builder: reqwest::RequestBuilder,
    headers: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder
}

/// Caps error-message bodies at `max` bytes on a char boundary.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
