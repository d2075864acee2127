//! Server-sent-event dispatch: plain streaming POST and the multipart
//! variant.

use std::collections::HashMap;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use wirehub_core::{NetError, NetResult};

use crate::dispatcher::{HttpDispatcher, apply_headers, truncate};
use crate::event::{EventSink, StreamEvent};

/// Sentinel payload that suppresses its own `Data` callback on the
/// multipart path.
const DONE_SENTINEL: &str = "[DONE]";

/// Binary image attachment for the multipart SSE body.
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// Filename carried in the content disposition.
    pub file_name: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl HttpDispatcher {
    /// Streaming SSE POST.
    ///
    /// Each inbound event fires `Data(payload)`; normal completion fires
    /// `Finish`; any failure fires `Error(message)` exactly once. Nothing
    /// follows a terminal callback.
    pub async fn post_sse(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        content_type: Option<&str>,
        body: String,
        on_event: impl Fn(StreamEvent),
    ) {
        let mut builder = apply_headers(self.client.post(url), headers);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder = builder.body(body);

        debug!(url = %url, "starting SSE request");
        self.run_sse(builder, None, on_event).await;
    }

    /// Streaming SSE POST with a two-part multipart body: a JSON text part
    /// plus a binary image part.
    ///
    /// Identical callback contract to [`post_sse`], except the `"[DONE]"`
    /// sentinel suppresses only that event's `Data` callback.
    ///
    /// [`post_sse`]: Self::post_sse
    pub async fn post_sse_multipart(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        json_part: String,
        image: ImagePart,
        on_event: impl Fn(StreamEvent),
    ) {
        let form = match build_multipart(json_part, image) {
            Ok(form) => form,
            Err(e) => {
                // Building the body never reached the wire; still one Error.
                EventSink::new(on_event).fail(e.to_string());
                return;
            }
        };

        let builder = apply_headers(self.client.post(url), headers).multipart(form);

        debug!(url = %url, "starting multipart SSE request");
        self.run_sse(builder, Some(DONE_SENTINEL), on_event).await;
    }

    /// Shared SSE send-and-pump loop.
    async fn run_sse(
        &self,
        builder: reqwest::RequestBuilder,
        sentinel: Option<&str>,
        on_event: impl Fn(StreamEvent),
    ) {
        let mut sink = EventSink::new(on_event);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                sink.fail(format!("request failed: {e}"));
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            sink.fail(format!("HTTP {status}: {}", truncate(&body, 200)));
            return;
        }

        let mut events = response.bytes_stream().eventsource();
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if sentinel.is_some_and(|s| event.data == s) {
                        debug!("sentinel event, suppressing data callback");
                        continue;
                    }
                    debug!(
                        data_len = event.data.len(),
                        event = %event.event,
                        id = %event.id,
                        "SSE event"
                    );
                    sink.data(event.data);
                }
                Err(e) => {
                    sink.fail(format!("stream failed: {e}"));
                    return;
                }
            }
        }

        debug!("SSE stream completed");
        sink.finish();
    }
}

/// Assembles the two-part body: JSON text part + binary image part.
fn build_multipart(json_part: String, image: ImagePart) -> NetResult<Form> {
    let data = Part::text(json_part)
        .mime_str("application/json")
        .map_err(|e| {
            NetError::with_source(
                wirehub_core::ErrorKind::Serialization,
                "invalid data part",
                e,
            )
        })?;
    let image_part = Part::bytes(image.bytes)
        .file_name(image.file_name)
        .mime_str("image/jpeg")
        .map_err(|e| {
            NetError::with_source(
                wirehub_core::ErrorKind::Serialization,
                "invalid image part",
                e,
            )
        })?;

    Ok(Form::new().part("data", data).part("image", image_part))
}
