//! Raw chunked line streaming with a fixed pacing delay between lines.

use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::dispatcher::{HttpDispatcher, apply_headers, truncate};
use crate::event::{EventSink, StreamEvent};

impl HttpDispatcher {
    /// Streaming POST over a raw chunked body, split into lines.
    ///
    /// Non-empty lines fire `Data(line)` in arrival order, each preceded by
    /// a fixed pacing delay. Empty lines are skipped without delaying.
    /// Normal end-of-body fires `Finish`; any failure fires `Error` once.
    pub async fn post_stream(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        content_type: Option<&str>,
        body: String,
        on_event: impl Fn(StreamEvent),
    ) {
        let mut sink = EventSink::new(on_event);

        let builder = apply_headers(self.client.post(url), headers)
            .header(CONTENT_TYPE, content_type.unwrap_or("application/json"))
            .body(body);

        debug!(url = %url, "starting raw stream request");
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

        let throttle = Duration::from_millis(self.config.stream_throttle_ms);
        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let reader = StreamReader::new(byte_stream);
        let mut lines = FramedRead::new(reader, LinesCodec::new());

        while let Some(item) = lines.next().await {
            match item {
                Ok(line) => {
                    if line.is_empty() {
                        continue;
                    }
                    tokio::time::sleep(throttle).await;
                    sink.data(line);
                }
                Err(e) => {
                    sink.fail(format!("stream failed: {e}"));
                    return;
                }
            }
        }

        debug!("raw stream completed");
        sink.finish();
    }
}
