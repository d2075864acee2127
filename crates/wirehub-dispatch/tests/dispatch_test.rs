//! Dispatcher tests against an in-process HTTP fixture bound to an
//! ephemeral loopback port.

use std::collections::HashMap;

use axum::Router;
use axum::extract::Multipart;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use wirehub_core::ErrorKind;
use wirehub_core::config::http::HttpConfig;
use wirehub_dispatch::{HttpDispatcher, ImagePart, JsonDecoder, StreamEvent, TextDecoder};

#[derive(Debug, Deserialize, PartialEq)]
struct Payload {
    name: String,
    count: u32,
}

fn dispatcher() -> HttpDispatcher {
    let config = HttpConfig {
        stream_throttle_ms: 1,
        ..HttpConfig::default()
    };
    HttpDispatcher::new(&config).expect("client should build")
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("fixture should bind");
    let addr = listener.local_addr().expect("fixture has an address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Runs a dispatch call and collects every emitted event in order.
fn event_channel() -> (
    impl Fn(StreamEvent) + Send + 'static,
    mpsc::UnboundedReceiver<StreamEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            let _ = tx.send(event);
        },
        rx,
    )
}

fn drain(mut rx: mpsc::UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn unary_get_decodes_json() {
    let app = Router::new().route(
        "/payload",
        get(|| async { r#"{"name":"wirehub","count":3}"# }),
    );
    let base = serve(app).await;

    let result: Option<Payload> = dispatcher()
        .get(
            &format!("{base}/payload"),
            &HashMap::new(),
            &JsonDecoder,
            |_| None,
        )
        .await;

    assert_eq!(
        result,
        Some(Payload {
            name: "wirehub".to_string(),
            count: 3,
        })
    );
}

#[tokio::test]
async fn unary_decode_failure_uses_fallback() {
    let app = Router::new().route("/garbage", get(|| async { "definitely not json" }));
    let base = serve(app).await;

    let result: Option<Payload> = dispatcher()
        .get(
            &format!("{base}/garbage"),
            &HashMap::new(),
            &JsonDecoder,
            |e| {
                assert_eq!(e.kind(), ErrorKind::Decode);
                Some(Payload {
                    name: "fallback".to_string(),
                    count: 0,
                })
            },
        )
        .await;

    assert_eq!(result.expect("fallback value").name, "fallback");
}

#[tokio::test]
async fn unary_http_error_reaches_fallback_with_body() {
    let app = Router::new().route(
        "/broken",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "kaboom") }),
    );
    let base = serve(app).await;

    let result = dispatcher()
        .get(
            &format!("{base}/broken"),
            &HashMap::new(),
            &TextDecoder,
            |e| {
                assert_eq!(e.kind(), ErrorKind::Connection);
                assert!(e.message.contains("500"));
                assert!(e.message.contains("kaboom"));
                Some("recovered".to_string())
            },
        )
        .await;

    assert_eq!(result.as_deref(), Some("recovered"));
}

#[tokio::test]
async fn unary_post_forwards_headers_and_body() {
    let app = Router::new().route(
        "/echo",
        post(
            |headers: header::HeaderMap, body: String| async move {
                let token = headers
                    .get("x-token")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing");
                format!("{token}:{body}")
            },
        ),
    );
    let base = serve(app).await;

    let mut headers = HashMap::new();
    headers.insert("x-token".to_string(), "secret".to_string());

    let result = dispatcher()
        .post(
            &format!("{base}/echo"),
            &headers,
            Some("text/plain"),
            "hello".to_string(),
            &TextDecoder,
            |_| None,
        )
        .await;

    assert_eq!(result.as_deref(), Some("secret:hello"));
}

#[tokio::test]
async fn sse_emits_data_then_finish() {
    let app = Router::new().route(
        "/sse",
        post(|| async {
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                "data: a\n\ndata: b\n\ndata: c\n\n",
            )
        }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_sse(
            &format!("{base}/sse"),
            &HashMap::new(),
            Some("application/json"),
            "{}".to_string(),
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(
        events,
        vec![
            StreamEvent::Data("a".to_string()),
            StreamEvent::Data("b".to_string()),
            StreamEvent::Data("c".to_string()),
            StreamEvent::Finish,
        ]
    );
}

#[tokio::test]
async fn sse_midstream_failure_ends_with_single_error() {
    let app = Router::new().route(
        "/sse",
        post(|| async {
            let chunks = futures::stream::iter(vec![
                Ok::<_, std::io::Error>(Bytes::from("data: a\n\n")),
                Err(std::io::Error::other("connection reset")),
            ])
            // Yield between items so the first chunk is flushed to the
            // client before the body stream fails.
            .then(|item| async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                item
            });
            Response::new(axum::body::Body::from_stream(chunks))
        }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_sse(
            &format!("{base}/sse"),
            &HashMap::new(),
            None,
            "{}".to_string(),
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(events.len(), 2, "expected data then a single error: {events:?}");
    assert_eq!(events[0], StreamEvent::Data("a".to_string()));
    assert!(events[1].is_error());
}

#[tokio::test]
async fn sse_http_error_emits_error_without_data() {
    let app = Router::new().route(
        "/sse",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_sse(
            &format!("{base}/sse"),
            &HashMap::new(),
            None,
            "{}".to_string(),
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(events.len(), 1);
    assert!(events[0].is_error());
    assert!(events[0].payload().unwrap().contains("503"));
}

#[tokio::test]
async fn multipart_sse_sends_both_parts_and_suppresses_sentinel() {
    let app = Router::new().route(
        "/upload",
        post(|mut multipart: Multipart| async move {
            let mut parts = Vec::new();
            while let Some(field) = multipart.next_field().await.expect("valid multipart") {
                let name = field.name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.expect("readable part");
                parts.push(format!("{name}={content_type}:{}", bytes.len()));
            }
            let body = format!(
                "data: {}\n\ndata: [DONE]\n\ndata: tail\n\n",
                parts.join("|")
            );
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_sse_multipart(
            &format!("{base}/upload"),
            &HashMap::new(),
            r#"{"prompt":"hi"}"#.to_string(),
            ImagePart {
                file_name: "shot.jpg".to_string(),
                bytes: vec![0xFF, 0xD8, 0xFF],
            },
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(
        events,
        vec![
            StreamEvent::Data("data=application/json:15|image=image/jpeg:3".to_string()),
            StreamEvent::Data("tail".to_string()),
            StreamEvent::Finish,
        ]
    );
}

#[tokio::test]
async fn raw_stream_emits_lines_in_order_and_skips_blanks() {
    let app = Router::new().route(
        "/lines",
        post(|| async { "one\ntwo\n\nthree\n" }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_stream(
            &format!("{base}/lines"),
            &HashMap::new(),
            None,
            "{}".to_string(),
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(
        events,
        vec![
            StreamEvent::Data("one".to_string()),
            StreamEvent::Data("two".to_string()),
            StreamEvent::Data("three".to_string()),
            StreamEvent::Finish,
        ]
    );
}

#[tokio::test]
async fn raw_stream_midstream_failure_ends_with_single_error() {
    let app = Router::new().route(
        "/lines",
        post(|| async {
            let chunks = futures::stream::iter(vec![
                Ok::<_, std::io::Error>(Bytes::from("one\n")),
                Err(std::io::Error::other("connection reset")),
            ])
            // Yield between items so the first chunk is flushed to the
            // client before the body stream fails.
            .then(|item| async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                item
            });
            Response::new(axum::body::Body::from_stream(chunks))
        }),
    );
    let base = serve(app).await;

    let (on_event, rx) = event_channel();
    dispatcher()
        .post_stream(
            &format!("{base}/lines"),
            &HashMap::new(),
            None,
            "{}".to_string(),
            on_event,
        )
        .await;

    let events = drain(rx);
    assert_eq!(events.len(), 2, "expected data then a single error: {events:?}");
    assert_eq!(events[0], StreamEvent::Data("one".to_string()));
    assert!(events[1].is_error());
}
