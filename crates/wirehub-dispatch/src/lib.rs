//! # wirehub-dispatch
//!
//! Streaming HTTP request dispatcher. One shared client executes unary,
//! SSE, multipart-SSE, and raw chunked requests, normalizing every outcome
//! into a three-state event callback: zero or more `Data`, then exactly one
//! of `Finish`/`Error`.
//!
//! Each call is self-contained: no registry, no cross-call state. Unary
//! failures are funneled into a caller-supplied fallback producer and never
//! raised past the call boundary.

pub mod decode;
pub mod dispatcher;
pub mod event;
mod sse;
mod stream;

pub use decode::{FnDecoder, JsonDecoder, ResponseDecoder, TextDecoder};
pub use dispatcher::HttpDispatcher;
pub use event::StreamEvent;
pub use sse::ImagePart;
