//! Response decoding strategies.
//!
//! The decoder is supplied explicitly per call; the dispatcher never
//! inspects the target type at runtime to choose between text and
//! structured decoding.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use wirehub_core::{NetError, NetResult};

/// Strategy for turning a response body into a typed value.
pub trait ResponseDecoder<T>: Send + Sync {
    /// Decode the full response body.
    fn decode(&self, body: &str) -> NetResult<T>;
}

/// Decodes the body as JSON into any deserializable type.
///
/// Lenient about surrounding whitespace.
#[derive(Debug, Default)]
pub struct JsonDecoder;

impl<T: DeserializeOwned> ResponseDecoder<T> for JsonDecoder {
    fn decode(&self, body: &str) -> NetResult<T> {
        serde_json::from_str(body.trim())
            .map_err(|e| NetError::with_source(wirehub_core::ErrorKind::Decode, "JSON body did not match expected shape", e))
    }
}

/// Returns the body verbatim.
#[derive(Debug, Default)]
pub struct TextDecoder;

impl ResponseDecoder<String> for TextDecoder {
    fn decode(&self, body: &str) -> NetResult<String> {
        Ok(body.to_string())
    }
}

/// Adapts a plain function into a decoder.
pub struct FnDecoder<T, F>
where
    F: Fn(&str) -> NetResult<T> + Send + Sync,
{
    decode: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FnDecoder<T, F>
where
    F: Fn(&str) -> NetResult<T> + Send + Sync,
{
    /// Wrap a decoding function.
    pub fn new(decode: F) -> Self {
        Self {
            decode,
            _marker: PhantomData,
        }
    }
}

impl<T, F> ResponseDecoder<T> for FnDecoder<T, F>
where
    F: Fn(&str) -> NetResult<T> + Send + Sync,
{
    fn decode(&self, body: &str) -> NetResult<T> {
        (self.decode)(body)
    }
}
