//! Trait abstractions for the MetaWeblog client.
//!
//! [`RpcTransport`] is the seam between request construction and the wire.
//! The crate ships [`HttpTransport`](crate::http::HttpTransport); tests and
//! callers with their own HTTP stack can plug in anything else.

use crate::error::Result;
use crate::request::RpcCall;
use crate::value::Value;
use async_trait::async_trait;

/// Sends one XML-RPC call and returns the decoded result.
///
/// Implementations must report failures as:
/// - [`MetaWeblogError::Transport`](crate::MetaWeblogError::Transport) for
///   network and HTTP errors,
/// - [`MetaWeblogError::Protocol`](crate::MetaWeblogError::Protocol) for
///   malformed response envelopes,
/// - [`MetaWeblogError::RemoteFault`](crate::MetaWeblogError::RemoteFault)
///   for `<fault>` responses.
///
/// Values tagged [`Value::Base64`] must go on the wire as `<base64>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + std::fmt::Debug {
    /// Performs a single round trip, serializing text in `encoding`.
    async fn call(&self, call: &RpcCall, encoding: &str) -> Result<Value>;
}
