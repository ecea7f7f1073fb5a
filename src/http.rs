//! Default HTTP transport for XML-RPC calls.
//!
//! One call is one POST. There is no retry here: a failed round trip is
//! reported to the caller as-is, and the caller decides whether to try again.

use crate::config::ClientConfig;
use crate::error::{MetaWeblogError, Result};
use crate::request::RpcCall;
use crate::traits::RpcTransport;
use crate::value::Value;
use crate::xmlrpc;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, trace};

/// reqwest-backed [`RpcTransport`] bound to one endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Creates a transport for the endpoint and timeouts in `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.http.user_agent)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, call: &RpcCall, encoding: &str) -> Result<Value> {
        let body = xmlrpc::encode_document(call, encoding)?;
        trace!("POST {} ({} bytes)", self.endpoint, body.len());

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(
                CONTENT_TYPE,
                format!("text/xml; charset={}", encoding.trim()),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MetaWeblogError::transport_error(format!(
                "HTTP {status}: {}",
                error_text.trim()
            )));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_type_charset)
            .map(str::to_string);
        let bytes = response.bytes().await?;
        debug!("{} returned {} bytes", call.method, bytes.len());

        let text = xmlrpc::decode_document(&bytes, charset.as_deref())?;
        xmlrpc::decode_response(&text)
    }
}

/// Extracts `charset=...` from a Content-Type header value.
fn content_type_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
