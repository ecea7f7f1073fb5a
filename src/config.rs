//! Client configuration.
//!
//! A [`ClientConfig`] is fixed once a client is built. To talk to another blog
//! on the same server, or in another charset, derive a new client with
//! [`MetaWeblogClient::with_blog_id`](crate::MetaWeblogClient::with_blog_id)
//! or [`MetaWeblogClient::with_encoding`](crate::MetaWeblogClient::with_encoding)
//! instead of mutating shared state.
//!
//! ## Usage
//!
//! ```rust
//! use metaweblog_rs::config::{ClientConfig, HttpConfig};
//! use metaweblog_rs::Result;
//!
//! fn example() -> Result<()> {
//!     let config = ClientConfig::builder("https://blog.example/xmlrpc.php")
//!         .credentials("admin", "secret")
//!         .blog_id(3)
//!         .encoding("ISO-8859-1")
//!         .http(HttpConfig::builder().request_timeout_secs(60).build())
//!         .build()?;
//!
//!     assert_eq!(config.blog_id, 3);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

use crate::encoding::lookup_encoding;
use crate::error::{MetaWeblogError, Result};
use crate::utils;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default target charset.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Blog id used by single-blog installations.
pub const SINGLE_BLOG_ID: u32 = 0;

/// Largest blog id an XML-RPC `<int>` can carry.
pub const MAX_BLOG_ID: u32 = i32::MAX as u32;

/// Connection and session settings for one MetaWeblog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full XML-RPC endpoint, e.g. `https://blog.example/xmlrpc.php`
    pub address: String,
    /// Login name; sent as `nil` when absent
    #[serde(default)]
    pub username: Option<String>,
    /// Password; sent as `nil` when absent
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Target blog (0 in single-blog mode), at most [`MAX_BLOG_ID`]
    #[serde(default)]
    pub blog_id: u32,
    /// Charset for outgoing text (default: UTF-8)
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Overrides the port in `address`
    #[serde(default)]
    pub port: Option<u16>,
    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP client settings for the default transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
    /// User agent string for requests
    pub user_agent: String,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("metaweblog-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `address` with every other field defaulted.
    ///
    /// Fails with [`MetaWeblogError::Config`] if the address is empty or not
    /// an http(s) URL.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::builder(address).build()
    }

    /// Creates a new configuration builder.
    pub fn builder(address: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(address)
    }

    /// Validates the configuration for consistency and constraints.
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        self.wire_blog_id()?;

        if self.port == Some(0) {
            return Err(MetaWeblogError::config_error(
                "port must be between 1 and 65535",
            ));
        }

        lookup_encoding(&self.encoding)
            .map_err(|e| MetaWeblogError::config_error(e.to_string()))?;

        if self.http.request_timeout_secs == 0 {
            return Err(MetaWeblogError::config_error(
                "request_timeout_secs must be greater than 0",
            ));
        }

        if self.http.connect_timeout_secs == 0 {
            return Err(MetaWeblogError::config_error(
                "connect_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// The blog id as a signed XML-RPC int.
    ///
    /// Fails with [`MetaWeblogError::Config`] above [`MAX_BLOG_ID`].
    pub fn wire_blog_id(&self) -> Result<i32> {
        i32::try_from(self.blog_id).map_err(|_| {
            MetaWeblogError::config_error(format!(
                "blog_id {} exceeds the XML-RPC int range (max {MAX_BLOG_ID})",
                self.blog_id
            ))
        })
    }

    /// The endpoint URL with the port override applied.
    pub fn endpoint(&self) -> Result<Url> {
        utils::parse_endpoint(&self.address, self.port)
    }

    /// Converts HTTP timeout to Duration types for easier use.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Converts HTTP timeout to Duration types for easier use.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }
}

/// Builder for creating ClientConfig instances.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    address: String,
    username: Option<String>,
    password: Option<String>,
    blog_id: u32,
    encoding: Option<String>,
    port: Option<u16>,
    http: Option<HttpConfig>,
}

impl ClientConfigBuilder {
    fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: None,
            password: None,
            blog_id: SINGLE_BLOG_ID,
            encoding: None,
            port: None,
            http: None,
        }
    }

    /// Sets username and password. Empty strings count as absent.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into()).filter(|u| !u.is_empty());
        self.password = Some(password.into()).filter(|p| !p.is_empty());
        self
    }

    /// Sets the target blog id.
    pub fn blog_id(mut self, blog_id: u32) -> Self {
        self.blog_id = blog_id;
        self
    }

    /// Sets the target charset label.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Overrides the endpoint port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the HTTP configuration.
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let config = ClientConfig {
            address: self.address.trim().to_string(),
            username: self.username,
            password: self.password,
            blog_id: self.blog_id,
            encoding: self.encoding.unwrap_or_else(default_encoding),
            port: self.port,
            http: self.http.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl HttpConfig {
    /// Creates a new HTTP config builder.
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::default()
    }
}

/// Builder for HttpConfig.
#[derive(Debug, Default)]
pub struct HttpConfigBuilder {
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl HttpConfigBuilder {
    pub fn request_timeout_secs(mut self, timeout: u64) -> Self {
        self.request_timeout_secs = Some(timeout);
        self
    }

    pub fn connect_timeout_secs(mut self, timeout: u64) -> Self {
        self.connect_timeout_secs = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> HttpConfig {
        let default = HttpConfig::default();
        HttpConfig {
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(default.request_timeout_secs),
            connect_timeout_secs: self
                .connect_timeout_secs
                .unwrap_or(default.connect_timeout_secs),
            user_agent: self.user_agent.unwrap_or(default.user_agent),
        }
    }
}
