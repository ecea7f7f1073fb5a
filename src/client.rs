//! MetaWeblog client façade.
//!
//! A [`MetaWeblogClient`] owns an immutable [`ClientConfig`] and a shared
//! transport handle. Each operation validates its input, assembles the call,
//! performs exactly one round trip and hands back the decoded result
//! unchanged. Failures are never retried or logged here; they surface to the
//! caller with their original kind.
//!
//! Clients are cheap to clone and safe to share across tasks: nothing in them
//! changes after construction. Switching blog or charset produces a derived
//! client ([`with_blog_id`](MetaWeblogClient::with_blog_id),
//! [`with_encoding`](MetaWeblogClient::with_encoding)) and leaves calls in
//! flight on the original untouched.

use crate::config::ClientConfig;
use crate::encoding::lookup_encoding;
use crate::error::{MetaWeblogError, Result};
use crate::http::HttpTransport;
use crate::media::MediaObject;
use crate::post::PostStruct;
use crate::request::{self, Credentials, RpcCall};
use crate::traits::RpcTransport;
use crate::value::Value;
use std::sync::Arc;
use tracing::debug;

/// Client for one MetaWeblog XML-RPC endpoint.
#[derive(Debug, Clone)]
pub struct MetaWeblogClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn RpcTransport>,
}

impl MetaWeblogClient {
    /// Connects to `config.address` with the default HTTP transport.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Shorthand for [`connect`](Self::connect) with just an address and
    /// optional credentials.
    pub fn new(address: &str, username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let config = ClientConfig::builder(address)
            .credentials(username.unwrap_or_default(), password.unwrap_or_default())
            .build()?;
        Self::connect(config)
    }

    /// Builds a client around a caller-supplied transport.
    ///
    /// The configuration is taken as given; call [`ClientConfig::validate`]
    /// or use the builder to check it first.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// A client for another blog on the same endpoint.
    ///
    /// Fails with [`MetaWeblogError::Config`] when `blog_id` does not fit an
    /// XML-RPC int.
    pub fn with_blog_id(&self, blog_id: u32) -> Result<Self> {
        let mut config = (*self.config).clone();
        config.blog_id = blog_id;
        config.wire_blog_id()?;
        Ok(Self::with_transport(config, Arc::clone(&self.transport)))
    }

    /// A client that sends text in another charset.
    pub fn with_encoding(&self, encoding: impl Into<String>) -> Result<Self> {
        let encoding = encoding.into();
        lookup_encoding(&encoding).map_err(|e| MetaWeblogError::config_error(e.to_string()))?;

        let mut config = (*self.config).clone();
        config.encoding = encoding;
        Ok(Self::with_transport(config, Arc::clone(&self.transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn address(&self) -> &str {
        &self.config.address
    }

    pub fn blog_id(&self) -> u32 {
        self.config.blog_id
    }

    pub fn encoding(&self) -> &str {
        &self.config.encoding
    }

    /// The transport calls are dispatched through.
    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    fn credentials(&self) -> Result<Credentials<'_>> {
        Ok(Credentials {
            blog_id: self.config.wire_blog_id()?,
            username: self.config.username.as_deref(),
            password: self.config.password.as_deref(),
            encoding: &self.config.encoding,
        })
    }

    async fn dispatch(&self, call: RpcCall) -> Result<Value> {
        debug!("Calling {} with {} params", call.method, call.params.len());
        self.transport.call(&call, &self.config.encoding).await
    }

    /// `metaWeblog.getPost`: fetches one post.
    pub async fn get_post(&self, post_id: &str) -> Result<Value> {
        let call = request::get_post(&self.credentials()?, post_id)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.getRecentPosts`: fetches the latest posts.
    ///
    /// `None` fetches 10; values below 1 are raised to 1.
    pub async fn get_recent_posts(&self, count: Option<i32>) -> Result<Value> {
        let call = request::get_recent_posts(&self.credentials()?, count);
        self.dispatch(call).await
    }

    /// `metaWeblog.newPost`: creates a post and returns the server's new id.
    pub async fn new_post(&self, post: &PostStruct, publish: bool) -> Result<Value> {
        let call = request::new_post(&self.credentials()?, post, publish)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.editPost`: replaces an existing post.
    pub async fn edit_post(&self, post_id: &str, post: &PostStruct, publish: bool) -> Result<Value> {
        let call = request::edit_post(&self.credentials()?, post_id, post, publish)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.deletePost`. Blogger-era servers expect an application key;
    /// without one `false` is sent.
    pub async fn delete_post(
        &self,
        post_id: &str,
        appkey: Option<&str>,
        publish: bool,
    ) -> Result<Value> {
        let call = request::delete_post(&self.credentials()?, post_id, appkey, publish)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.getCategories`
    pub async fn get_categories(&self) -> Result<Value> {
        let call = request::get_categories(&self.credentials()?);
        self.dispatch(call).await
    }

    /// `metaWeblog.newMediaObject`: uploads a file, usually returning a
    /// struct with its `url`.
    pub async fn new_media_object(&self, media: &MediaObject) -> Result<Value> {
        let call = request::new_media_object(&self.credentials()?, media)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.getTemplate`
    pub async fn get_template(&self, template_type: &str, appkey: Option<&str>) -> Result<Value> {
        let call = request::get_template(&self.credentials()?, template_type, appkey)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.setTemplate`
    pub async fn set_template(
        &self,
        template: &str,
        template_type: &str,
        appkey: Option<&str>,
    ) -> Result<Value> {
        let call = request::set_template(&self.credentials()?, template, template_type, appkey)?;
        self.dispatch(call).await
    }

    /// `metaWeblog.getUsersBlogs`: lists the blogs the user belongs to.
    pub async fn get_users_blogs(&self, appkey: Option<&str>) -> Result<Value> {
        let call = request::get_users_blogs(&self.credentials()?, appkey);
        self.dispatch(call).await
    }
}
