//! # MetaWeblog Rust client
//!
//! A client for the MetaWeblog XML-RPC API: create, edit and delete posts,
//! list categories and blogs, manage templates and upload media.
//!
//! ## Features
//!
//! - **Typed posts**: required fields are enforced at compile time, optional
//!   fields get the MetaWeblog defaults (`post_type = "post"`, comments and
//!   pings `"open"`, ...)
//! - **Charset aware**: free text is detected, re-encoded to the blog's
//!   charset and HTML-escaped before it is sent
//! - **Pluggable transport**: the built-in reqwest transport, or any
//!   [`RpcTransport`] you provide
//! - **Typed errors**: caller mistakes, network failures and server faults are
//!   distinct [`MetaWeblogError`] variants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metaweblog_rs::{MetaWeblogClient, PostStruct, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = MetaWeblogClient::new(
//!         "https://blog.example/xmlrpc.php",
//!         Some("admin"),
//!         Some("secret"),
//!     )?;
//!
//!     let post = PostStruct::new("Hello", "First post from Rust")
//!         .categories(["News"])
//!         .keywords(["rust", "xmlrpc"]);
//!     let post_id = client.new_post(&post, true).await?;
//!     println!("Created post {post_id:?}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod http;
pub mod media;
pub mod post;
pub mod request;
pub mod traits;
pub mod utils;
pub mod value;
pub mod xmlrpc;

// Re-export main types for convenience
pub use client::MetaWeblogClient;
pub use config::{ClientConfig, HttpConfig};
pub use encoding::RawText;
pub use error::{MetaWeblogError, Result};
pub use http::HttpTransport;
pub use media::MediaObject;
pub use post::{CanonicalPost, PostStruct};
pub use request::RpcCall;
pub use traits::RpcTransport;
pub use value::Value;
