//! Error types for the MetaWeblog client.
//!
//! Every failure a caller can observe falls into one of three groups:
//!
//! - **Caller errors**: bad configuration, missing identifiers, incomplete post
//!   structs, text that cannot be re-encoded. Raised before any network activity.
//! - **Transport errors**: the HTTP round trip failed (retryable by the caller).
//! - **Server errors**: the response envelope was malformed, or the remote blog
//!   returned an XML-RPC fault with its own code and message.
//!
//! ## Usage
//!
//! ```rust
//! use metaweblog_rs::MetaWeblogError;
//!
//! fn describe(error: &MetaWeblogError) -> &'static str {
//!     if error.is_caller_error() {
//!         "fix the request"
//!     } else if error.is_retryable() {
//!         "try again later"
//!     } else {
//!         "the server refused"
//!     }
//! }
//!
//! let err = MetaWeblogError::from_fault(404, "Invalid post ID.");
//! assert_eq!(describe(&err), "the server refused");
//! assert_eq!(err.fault_code(), Some(404));
//! ```

/// Result type alias for MetaWeblog client operations.
pub type Result<T> = std::result::Result<T, MetaWeblogError>;

/// Error type for MetaWeblog client operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetaWeblogError {
    /// Invalid client configuration (fatal at construction)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required scalar argument was empty or missing
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The post struct lacks a required field or holds an unusable one
    #[error("Invalid post struct: `{field}` {reason}")]
    InvalidStruct { field: String, reason: String },

    /// Text could not be detected or converted to the target encoding
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Network or HTTP failure (retryable)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Malformed XML-RPC envelope
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The remote server answered with an XML-RPC fault
    #[error("Remote fault [{code}]: {message}")]
    RemoteFault { code: i32, message: String },
}

impl MetaWeblogError {
    /// Determines if an error is retryable.
    ///
    /// Only transport failures are worth repeating unchanged. Caller errors
    /// will fail the same way again, and a fault is the server's answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MetaWeblogError::Transport { .. })
    }

    /// Whether the failure was caused by the caller's input and happened
    /// before anything was sent.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MetaWeblogError::Config { .. }
                | MetaWeblogError::InvalidArgument { .. }
                | MetaWeblogError::InvalidStruct { .. }
                | MetaWeblogError::Encoding { .. }
        )
    }

    /// The server-provided fault code, if this is a remote fault.
    pub fn fault_code(&self) -> Option<i32> {
        match self {
            MetaWeblogError::RemoteFault { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Creates a remote fault error from a decoded `<fault>` payload.
    pub fn from_fault(code: i32, message: impl Into<String>) -> Self {
        MetaWeblogError::RemoteFault {
            code,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        MetaWeblogError::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MetaWeblogError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid struct error for the missing field.
    pub fn invalid_struct(field: impl Into<String>) -> Self {
        MetaWeblogError::InvalidStruct {
            field: field.into(),
            reason: "is missing".to_string(),
        }
    }

    /// Creates an invalid struct error for a member that cannot be read as text.
    pub fn invalid_struct_type(field: impl Into<String>, found: &str) -> Self {
        MetaWeblogError::InvalidStruct {
            field: field.into(),
            reason: format!("must be a string, got {found}"),
        }
    }

    /// Creates an encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        MetaWeblogError::Encoding {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport_error(message: impl Into<String>) -> Self {
        MetaWeblogError::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol_error(message: impl Into<String>) -> Self {
        MetaWeblogError::Protocol {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for MetaWeblogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MetaWeblogError::transport_error(format!("request timed out: {err}"))
        } else if err.is_builder() {
            MetaWeblogError::config_error(err.to_string())
        } else {
            MetaWeblogError::transport_error(err.to_string())
        }
    }
}

impl From<quick_xml::Error> for MetaWeblogError {
    fn from(err: quick_xml::Error) -> Self {
        MetaWeblogError::protocol_error(err.to_string())
    }
}
