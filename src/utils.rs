//! Utility functions and helpers.

use crate::error::{MetaWeblogError, Result};
use reqwest::Url;

/// Rejects empty or whitespace-only identifiers.
pub fn require_non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(MetaWeblogError::invalid_argument(format!(
            "{what} cannot be empty"
        )));
    }
    Ok(value)
}

/// Parses the XML-RPC endpoint, optionally overriding its port.
pub fn parse_endpoint(address: &str, port: Option<u16>) -> Result<Url> {
    let address = address.trim();
    if address.is_empty() {
        return Err(MetaWeblogError::config_error(
            "Invalid remote xmlrpc server: address cannot be empty",
        ));
    }

    let mut url = Url::parse(address).map_err(|e| {
        MetaWeblogError::config_error(format!("Invalid remote xmlrpc server `{address}`: {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MetaWeblogError::config_error(format!(
            "Unsupported scheme `{}` (expected http or https)",
            url.scheme()
        )));
    }

    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|_| MetaWeblogError::config_error(format!("Cannot set port {port}")))?;
    }

    Ok(url)
}
