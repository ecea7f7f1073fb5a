//! Media objects for `metaWeblog.newMediaObject`.

use crate::error::{MetaWeblogError, Result};
use crate::utils;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// A file to upload to the blog's media library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaObject {
    /// File name as it should appear on the server
    pub name: String,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
    /// Raw file content
    pub bits: Vec<u8>,
    /// Replace an existing file with the same name
    pub overwrite: bool,
}

impl MediaObject {
    /// Creates a media object. `overwrite` defaults to `false`.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bits: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bits: bits.into(),
            overwrite: false,
        }
    }

    /// Sets whether an existing file with the same name is replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Reads a local file, guessing its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(upload_name)
            .ok_or_else(|| {
                MetaWeblogError::invalid_argument(format!(
                    "media path has no usable file name: {}",
                    path.display()
                ))
            })?;

        let bits = fs::read(path).await.map_err(|e| {
            MetaWeblogError::invalid_argument(format!(
                "failed to read media file {}: {e}",
                path.display()
            ))
        })?;

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        debug!(
            "Loaded media object {file_name} ({mime_type}, {} bytes)",
            bits.len()
        );

        Ok(Self::new(file_name, mime_type, bits))
    }

    /// Checks that name, MIME type and content are all present.
    pub fn validate(&self) -> Result<()> {
        utils::require_non_empty(&self.name, "media name")?;
        utils::require_non_empty(&self.mime_type, "media MIME type")?;
        if self.bits.is_empty() {
            return Err(MetaWeblogError::invalid_argument(
                "media content cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Turns a local file name into one the server will store under a clean URL.
///
/// Whitespace runs become `-` and characters with a meaning in URLs or paths
/// become `_`. Leading dots are dropped.
fn upload_name(file_name: &str) -> Option<String> {
    let mut name = String::with_capacity(file_name.len());
    for word in file_name.split_whitespace() {
        if !name.is_empty() {
            name.push('-');
        }
        name.extend(word.chars().map(|c| match c {
            '/' | '\\' | '?' | '#' | '%' | '&' | '"' | '\'' | '<' | '>' | ':' | '*' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        }));
    }

    let name = name.trim_start_matches('.');
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_media_defaults() {
        let media = MediaObject::new("a.png", "image/png", vec![1, 2, 3]);
        assert!(!media.overwrite);
        assert!(media.validate().is_ok());
        assert!(media.overwrite(true).overwrite);
    }

    #[test]
    fn test_validation_rejects_empty_parts() {
        let cases = [
            MediaObject::new("", "image/png", vec![1]),
            MediaObject::new("a.png", " ", vec![1]),
            MediaObject::new("a.png", "image/png", Vec::new()),
        ];

        for media in cases {
            let err = media.validate().unwrap_err();
            assert!(matches!(err, MetaWeblogError::InvalidArgument { .. }));
        }
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\n").unwrap();

        let media = MediaObject::from_path(&path).await.unwrap();
        assert_eq!(media.name, "cover.png");
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.bits, b"\x89PNG\r\n\x1a\n");
        assert!(!media.overwrite);
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name("cover.png").as_deref(), Some("cover.png"));
        assert_eq!(
            upload_name("  my holiday  photo.jpg ").as_deref(),
            Some("my-holiday-photo.jpg")
        );
        assert_eq!(upload_name("a?b#c%d&e.gif").as_deref(), Some("a_b_c_d_e.gif"));
        assert_eq!(upload_name(".htaccess").as_deref(), Some("htaccess"));
        assert_eq!(upload_name(" ... "), None);
    }

    #[tokio::test]
    async fn test_from_path_cleans_the_upload_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summer trip #2.jpg");
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();

        let media = MediaObject::from_path(&path).await.unwrap();
        assert_eq!(media.name, "summer-trip-_2.jpg");
        assert_eq!(media.mime_type, "image/jpeg");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = tokio_test::block_on(MediaObject::from_path("/definitely/not/here.jpg"));
        assert!(matches!(
            result,
            Err(MetaWeblogError::InvalidArgument { .. })
        ));
    }
}
