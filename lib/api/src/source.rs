//! Image input handling
//!
//! A match request carries either an uploaded file or an image URL. Both end
//! up as an [`ImageSource`]: bytes plus the filename and content type the
//! tagging service expects.

use crate::error::ApiError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Path suffixes accepted for image URLs (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

const FALLBACK_FILENAME: &str = "upload.jpg";
const OCTET_STREAM: &str = "application/octet-stream";

/// Image bytes with the metadata needed to submit them for tagging
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// File uploaded with the request
    Upload {
        filename: String,
        content_type: String,
        bytes: Bytes,
    },
    /// Buffer downloaded from an image URL
    Fetched {
        url: Url,
        filename: String,
        content_type: String,
        bytes: Bytes,
    },
}

impl ImageSource {
    /// Uploaded file. The declared content type is used when present,
    /// otherwise it is guessed from the filename.
    pub fn upload(filename: impl Into<String>, declared_type: Option<&str>, bytes: Bytes) -> Self {
        let filename = filename.into();
        let content_type = declared_type
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(&filename));
        ImageSource::Upload {
            filename,
            content_type,
            bytes,
        }
    }

    /// Image downloaded from `url`, named after the last path segment.
    pub fn fetched(url: Url, bytes: Bytes) -> Self {
        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content_type = guess_content_type(&filename);
        ImageSource::Fetched {
            url,
            filename,
            content_type,
            bytes,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            ImageSource::Upload { filename, .. } | ImageSource::Fetched { filename, .. } => filename,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            ImageSource::Upload { content_type, .. }
            | ImageSource::Fetched { content_type, .. } => content_type,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            ImageSource::Upload { bytes, .. } | ImageSource::Fetched { bytes, .. } => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

/// Content type implied by a filename's extension
pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Raw inputs of a match request, before validation
#[derive(Debug, Default)]
pub struct MatchInput {
    pub upload: Option<ImageSource>,
    pub image_url: Option<String>,
}

/// A validated match input: exactly one image
#[derive(Debug)]
pub enum ResolvedInput {
    Upload(ImageSource),
    Url(Url),
}

impl MatchInput {
    /// Require exactly one of upload and URL, and validate the URL.
    pub fn resolve(self) -> Result<ResolvedInput, ApiError> {
        let image_url = self.image_url.filter(|u| !u.is_empty());
        match (self.upload, image_url) {
            (Some(_), Some(_)) => Err(ApiError::BothInputs),
            (None, None) => Err(ApiError::NoInput),
            (Some(upload), None) => Ok(ResolvedInput::Upload(upload)),
            (None, Some(raw)) => validate_image_url(&raw).map(ResolvedInput::Url),
        }
    }
}

/// Parse an image URL and check that its path names a supported image type.
///
/// The query string and fragment are ignored for the extension check.
pub fn validate_image_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let path = url.path().to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return Err(ApiError::UnsupportedExtension);
    }

    Ok(url)
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("image is larger than {limit} bytes")]
    TooLarge { limit: usize },
}

/// Retrieves image bytes for a validated URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<ImageSource, FetchError>;
}

/// [`ImageFetcher`] backed by a `reqwest` client with a request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ImageSource, FetchError> {
        debug!("Fetching image from {}", url);
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(ImageSource::fetched(url.clone(), body.freeze()))
    }
}
