//! Tag extraction through the Imagga tagging API

use crate::config::ImaggaConfig;
use crate::source::ImageSource;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tagmatch_core::{round2, Tag, QUERY_TAG_LIMIT};
use thiserror::Error;
use tracing::{debug, warn};

/// Response header carrying the remaining monthly request quota
pub const RATE_LIMIT_HEADER: &str = "Monthly-Limit-Remaining";

/// Longest upstream error body echoed back in a [`TaggerError::Status`]
const MAX_ERROR_BODY: usize = 256;

/// Tags extracted from one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    /// At most [`QUERY_TAG_LIMIT`] tags, highest confidence first
    pub tags: Vec<Tag>,
    /// Remaining tagging quota, when the service reported it
    pub rate_limit_remaining: Option<u64>,
}

#[derive(Error, Debug)]
pub enum TaggerError {
    #[error("tagging service credentials are not configured")]
    MissingCredentials,

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("tagging service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid tagging response: {0}")]
    Decode(String),
}

/// Derives descriptive tags from image bytes
#[async_trait]
pub trait Tagger: Send + Sync {
    async fn tag(&self, image: &ImageSource) -> Result<Extraction, TaggerError>;
}

#[derive(Debug, Default, Deserialize)]
struct ImaggaResponse {
    #[serde(default)]
    result: Option<ImaggaResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ImaggaResult {
    #[serde(default)]
    tags: Vec<ImaggaTag>,
}

#[derive(Debug, Deserialize)]
struct ImaggaTag {
    confidence: f64,
    tag: ImaggaLabel,
}

#[derive(Debug, Deserialize)]
struct ImaggaLabel {
    en: String,
}

impl ImaggaResponse {
    /// First `limit` tags in service order, confidences rounded to 2 decimals
    fn into_tags(self, limit: usize) -> Vec<Tag> {
        self.result
            .map(|result| result.tags)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|t| Tag::new(t.tag.en, round2(t.confidence)))
            .collect()
    }
}

/// Parse the remaining-quota header. Anything but a plain non-negative
/// integer is treated as unknown.
pub fn parse_rate_limit(value: Option<&HeaderValue>) -> Option<u64> {
    value
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
}

/// [`Tagger`] calling the Imagga `/v2/tags` endpoint
#[derive(Debug, Clone)]
pub struct ImaggaTagger {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl ImaggaTagger {
    pub fn new(config: &ImaggaConfig) -> Result<Self, TaggerError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let credentials = match (&config.api_key, &config.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key.clone(), secret.clone()))
            }
            _ => {
                warn!("Imagga credentials missing; tagging requests will fail");
                None
            }
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl Tagger for ImaggaTagger {
    async fn tag(&self, image: &ImageSource) -> Result<Extraction, TaggerError> {
        let (api_key, api_secret) = self
            .credentials
            .as_ref()
            .ok_or(TaggerError::MissingCredentials)?;

        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.filename().to_string())
            .mime_str(image.content_type())?;
        let form = Form::new().part("image", part);

        debug!(
            "Submitting {} ({}, {} bytes) for tagging",
            image.filename(),
            image.content_type(),
            image.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(api_key, Some(api_secret))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(TaggerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rate_limit_remaining = parse_rate_limit(response.headers().get(RATE_LIMIT_HEADER));
        let parsed: ImaggaResponse = response
            .json()
            .await
            .map_err(|e| TaggerError::Decode(e.to_string()))?;

        Ok(Extraction {
            tags: parsed.into_tags(QUERY_TAG_LIMIT),
            rate_limit_remaining,
        })
    }
}
