//! # tagmatch API
//!
//! HTTP surface of tagmatch: accepts an image (upload or URL), has it
//! tagged by Imagga and returns the catalog products ranked by tag
//! similarity.
//!
//! - [`RestApi`] / [`routes`] - actix-web server and route table
//! - [`Matcher`] - validate → fetch → tag → rank for one request
//! - [`Tagger`] / [`ImaggaTagger`] - tag extraction
//! - [`ImageFetcher`] / [`HttpFetcher`] - remote image download

pub mod config;
pub mod cors;
pub mod error;
pub mod matcher;
pub mod rest;
pub mod source;
pub mod tagger;

#[cfg(test)]
mod testing;

pub use config::{ImaggaConfig, ServerConfig, DEFAULT_IMAGGA_ENDPOINT};
pub use cors::OriginPolicy;
pub use error::ApiError;
pub use matcher::{MatchResponse, Matcher};
pub use rest::{routes, AppState, RestApi};
pub use source::{
    validate_image_url, FetchError, HttpFetcher, ImageFetcher, ImageSource, MatchInput,
    ResolvedInput,
};
pub use tagger::{Extraction, ImaggaTagger, Tagger, TaggerError, RATE_LIMIT_HEADER};
