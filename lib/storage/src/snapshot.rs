// Catalog snapshot loading
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagmatch_core::{Catalog, Error, Result};
use tracing::{debug, info};

/// Where the catalog snapshot is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local JSON file; a `.gz` extension means gzip-compressed JSON
    File(PathBuf),
    /// `http://` or `https://` URL serving the JSON document
    Url(String),
}

impl CatalogSource {
    /// Interpret a configured location: URLs by scheme, anything else as a path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CatalogSource::Url(location.to_string())
        } else {
            CatalogSource::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => f.write_str(url),
        }
    }
}

/// Bound on downloading a catalog from a URL
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Load the catalog once from its source.
pub async fn load_catalog(source: &CatalogSource) -> Result<Catalog> {
    load_catalog_with_timeout(source, DEFAULT_DOWNLOAD_TIMEOUT).await
}

/// Load the catalog, giving up on a URL download after `timeout`.
pub async fn load_catalog_with_timeout(source: &CatalogSource, timeout: Duration) -> Result<Catalog> {
    let catalog = match source {
        CatalogSource::File(path) => load_catalog_from_path(path)?,
        CatalogSource::Url(url) => download_catalog(url, timeout).await?,
    };
    info!("Catalog loaded from {}: {} products", source, catalog.len());
    Ok(catalog)
}

/// Load a catalog snapshot from a file path
pub fn load_catalog_from_path(path: &Path) -> Result<Catalog> {
    let file = File::open(path).map_err(|e| {
        Error::CatalogLoad(format!("cannot open {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let mut json_data = Vec::new();
    if is_gzip(path) {
        debug!("Decompressing gzip catalog {}", path.display());
        GzDecoder::new(reader).read_to_end(&mut json_data)?;
    } else {
        reader.read_to_end(&mut json_data)?;
    }

    catalog_from_slice(&json_data)
}

/// Parse a catalog snapshot from raw JSON bytes
pub fn catalog_from_slice(json_data: &[u8]) -> Result<Catalog> {
    let document: Value = serde_json::from_slice(json_data)?;
    Catalog::from_document(document)
}

async fn download_catalog(url: &str, timeout: Duration) -> Result<Catalog> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::CatalogLoad(format!("failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::CatalogLoad(format!("failed to download catalog: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::CatalogLoad(format!(
            "failed to download catalog: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::CatalogLoad(format!("failed to read catalog data: {}", e)))?;

    catalog_from_slice(&bytes)
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
