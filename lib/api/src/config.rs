use std::time::Duration;

/// Default Imagga tagging endpoint
pub const DEFAULT_IMAGGA_ENDPOINT: &str = "https://api.imagga.com/v2/tags";

/// Origin always allowed by CORS, for local frontend development
pub const LOCAL_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Default deployed frontend origin pattern
pub const DEFAULT_FRONTEND_ORIGIN: &str = "https://*.onrender.com";

/// Settings for the Imagga tagging client
#[derive(Debug, Clone)]
pub struct ImaggaConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Bound on a single tagging request
    pub timeout: Duration,
}

impl Default for ImaggaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IMAGGA_ENDPOINT.to_string(),
            api_key: None,
            api_secret: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the HTTP server and request handling
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins; entries may contain a single `*` wildcard
    pub allowed_origins: Vec<String>,
    /// Bound on fetching an image from a remote URL
    pub fetch_timeout: Duration,
    /// Largest accepted image, uploaded or fetched
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec![
                LOCAL_FRONTEND_ORIGIN.to_string(),
                DEFAULT_FRONTEND_ORIGIN.to_string(),
            ],
            fetch_timeout: Duration::from_secs(6),
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}
