use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tagmatch_api::{
    AppState, HttpFetcher, ImaggaConfig, ImaggaTagger, Matcher, RestApi, ServerConfig,
    DEFAULT_IMAGGA_ENDPOINT,
};
use tagmatch_api::config::{DEFAULT_FRONTEND_ORIGIN, LOCAL_FRONTEND_ORIGIN};
use tagmatch_storage::{load_catalog_with_timeout, CatalogSource};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Match images against a pre-tagged product catalog
#[derive(Parser, Debug)]
#[command(name = "tagmatch")]
#[command(about = "Match images against a pre-tagged product catalog", long_about = None)]
struct Args {
    /// Catalog JSON file (optionally .gz) or http(s) URL
    #[arg(long, env = "JSON_DB_PATH", default_value = "products_with_cloudinary.json")]
    catalog: String,

    /// Timeout for downloading a catalog URL at startup, in seconds
    #[arg(long, env = "CATALOG_TIMEOUT_SECS", default_value_t = 60)]
    catalog_timeout_secs: u64,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Imagga API key
    #[arg(long, env = "IMAGGA_API_KEY", hide_env_values = true)]
    imagga_api_key: Option<String>,

    /// Imagga API secret
    #[arg(long, env = "IMAGGA_API_SECRET", hide_env_values = true)]
    imagga_api_secret: Option<String>,

    /// Imagga tagging endpoint
    #[arg(long, env = "IMAGGA_ENDPOINT", default_value = DEFAULT_IMAGGA_ENDPOINT)]
    imagga_endpoint: String,

    /// Timeout for a tagging request, in seconds
    #[arg(long, env = "TAGGER_TIMEOUT_SECS", default_value_t = 30)]
    tagger_timeout_secs: u64,

    /// Timeout for fetching an image URL, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 6)]
    fetch_timeout_secs: u64,

    /// Largest accepted image, in MiB
    #[arg(long, env = "MAX_IMAGE_MB", default_value_t = 5)]
    max_image_mb: usize,

    /// Deployed frontend origin allowed by CORS (may contain one `*`)
    #[arg(long, env = "FRONTEND_URL", default_value = DEFAULT_FRONTEND_ORIGIN)]
    frontend_url: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            allowed_origins: vec![LOCAL_FRONTEND_ORIGIN.to_string(), self.frontend_url.clone()],
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_image_bytes: self.max_image_mb.saturating_mul(1024 * 1024),
        }
    }

    fn imagga_config(&self) -> ImaggaConfig {
        ImaggaConfig {
            endpoint: self.imagga_endpoint.clone(),
            api_key: self.imagga_api_key.clone(),
            api_secret: self.imagga_api_secret.clone(),
            timeout: Duration::from_secs(self.tagger_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenv::dotenv().ok();
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tagmatch v{}", env!("CARGO_PKG_VERSION"));

    let source = CatalogSource::parse(&args.catalog);
    info!("Catalog source: {}", source);
    let catalog = Arc::new(
        load_catalog_with_timeout(&source, Duration::from_secs(args.catalog_timeout_secs)).await?,
    );

    let server_config = args.server_config();
    let tagger = Arc::new(ImaggaTagger::new(&args.imagga_config())?);
    let fetcher = Arc::new(HttpFetcher::new(
        server_config.fetch_timeout,
        server_config.max_image_bytes,
    )?);

    let state = Arc::new(AppState {
        matcher: Matcher::new(catalog, tagger, fetcher),
        max_image_bytes: server_config.max_image_bytes,
    });
    info!("Allowed origins: {:?}", server_config.allowed_origins);

    let bind = format!("{}:{}", server_config.host, server_config.port);
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}", bind);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, server_config).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("tagmatch started successfully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
