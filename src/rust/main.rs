use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use lungscan::{
    serve, AppState, ErrorStatusMode, FetchLimits, OptimizationLevel, RuntimeConfig, ServerConfig,
};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Path to the ONNX model file
    #[arg(long, env = "LUNGSCAN_MODEL_PATH", default_value = "model4.onnx")]
    model_path: PathBuf,

    /// Expected SHA-256 of the model file; loading fails on mismatch
    #[arg(long, env = "LUNGSCAN_MODEL_SHA256")]
    model_sha256: Option<String>,

    /// Timeout for fetching an image, in seconds (0 disables)
    #[arg(long, env = "LUNGSCAN_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Largest image accepted, in bytes (0 disables)
    #[arg(long, env = "LUNGSCAN_MAX_IMAGE_BYTES", default_value_t = 20 * 1024 * 1024)]
    max_image_bytes: u64,

    /// HTTP status used for error responses
    #[arg(long, env = "LUNGSCAN_ERROR_STATUS", value_enum, default_value_t = ErrorStatusMode::Compat)]
    error_status: ErrorStatusMode,

    /// Defer loading the model until the first request or /load-model
    #[arg(long, env = "LUNGSCAN_LAZY_LOAD")]
    lazy_load: bool,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, env = "LUNGSCAN_INTRA_THREADS", default_value_t = 0)]
    intra_threads: usize,

    /// ONNX Runtime graph optimization level
    #[arg(long, env = "LUNGSCAN_OPTIMIZATION", value_enum, default_value_t = OptimizationLevel::All)]
    optimization: OptimizationLevel,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            model_path: self.model_path,
            model_sha256: self.model_sha256,
            fetch_limits: FetchLimits::from_raw(self.fetch_timeout_secs, self.max_image_bytes),
            error_status: self.error_status,
            lazy_load: self.lazy_load,
            runtime: RuntimeConfig {
                intra_threads: self.intra_threads,
                optimization_level: self.optimization,
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lungscan::init_logger();
    let config = Args::parse().into_config();

    info!("=== Starting lungscan ===");
    info!("Model path: {:?}", config.model_path);
    info!("Fetch limits: {:?}", config.fetch_limits);
    info!("Error status mode: {:?}", config.error_status);

    let state = Arc::new(AppState::from_config(&config).context("Failed to build HTTP client")?);

    if config.lazy_load {
        info!("Lazy loading enabled, model will load on first use");
    } else {
        let start_time = Instant::now();
        match state.models().reload().await {
            Ok(_) => info!("Model loaded (took {:.2?})", start_time.elapsed()),
            Err(e) => warn!(
                "Model not loaded at startup: {}. It will be loaded on first use or via /load-model",
                e
            ),
        }
    }

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!("Listening on http://{}", listener.local_addr()?);
    info!("Endpoints:");
    info!("   GET  /            - liveness");
    info!("   GET  /load-model  - (re)load the model");
    info!("   POST /diagnose    - classify an image URL");

    serve(listener, state).await?;

    Ok(())
}
