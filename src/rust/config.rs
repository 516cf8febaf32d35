use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::imaging::FetchLimits;
use crate::model_manager::ModelManager;
use crate::runtime::RuntimeConfig;

/// How error bodies are paired with HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorStatusMode {
    /// Every response is `200 OK`; clients tell errors apart by the `error` key.
    #[default]
    Compat,
    /// Each error kind gets its own 4xx/5xx status.
    Typed,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model_path: PathBuf,
    /// Expected SHA-256 of the model file, hex encoded
    pub model_sha256: Option<String>,
    pub fetch_limits: FetchLimits,
    pub error_status: ErrorStatusMode,
    /// Skip loading the model at startup
    pub lazy_load: bool,
    pub runtime: RuntimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            model_path: PathBuf::from(ModelManager::DEFAULT_MODEL_PATH),
            model_sha256: None,
            fetch_limits: FetchLimits::default(),
            error_status: ErrorStatusMode::default(),
            lazy_load: false,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn model_manager(&self) -> ModelManager {
        let manager =
            ModelManager::new(&self.model_path).with_runtime_config(self.runtime.clone());
        match &self.model_sha256 {
            Some(hash) => manager.with_expected_hash(hash.as_str()),
            None => manager,
        }
    }
}
