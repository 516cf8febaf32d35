use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use super::model::{ModelLoader, ProbabilityModel};
use crate::model_manager::ModelError;

/// Shared handle to the model currently serving requests.
///
/// Readers clone the inner `Arc` and drop the lock before running inference.
/// Loads are serialized and only replace the installed model once they succeed,
/// so a failed reload leaves the previous model serving.
pub struct ModelStore {
    loader: Arc<dyn ModelLoader>,
    current: RwLock<Option<Arc<dyn ProbabilityModel>>>,
    load_lock: Mutex<()>,
}

impl ModelStore {
    /// Creates an empty store; the first [`get_or_load`](Self::get_or_load) loads the model.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Creates a store with `model` already installed.
    pub fn with_model(loader: Arc<dyn ModelLoader>, model: Arc<dyn ProbabilityModel>) -> Self {
        let store = Self::new(loader);
        store.install(model);
        store
    }

    pub fn current(&self) -> Option<Arc<dyn ProbabilityModel>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Loads the model again and installs it, replacing any previous one.
    pub async fn reload(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError> {
        let _lock = self.load_lock.lock().await;
        let model = self.load_blocking().await?;
        self.install(Arc::clone(&model));
        log::info!("Model installed");
        Ok(model)
    }

    /// Returns the installed model, loading it first if nothing is installed yet.
    pub async fn get_or_load(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError> {
        if let Some(model) = self.current() {
            return Ok(model);
        }

        let _lock = self.load_lock.lock().await;
        // Another request may have finished loading while we waited
        if let Some(model) = self.current() {
            return Ok(model);
        }

        log::info!("No model installed, loading on first use");
        let model = self.load_blocking().await?;
        self.install(Arc::clone(&model));
        Ok(model)
    }

    async fn load_blocking(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError> {
        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| ModelError::TaskFailed(e.to_string()))?
    }

    fn install(&self, model: Arc<dyn ProbabilityModel>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }
}
