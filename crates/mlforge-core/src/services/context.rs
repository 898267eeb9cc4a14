//! Explicitly constructed dependencies shared by the core services.

use std::sync::Arc;

use crate::algorithms::AlgorithmRegistry;
use crate::domain::StorageDescriptor;
use crate::features::{FeatureEncoder, NumericEncoder};
use crate::paths::default_model_store;
use crate::ports::{CoreError, MetadataStore, StorageError, StorageRegistry, TrainingBackend};
use crate::settings::Settings;

/// Everything a service needs, built once at the composition root.
///
/// # Example
///
/// ```ignore
/// let store = CoreFactory::build_store(pool);
/// let storage = mlforge_storage::default_registry(&settings);
/// let backend = Arc::new(RemoteTrainingBackend::new(config)?);
/// let ctx = Arc::new(ServiceContext::new(store, storage, backend, settings));
/// let orchestrator = ModelOrchestrator::new(ctx.clone());
/// ```
pub struct ServiceContext {
    pub store: MetadataStore,
    pub storage: StorageRegistry,
    pub backend: Arc<dyn TrainingBackend>,
    pub algorithms: AlgorithmRegistry,
    pub encoder: Arc<dyn FeatureEncoder>,
    pub settings: Settings,
}

impl ServiceContext {
    /// Context with the built-in algorithms and the numeric encoder.
    pub fn new(
        store: MetadataStore,
        storage: StorageRegistry,
        backend: Arc<dyn TrainingBackend>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            storage,
            backend,
            algorithms: AlgorithmRegistry::with_builtins(),
            encoder: Arc::new(NumericEncoder),
            settings,
        }
    }

    #[must_use]
    pub fn with_algorithms(mut self, algorithms: AlgorithmRegistry) -> Self {
        self.algorithms = algorithms;
        self
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn FeatureEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Where artifacts go for models without their own storage target.
    pub fn default_storage_target(&self) -> Result<StorageDescriptor, CoreError> {
        let location = match &self.settings.default_storage_location {
            Some(location) => location.clone(),
            None => default_model_store()
                .map_err(|e| CoreError::Storage(StorageError::Io(e.to_string())))?
                .to_string_lossy()
                .to_string(),
        };
        Ok(StorageDescriptor::new(
            self.settings.effective_storage_type(),
            location,
        ))
    }
}
