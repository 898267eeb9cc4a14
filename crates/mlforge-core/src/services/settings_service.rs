//! Settings service - load, validate and persist application settings.

use crate::ports::{CoreError, SettingsRepository};
use crate::settings::{Settings, SettingsUpdate, validate_settings};
use std::sync::Arc;

/// Service for settings operations.
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self) -> Result<Settings, CoreError> {
        self.repo.load().await.map_err(CoreError::metadata)
    }

    /// Apply a partial update. Nothing is saved if the result is invalid.
    pub async fn update(&self, update: SettingsUpdate) -> Result<Settings, CoreError> {
        let mut current = self.get().await?;
        current.merge(&update);
        validate_settings(&current)?;
        self.repo.save(&current).await.map_err(CoreError::metadata)?;
        Ok(current)
    }

    /// Set a single key from its string form; an empty value clears it.
    pub async fn set(&self, key: &str, value: &str) -> Result<Settings, CoreError> {
        let update = SettingsUpdate::from_key_value(key, value)?;
        self.update(update).await
    }

    /// Replace stored settings with the defaults.
    pub async fn reset(&self) -> Result<Settings, CoreError> {
        let defaults = Settings::with_defaults();
        self.save(&defaults).await?;
        Ok(defaults)
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), CoreError> {
        validate_settings(settings)?;
        self.repo.save(settings).await.map_err(CoreError::metadata)
    }
}
