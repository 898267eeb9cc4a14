//! Settings repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::settings::Settings;

/// Repository for application settings persistence.
///
/// # Design Rules
///
/// - Works with the domain `Settings` type directly
/// - Implementation handles JSON serialization internally
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load settings, falling back to defaults when none are stored.
    async fn load(&self) -> Result<Settings, RepositoryError>;

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError>;
}
