//! Project domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Owner;

/// A persisted project. Analyses are always bound to exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

/// A project to be inserted (no ID yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub owner: Owner,
}
