//! Ownership of persisted entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tenant/user pair that owns an entity.
///
/// Every lookup that takes an `Owner` only resolves entities created
/// by that same pair; anything else is reported as not found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// Numeric tenant identifier.
    pub tenant_id: i64,
    /// User name within the tenant.
    pub username: String,
}

impl Owner {
    pub fn new(tenant_id: i64, username: impl Into<String>) -> Self {
        Self {
            tenant_id,
            username: username.into(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.tenant_id)
    }
}
