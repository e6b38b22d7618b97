use super::identity::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link between a user and a tenant they have interacted with.
/// Unique per (user_id, tenant_id), independent of the user's fixed tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn customer(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }
}
