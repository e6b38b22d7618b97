use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Role ---

/// Closed set of platform roles. Adding a variant forces every `match` on it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "CUSTOMER")]
    Customer,
    #[serde(rename = "DELIVERY_PARTNER")]
    DeliveryPartner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPERADMIN",
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
            Role::DeliveryPartner => "DELIVERY_PARTNER",
        }
    }

    pub fn is_super(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPERADMIN" | "SuperAdmin" => Ok(Role::SuperAdmin),
            "ADMIN" | "Admin" => Ok(Role::Admin),
            "CUSTOMER" | "Customer" => Ok(Role::Customer),
            "DELIVERY_PARTNER" | "DeliveryPartner" => Ok(Role::DeliveryPartner),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

// --- Errors ---

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Identity id cannot be empty")]
    MissingId,
    #[error("Tenant ID is required for role {0}")]
    TenantIdRequired(Role),
    #[error("SUPERADMIN cannot belong to a tenant")]
    SuperAdminWithTenant,
}

// --- Identity ---

/// The authenticated caller. Only constructible through [`Identity::new`], which
/// enforces the provisioning invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: String,
    role: Role,
    fixed_tenant_id: Option<String>,
    active_tenant_id: Option<String>,
}

impl Identity {
    /// Non-super roles need a fixed tenant; the super-role must not have one.
    /// An active tenant is only kept for the super-role.
    pub fn new(
        id: impl Into<String>,
        role: Role,
        fixed_tenant_id: Option<String>,
        active_tenant_id: Option<String>,
    ) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityError::MissingId);
        }
        let fixed_tenant_id = fixed_tenant_id.filter(|t| !t.is_empty());
        let active_tenant_id = active_tenant_id.filter(|t| !t.is_empty());
        match role {
            Role::SuperAdmin => {
                if fixed_tenant_id.is_some() {
                    return Err(IdentityError::SuperAdminWithTenant);
                }
                Ok(Self {
                    id,
                    role,
                    fixed_tenant_id: None,
                    active_tenant_id,
                })
            }
            Role::Admin | Role::Customer | Role::DeliveryPartner => {
                if fixed_tenant_id.is_none() {
                    return Err(IdentityError::TenantIdRequired(role));
                }
                Ok(Self {
                    id,
                    role,
                    fixed_tenant_id,
                    active_tenant_id: None,
                })
            }
        }
    }

    pub fn super_admin(id: impl Into<String>) -> Result<Self, IdentityError> {
        Self::new(id, Role::SuperAdmin, None, None)
    }

    pub fn member(
        id: impl Into<String>,
        role: Role,
        tenant_id: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        Self::new(id, role, Some(tenant_id.into()), None)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn fixed_tenant_id(&self) -> Option<&str> {
        self.fixed_tenant_id.as_deref()
    }

    pub fn active_tenant_id(&self) -> Option<&str> {
        self.active_tenant_id.as_deref()
    }

    /// Same identity with a different super-role selection. A no-op for other roles.
    pub fn with_active_tenant(mut self, tenant_id: Option<String>) -> Self {
        if self.role.is_super() {
            self.active_tenant_id = tenant_id.filter(|t| !t.is_empty());
        }
        self
    }
}
