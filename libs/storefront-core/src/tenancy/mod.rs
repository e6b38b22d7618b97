//! Tenant scoping: turning an identity plus a tenant hint into one authoritative tenant id,
//! and deciding whether the identity may act on it.

pub mod access;
pub mod directory;
pub mod membership;
pub mod resolver;

pub use access::{can_access_tenant, ensure_storefront_access, ensure_tenant_access, require_role};
pub use directory::{TenantDirectory, TenantRef};
pub use membership::MembershipEnsurer;
pub use resolver::TenantResolver;
