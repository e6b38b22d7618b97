use crate::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path segments the storefront routes claim for themselves; a tenant slug may not shadow them.
const RESERVED_SLUGS: &[&str] = &["admin", "api", "auth", "superadmin"];
const MAX_SLUG_LEN: usize = 63;

// --- Tenant Record ---

/// One storefront instance. Never deleted; deactivated through `is_active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub slug: Option<String>,
    pub domain: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Storefront reads go through this gate.
    pub fn ensure_active(&self) -> Result<(), CoreError> {
        if self.is_active {
            Ok(())
        } else {
            Err(CoreError::Inactive(self.label().to_string()))
        }
    }

    /// Human-facing handle used in logs and error messages.
    pub fn label(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum TenantError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),
}

// --- Commands ---

/// Payload for creating a tenant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTenant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

impl NewTenant {
    /// Validates the payload and builds an active tenant record.
    pub fn into_tenant(self, id: String, now: DateTime<Utc>) -> Result<Tenant, TenantError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(TenantError::InvalidInput(
                "Tenant name cannot be empty".into(),
            ));
        }
        let slug = non_blank(self.slug);
        if let Some(slug) = &slug {
            validate_slug(slug)?;
        }
        Ok(Tenant {
            id,
            slug,
            domain: normalize_domain(self.domain),
            name,
            description: non_blank(self.description),
            logo: non_blank(self.logo),
            contact_email: non_blank(self.contact_email),
            contact_phone: non_blank(self.contact_phone),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update applied by the super-role. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TenantUpdate {
    pub fn apply(self, current: &Tenant, now: DateTime<Utc>) -> Result<Tenant, TenantError> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TenantError::InvalidInput(
                    "Tenant name cannot be empty".into(),
                ));
            }
            next.name = name;
        }
        if let Some(slug) = non_blank(self.slug) {
            validate_slug(&slug)?;
            next.slug = Some(slug);
        }
        if let Some(domain) = normalize_domain(self.domain) {
            next.domain = Some(domain);
        }
        if let Some(description) = self.description {
            next.description = non_blank(Some(description));
        }
        if let Some(logo) = self.logo {
            next.logo = non_blank(Some(logo));
        }
        if let Some(email) = self.contact_email {
            next.contact_email = non_blank(Some(email));
        }
        if let Some(phone) = self.contact_phone {
            next.contact_phone = non_blank(Some(phone));
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        next.updated_at = now;
        Ok(next)
    }
}

/// Slugs are lowercase ASCII letters, digits and single hyphens, not at either end.
pub fn validate_slug(slug: &str) -> Result<(), TenantError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(TenantError::InvalidSlug(format!(
            "Slug must be between 1 and {} characters, got {}",
            MAX_SLUG_LEN,
            slug.len()
        )));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(TenantError::InvalidSlug(
            "Slug cannot start or end with a hyphen".into(),
        ));
    }
    if slug.contains("--") {
        return Err(TenantError::InvalidSlug(
            "Slug cannot contain consecutive hyphens".into(),
        ));
    }
    if let Some(c) = slug
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(TenantError::InvalidSlug(format!(
            "Slug contains invalid character '{}'",
            c
        )));
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(TenantError::InvalidSlug(format!("Slug '{}' is reserved", slug)));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_domain(value: Option<String>) -> Option<String> {
    non_blank(value).map(|d| d.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> Tenant {
        NewTenant {
            name: "Fruitland".into(),
            slug: Some("fruitland".into()),
            ..Default::default()
        }
        .into_tenant("tenant-1".into(), now)
        .unwrap()
    }

    #[test]
    fn test_new_tenant_is_active_and_trimmed() {
        let now = Utc::now();
        let tenant = NewTenant {
            name: "  Fruitland  ".into(),
            slug: Some("fruitland".into()),
            domain: Some(" Shop.Fruitland.COM ".into()),
            description: Some("   ".into()),
            ..Default::default()
        }
        .into_tenant("tenant-1".into(), now)
        .unwrap();

        assert_eq!(tenant.name, "Fruitland");
        assert!(tenant.is_active);
        assert_eq!(tenant.domain.as_deref(), Some("shop.fruitland.com"));
        assert_eq!(tenant.description, None);
        assert_eq!(tenant.created_at, now);
    }

    #[test]
    fn test_blank_slug_becomes_none() {
        let tenant = NewTenant {
            name: "No Slug".into(),
            slug: Some("".into()),
            ..Default::default()
        }
        .into_tenant("tenant-2".into(), Utc::now())
        .unwrap();
        assert_eq!(tenant.slug, None);
        assert_eq!(tenant.label(), "tenant-2");
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = NewTenant {
            name: "  ".into(),
            ..Default::default()
        }
        .into_tenant("tenant-3".into(), Utc::now());
        match result {
            Err(TenantError::InvalidInput(msg)) => assert!(msg.contains("name cannot be empty")),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }
    }

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("fruit-land-2").is_ok());
        assert!(validate_slug("a").is_ok());
        assert!(validate_slug("Fruitland").is_err());
        assert!(validate_slug("-fruit").is_err());
        assert!(validate_slug("fruit-").is_err());
        assert!(validate_slug("fruit--land").is_err());
        assert!(validate_slug("fruit land").is_err());
        assert!(validate_slug("superadmin").is_err());
        assert!(validate_slug(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_inactive_tenant_rejects_storefront_reads() {
        let mut tenant = sample(Utc::now());
        assert!(tenant.ensure_active().is_ok());
        tenant.is_active = false;
        match tenant.ensure_active() {
            Err(CoreError::Inactive(label)) => assert_eq!(label, "fruitland"),
            other => panic!("Expected Inactive error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let created = Utc::now();
        let tenant = sample(created);
        let later = created + chrono::Duration::seconds(5);
        let updated = TenantUpdate {
            name: Some("Fruitland Plus".into()),
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&tenant, later)
        .unwrap();

        assert_eq!(updated.name, "Fruitland Plus");
        assert_eq!(updated.slug, tenant.slug);
        assert!(!updated.is_active);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);
    }

    #[test]
    fn test_update_rejects_bad_slug() {
        let tenant = sample(Utc::now());
        let result = TenantUpdate {
            slug: Some("Bad Slug".into()),
            ..Default::default()
        }
        .apply(&tenant, Utc::now());
        assert!(matches!(result, Err(TenantError::InvalidSlug(_))));
    }
}
