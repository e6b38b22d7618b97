use crate::{Cache, CoreError, TenantStore, domain::tenant::Tenant};
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A reference to a tenant as supplied by a caller: its opaque id or its slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TenantRef {
    Id(String),
    Slug(String),
}

impl TenantRef {
    fn cache_key(&self) -> String {
        match self {
            TenantRef::Id(id) => format!("tenant:id:{}", id),
            TenantRef::Slug(slug) => format!("tenant:slug:{}", slug),
        }
    }
}

impl fmt::Display for TenantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantRef::Id(id) => write!(f, "id '{}'", id),
            TenantRef::Slug(slug) => write!(f, "slug '{}'", slug),
        }
    }
}

/// Read-through tenant lookup.
///
/// Entries live for `ttl` in whatever [`Cache`] adapter is plugged in. Within that window a
/// renamed or deactivated tenant is served stale unless an administrative write calls one
/// of the `invalidate*` hooks. Absence is never cached and neither are store failures.
#[derive(Clone)]
pub struct TenantDirectory {
    store: Arc<dyn TenantStore>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    store_timeout: Option<Duration>,
}

impl TenantDirectory {
    pub fn new(store: Arc<dyn TenantStore>, cache: Arc<dyn Cache>) -> Self {
        Self {
            store,
            cache,
            ttl: DEFAULT_TTL,
            store_timeout: None,
        }
    }

    /// A zero TTL disables caching.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bounds every store and cache call. A store call that runs longer fails with
    /// `CoreError::Unavailable`; a cache call that runs longer counts as a cache failure.
    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.store_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub async fn lookup_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError> {
        self.lookup(&TenantRef::Slug(slug.to_string())).await
    }

    pub async fn lookup_by_id(&self, id: &str) -> Result<Option<Tenant>, CoreError> {
        self.lookup(&TenantRef::Id(id.to_string())).await
    }

    pub async fn lookup(&self, reference: &TenantRef) -> Result<Option<Tenant>, CoreError> {
        let key = reference.cache_key();
        if let Some(tenant) = self.cached(&key).await {
            debug!("Tenant cache hit for {}", reference);
            return Ok(Some(tenant));
        }

        let found = self
            .bounded(reference, async {
                match reference {
                    TenantRef::Id(id) => self.store.find_by_id(id).await,
                    TenantRef::Slug(slug) => self.store.find_by_slug(slug).await,
                }
            })
            .await?;

        if let Some(tenant) = &found {
            self.populate(&key, tenant).await;
        }
        Ok(found)
    }

    /// Earliest-created tenant. Not cached: it only backs the super-role fallback.
    pub async fn first_created(&self) -> Result<Option<Tenant>, CoreError> {
        self.bounded("first tenant", self.store.first_created())
            .await
    }

    /// Drops every cache entry that can point at `tenant`.
    pub async fn invalidate(&self, tenant: &Tenant) {
        self.invalidate_id(&tenant.id).await;
        if let Some(slug) = &tenant.slug {
            self.invalidate_slug(slug).await;
        }
    }

    pub async fn invalidate_slug(&self, slug: &str) {
        self.evict(&TenantRef::Slug(slug.to_string()).cache_key())
            .await;
    }

    pub async fn invalidate_id(&self, id: &str) {
        self.evict(&TenantRef::Id(id.to_string()).cache_key()).await;
    }

    async fn cached(&self, key: &str) -> Option<Tenant> {
        match self.bounded(key, self.cache.get(key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Tenant>(&bytes) {
                Ok(tenant) => Some(tenant),
                Err(e) => {
                    warn!("Discarding undecodable tenant cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                // The cache is an optimization; fall through to the store.
                warn!("Tenant cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn populate(&self, key: &str, tenant: &Tenant) {
        if self.ttl.is_zero() {
            return;
        }
        let payload = match serde_json::to_vec(tenant) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize tenant {} for cache: {}", tenant.id, e);
                return;
            }
        };
        let ttl_seconds = self.ttl.as_secs().max(1);
        if let Err(e) = self
            .bounded(key, self.cache.set(key, &payload, Some(ttl_seconds)))
            .await
        {
            warn!("Tenant cache write failed for {}: {}", key, e);
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.bounded(key, self.cache.delete(key)).await {
            warn!("Tenant cache invalidation failed for {}: {}", key, e);
        }
    }

    async fn bounded<T>(
        &self,
        what: impl fmt::Display,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match self.store_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                CoreError::Unavailable(format!("call for {} exceeded {:?}", what, limit))
            })?,
            None => call.await,
        }
    }
}
