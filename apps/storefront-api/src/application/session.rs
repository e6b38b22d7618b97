use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc, time::Duration};
use storefront_core::{
    Cache, CoreError,
    domain::identity::{Identity, Role},
};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(86_400);

/// What is stored in the cache for one bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub role: Role,
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub active_tenant_id: Option<String>,
}

impl SessionRecord {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            user_id: identity.id().to_string(),
            role: identity.role(),
            tenant_id: identity.fixed_tenant_id().map(str::to_string),
            active_tenant_id: identity.active_tenant_id().map(str::to_string),
        }
    }

    pub fn into_identity(self) -> Result<Identity, CoreError> {
        Ok(Identity::new(
            self.user_id,
            self.role,
            self.tenant_id,
            self.active_tenant_id,
        )?)
    }
}

/// Bearer-token sessions kept in their own [`Cache`] under `session:<token>`.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
    timeout: Option<Duration>,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            ttl: DEFAULT_SESSION_TTL,
            timeout: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bounds every cache call; one that runs longer fails with `CoreError::Unavailable`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                CoreError::Unavailable(format!("session cache call exceeded {:?}", limit))
            })?,
            None => call.await,
        }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }

    /// Creates a session for `identity` and returns its token.
    pub async fn issue(&self, identity: &Identity) -> Result<String, CoreError> {
        let token = format!("sess-{}", Uuid::new_v4());
        self.insert(&token, identity).await?;
        info!("Issued session for {} {}", identity.role(), identity.id());
        Ok(token)
    }

    /// Stores `identity` under a caller-chosen token (bootstrap and tests).
    pub async fn insert(&self, token: &str, identity: &Identity) -> Result<(), CoreError> {
        let payload = serde_json::to_vec(&SessionRecord::from_identity(identity))?;
        self.bounded(
            self.cache
                .set(&Self::key(token), &payload, Some(self.ttl.as_secs().max(1))),
        )
        .await
    }

    /// Fails closed: a missing, undecodable or invariant-violating record is `Unauthenticated`.
    /// A cache that does not answer in time is `Unavailable`.
    pub async fn resolve(&self, token: &str) -> Result<Identity, CoreError> {
        let bytes = match self.bounded(self.cache.get(&Self::key(token))).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(CoreError::Unauthenticated(
                    "Session not found or expired".into(),
                ));
            }
            Err(e @ CoreError::Unavailable(_)) => {
                warn!("Session lookup timed out: {}", e);
                return Err(e);
            }
            Err(e) => {
                warn!("Cache error during session lookup: {}", e);
                return Err(CoreError::Unauthenticated(
                    "Session could not be verified".into(),
                ));
            }
        };
        let record: SessionRecord = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Failed to deserialize session record: {}", e);
            CoreError::Unauthenticated("Session could not be verified".into())
        })?;
        record.into_identity()
    }

    /// Persists the super-role's tenant selection; `None` clears it.
    pub async fn select_active_tenant(
        &self,
        token: &str,
        identity: &Identity,
        tenant_id: Option<String>,
    ) -> Result<Identity, CoreError> {
        let updated = identity.clone().with_active_tenant(tenant_id);
        self.insert(token, &updated).await?;
        Ok(updated)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), CoreError> {
        self.bounded(self.cache.delete(&Self::key(token))).await
    }
}
