use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use storefront_core::{CoreError, domain::identity::Identity};
use tracing::{debug, warn};

use crate::{ApiError, AppState};

/// Caller context placed in request extensions by [`session_auth`].
#[derive(Clone, Debug)]
pub struct Authenticated {
    pub identity: Identity,
    pub token: String,
}

/// Middleware to authenticate requests using a session token in the Authorization header.
pub async fn session_auth(
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        warn!("Session authentication failed: missing, empty, or invalid Authorization header.");
        return Err(CoreError::Unauthenticated("Authentication required".into()).into());
    };

    let identity = app_state.sessions.resolve(&token).await?;
    debug!("Session authenticated for {} {}", identity.role(), identity.id());

    req.extensions_mut()
        .insert(Authenticated { identity, token });
    Ok(next.run(req).await)
}
