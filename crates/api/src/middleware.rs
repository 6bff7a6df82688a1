use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{ApiError, AppState};
use auth::Role;

/// Caller identity established by [`require_auth`]
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: String,
    pub username: String,
    /// Absent when the token carried no role the server recognises
    pub role: Option<Role>,
}

impl Identity {
    pub fn is_operator(&self) -> bool {
        self.role == Some(Role::Operator)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// The header must split into exactly two space-separated parts.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("Authorization header required"))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid authorization header format"))?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized("Invalid authorization header format")),
    }
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.tokens.validate(token)?;

    // Handlers read the caller from request extensions
    request.extensions_mut().insert(Identity {
        account_id: claims.user_id,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Middleware to require a specific role. Must run after [`require_auth`].
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(ApiError::Unauthorized("User not authenticated"))?;

    match identity.role {
        None => Err(ApiError::Forbidden("User role not found")),
        Some(role) if role != required => {
            debug!(account_id = %identity.account_id, %role, %required, "Role gate rejected caller");
            Err(ApiError::Forbidden("Insufficient permissions"))
        }
        Some(_) => Ok(next.run(request).await),
    }
}

/// Cancel the downstream handler, and any query it is awaiting, once `limit` elapses
pub async fn request_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    tokio::time::timeout(limit, next.run(request))
        .await
        .map_err(|_| ApiError::Timeout)
}

/// Extractor for the authenticated caller.
/// Use this in handlers that are protected by auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized("User not authenticated"))
    }
}
