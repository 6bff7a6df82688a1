use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth_handlers::AccountRequest;
use crate::middleware::AuthUser;
use crate::{validation, ApiError, AppState, ValidJson};
use auth::{Account, AccountUpdate};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Partial profile update; omitted or empty fields are left as they are
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub unit: Option<String>,
    pub role: Option<String>,
}

impl UpdateAccountRequest {
    pub fn validate(self) -> Result<AccountUpdate, ApiError> {
        let email = non_empty(self.email);
        if let Some(email) = &email {
            validation::email(email)?;
        }
        let role = non_empty(self.role).map(|role| validation::role(&role)).transpose()?;

        Ok(AccountUpdate {
            name: non_empty(self.name),
            email,
            unit: non_empty(self.unit),
            role,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.accounts.get(&identity.account_id).await?))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.accounts.list().await?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.accounts.get(&id).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidJson(payload): ValidJson<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = payload.validate()?;
    let user = state.accounts.create_by_admin(&new).await?;

    info!(account_id = %user.id, created_by = %identity.username, "Account created by operator");
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            success: true,
            message: "User created successfully",
            user,
        }),
    ))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let changes = payload.validate()?;

    // Role changes need an operator, judged by the stored account rather than the token
    if changes.role.is_some() && !state.accounts.get(&identity.account_id).await?.is_operator() {
        warn!(account_id = %identity.account_id, username = %identity.username, target_account = %id, "Role change refused");
        return Err(ApiError::Forbidden("Only operators may change roles"));
    }

    let user = state.accounts.update(&id, &changes).await?;

    Ok(Json(AccountResponse {
        success: true,
        message: "User updated successfully",
        user,
    }))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.accounts.delete(&id).await?;

    info!(account_id = %id, deleted_by = %identity.username, "Account deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "User deleted successfully",
    }))
}
