use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{validation, ApiError, AppState, ValidJson};
use auth::{Account, NewAccount};

/// Body shared by self-registration and administrative account creation
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub role: String,
}

impl AccountRequest {
    /// Check the request shape before it reaches the account service
    pub fn validate(self) -> Result<NewAccount, ApiError> {
        validation::require("username", &self.username)?;
        validation::require("password", &self.password)?;
        validation::password(&self.password)?;
        validation::require("name", &self.name)?;
        validation::require("email", &self.email)?;
        validation::email(&self.email)?;
        validation::require("unit", &self.unit)?;
        validation::require("role", &self.role)?;
        let role = validation::role(&self.role)?;

        Ok(NewAccount {
            username: self.username,
            password: self.password,
            name: self.name,
            email: self.email,
            unit: self.unit,
            role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: Account,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = payload.validate()?;
    let account = state.accounts.register(&new).await?;

    info!(account_id = %account.id, username = %account.username, "Account registered");
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validation::require("username", &payload.username)?;
    validation::require("password", &payload.password)?;

    let (token, user) = state.accounts.login(&payload.username, &payload.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}
