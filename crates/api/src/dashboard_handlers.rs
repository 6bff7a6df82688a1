use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::middleware::AuthUser;
use crate::{ApiError, AppState};
use auth::Role;
use requests::RequestStatus;

/// Headline counts for the dashboard. Pending and account totals are zero for non-operators.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub user_id: String,
    pub role: Role,
    pub total_pengajuan: i64,
    pub total_persetujuan: i64,
    pub total_riwayat: i64,
    pub total_pengguna: i64,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DashboardStats>, ApiError> {
    // Role comes from the stored account, not the token
    let account = state.accounts.get(&identity.account_id).await?;
    let total = state.requests.count().await?;

    let (pending, accounts) = if account.is_operator() {
        (
            state.requests.count_by_status(RequestStatus::Diajukan).await?,
            state.accounts.count().await?,
        )
    } else {
        (0, 0)
    };

    Ok(Json(DashboardStats {
        user_id: account.id,
        role: account.role,
        total_pengajuan: total,
        total_persetujuan: pending,
        total_riwayat: total,
        total_pengguna: accounts,
    }))
}
