use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::middleware::{AuthUser, Identity};
use crate::{ApiError, AppState, ValidJson, ValidQuery};
use requests::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};
use requests::{paginate, NewRequest, Page, RequestStatus, StatusUpdate, WorkRequest};
use workreq_core::RequestDeletePolicy;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub request: WorkRequest,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status_request: String,
    pub approved_by: Option<String>,
    pub accepted_by: Option<String>,
    #[serde(default)]
    pub keterangan: String,
}

impl StatusRequest {
    pub fn validate(self) -> Result<StatusUpdate, ApiError> {
        if self.status_request.is_empty() {
            return Err(ApiError::Validation("status_request is required".to_string()));
        }
        let status: RequestStatus = self.status_request.parse()?;

        Ok(StatusUpdate {
            status,
            approved_by: self.approved_by,
            accepted_by: self.accepted_by,
            remarks: self.keterangan,
        })
    }
}

/// Request ids are integers; anything else cannot name an existing request
fn parse_request_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("request not found".to_string()))
}

pub async fn create_request(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidJson(payload): ValidJson<NewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.requests.create(&payload, &identity.account_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            request,
        }),
    ))
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Page<WorkRequest>>, ApiError> {
    let requests = match params.status.as_deref() {
        Some(status) if !status.is_empty() => {
            let status: RequestStatus = status.parse()?;
            state.requests.list_by_status(status).await?
        }
        _ => state.requests.list_all().await?,
    };

    Ok(Json(paginate(
        requests,
        params.page.unwrap_or(DEFAULT_PAGE),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    )))
}

pub async fn my_requests(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<WorkRequest>>, ApiError> {
    Ok(Json(state.requests.list_by_requester(&identity.account_id).await?))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WorkRequest>, ApiError> {
    let id = parse_request_id(&id)?;
    Ok(Json(state.requests.get(id).await?))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<StatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_request_id(&id)?;
    let update = payload.validate()?;

    state.requests.update_status(id, &update).await?;

    debug!(request_id = id, updated_by = %identity.username, "Status change applied");
    Ok(Json(MessageResponse {
        message: "Request status updated successfully",
    }))
}

pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_request_id(&id)?;

    if state.policy.request_delete == RequestDeletePolicy::OwnerOrOperator {
        ensure_may_delete(&state, &identity, id).await?;
    }

    state.requests.delete(id).await?;

    info!(request_id = id, deleted_by = %identity.username, "Request deleted");
    Ok(Json(MessageResponse {
        message: "Request deleted successfully",
    }))
}

/// Operators may delete anything; everyone else only requests filed under their current name
async fn ensure_may_delete(state: &AppState, identity: &Identity, id: i64) -> Result<(), ApiError> {
    let request = state.requests.get(id).await?;
    if identity.is_operator() {
        return Ok(());
    }

    let account = state.accounts.get(&identity.account_id).await?;
    if account.name != request.requested_by {
        return Err(ApiError::Forbidden("Only the requester or an operator may delete this request"));
    }
    Ok(())
}
