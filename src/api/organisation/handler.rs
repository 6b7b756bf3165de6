// Start of file: /src/api/organisation/handler.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::config::state::AppState;
use crate::services::conducts::{
    self, BattalionOverview, CompanyConducts, CreatedConduct, PasswordTarget,
};
use crate::utils::{ApiError, HandlerResponse};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateConductRequest {
    pub battalion_name: Option<String>,
    pub company_name: Option<String>,
    pub conduct_name: Option<String>,
    pub company_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewConductsRequest {
    pub access_type: Option<String>,
    pub battalion_name: Option<String>,
    pub company_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteConductsRequest {
    #[serde(default)]
    pub conduct_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password_type: Option<String>,
    pub battalion_name: Option<String>,
    pub company_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Creates a conduct, creating its battalion and company on first use
#[instrument(skip(state, payload), fields(conduct = ?payload.conduct_name))]
pub async fn create_conduct(
    State(state): State<AppState>,
    Json(payload): Json<CreateConductRequest>,
) -> Result<HandlerResponse, ApiError> {
    let created: CreatedConduct = conducts::create_conduct(
        &state,
        payload.battalion_name.as_deref(),
        payload.company_name.as_deref(),
        payload.conduct_name.as_deref(),
        payload.company_password.as_deref(),
    )
    .await?;

    let message: String = format!(
        "Conduct \"{}\" created successfully! PIN: {}",
        created.conduct_name, created.pin
    );

    Ok(HandlerResponse::new(StatusCode::CREATED)
        .data(json!(created))
        .message(message))
}

/// Battalion or company login; answers with the overview to open
#[instrument(skip(state, payload), fields(access_type = ?payload.access_type))]
pub async fn view_conducts(
    State(state): State<AppState>,
    Json(payload): Json<ViewConductsRequest>,
) -> Result<HandlerResponse, ApiError> {
    match payload.access_type.as_deref().map(str::trim) {
        Some("battalion") => {
            let battalion_id: i64 = conducts::access_battalion(
                &state,
                payload.battalion_name.as_deref(),
                payload.password.as_deref(),
            )
            .await?;

            Ok(HandlerResponse::ok()
                .data(json!({
                    "access_type": "battalion",
                    "battalion_id": battalion_id,
                    "redirect": format!("/battalion_overview/{battalion_id}"),
                }))
                .message("Battalion access granted"))
        }
        Some("company") => {
            let company_id: i64 = conducts::access_company(
                &state,
                payload.battalion_name.as_deref(),
                payload.company_name.as_deref(),
                payload.password.as_deref(),
            )
            .await?;

            Ok(HandlerResponse::ok()
                .data(json!({
                    "access_type": "company",
                    "company_id": company_id,
                    "redirect": format!("/company_conducts/{company_id}"),
                }))
                .message("Company access granted"))
        }
        _ => Err(ApiError::bad_request("Invalid access type selected.")),
    }
}

#[instrument(skip(state))]
pub async fn battalion_overview(
    State(state): State<AppState>,
    Path(battalion_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let overview: BattalionOverview = conducts::battalion_overview(&state, battalion_id).await?;
    Ok(HandlerResponse::ok().data(json!(overview)))
}

#[instrument(skip(state))]
pub async fn company_conducts(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let listing: CompanyConducts = conducts::company_conducts(&state, company_id).await?;
    Ok(HandlerResponse::ok().data(json!(listing)))
}

#[instrument(skip(state, payload), fields(count = payload.conduct_ids.len()))]
pub async fn delete_conducts(
    State(state): State<AppState>,
    Path(battalion_id): Path<i64>,
    Json(payload): Json<DeleteConductsRequest>,
) -> Result<HandlerResponse, ApiError> {
    let deleted: u64 = conducts::delete_conducts(&state, battalion_id, &payload.conduct_ids).await?;

    Ok(HandlerResponse::ok()
        .data(json!({ "battalion_id": battalion_id, "deleted": deleted }))
        .message(format!("Successfully deleted {deleted} conduct(s).")))
}

#[instrument(skip(state, payload), fields(password_type = ?payload.password_type))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<HandlerResponse, ApiError> {
    let battalion: &str = payload.battalion_name.as_deref().unwrap_or_default();
    let company: &str = payload.company_name.as_deref().unwrap_or_default();

    let target: PasswordTarget<'_> = match payload.password_type.as_deref() {
        Some("battalion") => PasswordTarget::Battalion { battalion },
        Some("company") => PasswordTarget::Company { battalion, company },
        _ => return Err(ApiError::bad_request("Invalid password type.")),
    };

    let message: String = conducts::change_password(
        &state,
        target,
        payload.current_password.as_deref(),
        payload.new_password.as_deref(),
        payload.confirm_password.as_deref(),
    )
    .await?;

    Ok(HandlerResponse::ok().message(message))
}

// End of file: /src/api/organisation/handler.rs
