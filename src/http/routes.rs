use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Account, AccountId, TransferRequest};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Path ids must be positive integers before they reach the ledger.
pub fn parse_id(raw: &str) -> Result<AccountId, ApiError> {
    match raw.parse::<AccountId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("Invalid id given {raw}"))),
    }
}

pub async fn create_account(
    State(service): State<AppState>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Json(body) = body?;
    let account = service
        .create_account(body.first_name, body.last_name)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(
    State(service): State<AppState>,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(service.get_accounts().await?))
}

pub async fn get_account(
    State(service): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(service.get_account(id).await?))
}

pub async fn delete_account(
    State(service): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    service.delete_account(id).await?;
    Ok((StatusCode::OK, Json(json!({ "deleted": id }))))
}

pub async fn transfer(
    State(service): State<AppState>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferRequest>, ApiError> {
    let Json(request) = body?;
    for id in [request.from_account_id, request.to_account_id] {
        if id <= 0 {
            return Err(ApiError::bad_request(format!("Invalid id given {id}")));
        }
    }
    service.transfer(request).await?;
    Ok(Json(request))
}
