use std::sync::Arc;

use ads_sync::{SyncNode, UploadOutcome, MAX_FETCH_BATCH};
use ads_types::{AnalystData, Manifest, RecordKind};
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{Action, AuthProvider, Caller, Credentials};
use crate::error::{ServerError, ServerResult};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<SyncNode>,
    pub auth: Arc<dyn AuthProvider>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FetchRequest {
    pub uuids: Vec<Uuid>,
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ServerResult<Caller> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    state.auth.authenticate(&Credentials::from_header(header)).await
}

async fn authorize(state: &AppState, headers: &HeaderMap, action: Action) -> ServerResult<Caller> {
    let caller = authenticate(state, headers).await?;
    if !state.auth.authorize(&caller, action).await? {
        return Err(ServerError::AuthorizationDenied(format!(
            "{action} for user {}",
            caller.identity.user_id
        )));
    }
    Ok(caller)
}

fn parse_kind(kind: &str) -> ServerResult<RecordKind> {
    kind.parse().map_err(|e: ads_types::TypeError| ServerError::BadRequest(e.to_string()))
}

/// Accept both `{"Note": {...}}` and a bare record body for the kind in the path.
fn tag_payload(kind: RecordKind, payload: Value) -> ServerResult<Value> {
    if let Value::Object(map) = &payload {
        if map.len() == 1 {
            let tag = map
                .keys()
                .next()
                .and_then(|k| RecordKind::ALL.into_iter().find(|candidate| candidate.as_str() == k.as_str()));
            if let Some(tag) = tag {
                return if tag == kind {
                    Ok(payload)
                } else {
                    Err(ServerError::BadRequest(format!("payload is a {tag}, not a {kind}")))
                };
            }
        }
    }
    let mut tagged = serde_json::Map::new();
    tagged.insert(kind.as_str().to_string(), payload);
    Ok(Value::Object(tagged))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "ads-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn index_minimal_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Manifest>> {
    let caller = authorize(&state, &headers, Action::ReadIndex).await?;
    Ok(Json(state.node.index_minimal(&caller.identity)?))
}

pub async fn filter_for_push_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(proposal): Json<Manifest>,
) -> ServerResult<Json<Manifest>> {
    let caller = authorize(&state, &headers, Action::ProposePush).await?;
    let accepted = state.node.filter_proposal(&proposal)?;
    tracing::debug!(user = caller.identity.user_id, proposed = proposal.len(), accepted = accepted.len(), "push proposal answered");
    Ok(Json(accepted))
}

pub async fn upload_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> ServerResult<(StatusCode, Json<UploadOutcome>)> {
    let kind = parse_kind(&kind)?;
    let caller = authenticate(&state, &headers).await?;
    if !state.auth.authorize(&caller, Action::Upload).await? {
        tracing::info!(user = caller.identity.user_id, %kind, "analyst data upload refused");
        return Ok((StatusCode::FORBIDDEN, Json(UploadOutcome::PermissionDenied)));
    }
    let payload = tag_payload(kind, payload)?;
    let outcome = state
        .node
        .receive_upload(&caller.identity, payload, caller.peer.as_ref());
    let status = match &outcome {
        UploadOutcome::Success => StatusCode::OK,
        UploadOutcome::PermissionDenied => StatusCode::FORBIDDEN,
        UploadOutcome::ConflictRejected(_) => StatusCode::CONFLICT,
    };
    tracing::info!(user = caller.identity.user_id, %kind, status = status.as_u16(), "analyst data upload handled");
    Ok((status, Json(outcome)))
}

pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(request): Json<FetchRequest>,
) -> ServerResult<Json<Vec<AnalystData>>> {
    let kind = parse_kind(&kind)?;
    let caller = authorize(&state, &headers, Action::Fetch).await?;
    if request.uuids.len() > MAX_FETCH_BATCH {
        return Err(ServerError::BadRequest(format!(
            "at most {MAX_FETCH_BATCH} uuids may be fetched per request, got {}",
            request.uuids.len()
        )));
    }
    Ok(Json(state.node.records_for_transfer(&caller.identity, kind, &request.uuids)?))
}
