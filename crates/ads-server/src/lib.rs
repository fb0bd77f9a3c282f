//! HTTP peer endpoints for analyst data synchronization.
//!
//! Exposes the four operations a remote instance drives during push and
//! pull (minimal index, proposal filter, upload, fetch) over axum, behind
//! bearer-token authentication.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{Action, AuthProvider, Caller, Credentials, StaticKeyAuth};
pub use config::{ApiKeyConfig, InstanceConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, FetchRequest};
pub use server::AnalystDataServer;

#[cfg(test)]
mod tests {
    use super::*;
    use ads_sync::UploadOutcome;
    use ads_types::{Distribution, Manifest, Peer, RecordKind};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    const ORG_A: Uuid = Uuid::from_u128(0xA);
    const ORG_B: Uuid = Uuid::from_u128(0xB);

    fn server() -> AnalystDataServer {
        let mut config = ServerConfig::default();
        config.instance.org_uuid = ORG_A;
        config.peers.push(Peer::new(2, "https://b", ORG_B));
        config.api_keys.push(ApiKeyConfig {
            token: "sync-b".into(),
            user_id: 10,
            email: "sync@b".into(),
            org_uuid: ORG_B,
            site_admin: false,
            sync: true,
            peer_id: Some(2),
        });
        config.api_keys.push(ApiKeyConfig {
            token: "reader".into(),
            user_id: 11,
            email: "reader@b".into(),
            org_uuid: ORG_B,
            site_admin: false,
            sync: false,
            peer_id: None,
        });
        AnalystDataServer::new(config).unwrap()
    }

    fn note_body(uuid: u128, modified: &str, distribution: u8) -> Value {
        json!({
            "uuid": Uuid::from_u128(uuid),
            "object_type": "Event",
            "object_uuid": Uuid::from_u128(0xE),
            "orgc_uuid": ORG_B,
            "distribution": distribution,
            "modified": modified,
            "note": "observed"
        })
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = server().router();
        let (status, body) = call(&app, request("GET", "/v1/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn index_requires_token() {
        let app = server().router();
        let (status, _) = call(&app, request("GET", "/v1/analyst-data/index-minimal", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, request("GET", "/v1/analyst-data/index-minimal", Some("bogus"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_then_index_then_fetch() {
        let server = server();
        let app = server.router();

        let (status, body) = call(
            &app,
            request("POST", "/v1/analyst-data/note/upload", Some("sync-b"), Some(note_body(1, "2024-01-01T00:00:00Z", 2))),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(serde_json::from_value::<UploadOutcome>(body).unwrap(), UploadOutcome::Success);

        let (status, body) = call(&app, request("GET", "/v1/analyst-data/index-minimal", Some("reader"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let index: Manifest = serde_json::from_value(body).unwrap();
        assert!(index.contains(RecordKind::Note, &Uuid::from_u128(1)));

        let (status, body) = call(
            &app,
            request("POST", "/v1/analyst-data/Note/fetch", Some("reader"), Some(json!({"uuids": [Uuid::from_u128(1)]}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records: Vec<ads_types::AnalystData> = serde_json::from_value(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].envelope().distribution, Distribution::ConnectedCommunities);
        assert_eq!(records[0].envelope().org_uuid, ORG_B);
    }

    #[tokio::test]
    async fn fetch_rejects_oversized_batch() {
        let app = server().router();
        let uuids: Vec<Uuid> = (1..=ads_sync::MAX_FETCH_BATCH as u128 + 1).map(Uuid::from_u128).collect();
        let (status, body) = call(
            &app,
            request("POST", "/v1/analyst-data/Note/fetch", Some("reader"), Some(json!({ "uuids": uuids }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at most 100 uuids"));

        let (status, body) = call(
            &app,
            request("POST", "/v1/analyst-data/Note/fetch", Some("reader"), Some(json!({ "uuids": &uuids[..100] }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn upload_without_sync_privilege_is_refused() {
        let app = server().router();
        let (status, body) = call(
            &app,
            request("POST", "/v1/analyst-data/note/upload", Some("reader"), Some(note_body(1, "2024-01-01T00:00:00Z", 1))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(serde_json::from_value::<UploadOutcome>(body).unwrap(), UploadOutcome::PermissionDenied);
    }

    #[tokio::test]
    async fn stale_upload_conflicts() {
        let app = server().router();
        let tagged = json!({"Note": note_body(1, "2024-01-02T00:00:00Z", 1)});
        let (status, _) = call(&app, request("POST", "/v1/analyst-data/note/upload", Some("sync-b"), Some(tagged))).await;
        assert_eq!(status, StatusCode::OK);
        let older = note_body(1, "2024-01-01T00:00:00Z", 1);
        let (status, body) = call(&app, request("POST", "/v1/analyst-data/note/upload", Some("sync-b"), Some(older))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "conflict_rejected");
    }

    #[tokio::test]
    async fn proposal_filter_answers_subset() {
        let server = server();
        let app = server.router();
        let (status, _) = call(
            &app,
            request("POST", "/v1/analyst-data/note/upload", Some("sync-b"), Some(note_body(1, "2024-01-05T00:00:00Z", 1))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mut proposal = Manifest::new();
        let candidate = "2024-01-03T00:00:00Z".parse().unwrap();
        proposal.insert(RecordKind::Note, Uuid::from_u128(1), candidate);
        proposal.insert(RecordKind::Note, Uuid::from_u128(2), candidate);
        let body = serde_json::to_value(&proposal).unwrap();
        let (status, body) = call(&app, request("POST", "/v1/analyst-data/filter-for-push", Some("sync-b"), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        let accepted: Manifest = serde_json::from_value(body).unwrap();
        assert_eq!(accepted.uuids(RecordKind::Note), vec![Uuid::from_u128(2)]);
    }

    #[tokio::test]
    async fn unknown_kind_is_bad_request() {
        let app = server().router();
        let (status, _) = call(
            &app,
            request("POST", "/v1/analyst-data/galaxy/fetch", Some("reader"), Some(json!({"uuids": []}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
