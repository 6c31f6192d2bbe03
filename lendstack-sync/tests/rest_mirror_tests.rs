use lendstack_model::Repositories;
use lendstack_storage::KvStore;
use lendstack_sync::{
    Predicate, RemoteMirror, RestMirror, RestMirrorConfig, SyncConfig, SyncError, Synchronizer,
};
use lendstack_types::EntityKind;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mirror_for(server: &MockServer) -> RestMirror {
    RestMirror::new(RestMirrorConfig {
        base_url: server.uri(),
        api_key: "anon-key".to_string(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn rest_config_default() {
    let cfg = RestMirrorConfig::default();
    assert_eq!(cfg.base_url, "http://localhost:54321");
    assert!(cfg.api_key.is_empty());
    assert_eq!(cfg.schema, None);
    assert_eq!(cfg.timeout_secs, 10);
}

#[test]
fn rest_provider_name() {
    let mirror = RestMirror::new(RestMirrorConfig::default()).unwrap();
    assert_eq!(mirror.provider_name(), "PostgREST");
}

// ── Requests ────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_posts_with_conflict_target_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/enquiries"))
        .and(query_param("on_conflict", "id"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .and(body_partial_json(json!({"id": 7, "full_name": "Ada"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    mirror_for(&server)
        .upsert("enquiries", &json!({"id": 7, "full_name": "Ada"}), "id")
        .await
        .unwrap();
}

#[tokio::test]
async fn schema_is_sent_as_profile_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/staff"))
        .and(header("content-profile", "lending"))
        .and(header("accept-profile", "lending"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mirror = RestMirror::new(RestMirrorConfig {
        base_url: format!("{}/", server.uri()),
        schema: Some("lending".to_string()),
        ..Default::default()
    })
    .unwrap();
    mirror.upsert("staff", &json!({"id": 1}), "id").await.unwrap();
}

#[tokio::test]
async fn select_count_reads_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/staff"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-2/3"))
        .mount(&server)
        .await;

    assert_eq!(mirror_for(&server).select_count("staff").await.unwrap(), 3);
}

#[tokio::test]
async fn select_count_without_content_range_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/staff"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = mirror_for(&server).select_count("staff").await.unwrap_err();
    assert!(matches!(err, SyncError::Remote { status: 200, .. }));
}

#[tokio::test]
async fn select_by_id_returns_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .and(query_param("id", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "file_name": "a.pdf"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mirror = mirror_for(&server);
    let row = mirror.select_by_id("documents", 2).await.unwrap().unwrap();
    assert_eq!(row["file_name"], "a.pdf");
    assert!(mirror.select_by_id("documents", 3).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_where_uses_id_filters() {
    let server = MockServer::start().await;
    for filter in ["gte.0", "eq.4", "not.in.(1,2)"] {
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/staff"))
            .and(query_param("id", filter))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mirror = mirror_for(&server);
    mirror.delete_where("staff", &Predicate::All).await.unwrap();
    mirror.delete_where("staff", &Predicate::IdEq(4)).await.unwrap();
    mirror
        .delete_where("staff", &Predicate::IdNotIn(vec![1, 2]))
        .await
        .unwrap();
}

// ── Errors ──────────────────────────────────────────────────────

#[tokio::test]
async fn error_status_becomes_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/staff"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .mount(&server)
        .await;

    let err = mirror_for(&server)
        .upsert("staff", &json!({"id": 1}), "id")
        .await
        .unwrap_err();
    match err {
        SyncError::Remote { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "duplicate key");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn gateway_errors_count_as_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = mirror_for(&server).ping().await.unwrap_err();
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn closed_port_is_a_network_error() {
    let mirror = RestMirror::new(RestMirrorConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = mirror.ping().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_) | SyncError::Timeout));
    assert!(err.is_connectivity());
}

// ── Synchronizer over REST ──────────────────────────────────────

#[tokio::test]
async fn sync_all_over_rest_counts_rejected_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/staff"))
        .and(body_partial_json(json!({"id": 2})))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad row"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/staff"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let repos = Arc::new(Repositories::open(Arc::new(KvStore::in_memory())).unwrap());
    let config = SyncConfig {
        record_delay_ms: 0,
        ..SyncConfig::default()
    };
    let sync = Synchronizer::new(repos, Arc::new(mirror_for(&server)), config);

    let report = sync.sync_all(EntityKind::Staff).await.unwrap();
    assert_eq!((report.succeeded, report.failed), (2, 1));
    assert!(report.failures[0].error.contains("400"));
}
