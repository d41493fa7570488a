//! # Integration Tests for zkauth-api
//!
//! Drives the full router over the mock proof system: health probes,
//! artifact distribution, registration and login status codes, the metric
//! log, SQLite persistence, and the OpenAPI document.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use zkauth_api::state::{AppConfig, ProofBackend, UserStore};
use zkauth_zkp::{CommitmentWitness, MockProofSystem, ProofSystem, Secret};

/// Helper: a bootstrapped app over the mock backend, rooted in a temp dir.
struct TestApp {
    router: axum::Router,
    dir: tempfile::TempDir,
}

async fn test_app_with(database: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        artifact_dir: dir.path().join("zk"),
        key_dir: dir.path().join("keys"),
        metrics_file: dir.path().join("metrics").join("auth_metrics.csv"),
        database_url: database
            .then(|| format!("sqlite://{}", dir.path().join("users.db").display())),
        backend: ProofBackend::Mock,
        ..AppConfig::default()
    };
    let state = zkauth_api::bootstrap::bootstrap(config).await.unwrap();
    TestApp {
        router: zkauth_api::app(state),
        dir,
    }
}

async fn test_app() -> TestApp {
    test_app_with(false).await
}

/// Helper: read response body as bytes.
async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn get(app: &TestApp, uri: &str) -> axum::http::Response<Body> {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::ORIGIN, "http://client.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_json(app: &TestApp, uri: &str, body: &Value) -> axum::http::Response<Body> {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Helper: what a browser client does. Fetch the proving key, derive the
/// witness from the credentials, prove, and build register/login bodies.
struct Client {
    stored_hash: Vec<String>,
    proof: Value,
    inputs: Value,
}

async fn client(app: &TestApp, username: &str, password: &str) -> Client {
    let pk_bytes = body_bytes(get(app, "/zk/proving.key").await).await;
    let system = MockProofSystem::default();
    let pk = system.decode_proving_key(&pk_bytes).unwrap();

    let secret = Secret::from_credentials(username, password, "salt").unwrap();
    let witness = CommitmentWitness::from_secret(&secret);
    let proof = system.prove(&pk, &witness).unwrap();

    let stored_hash = witness.commitment.to_strings().to_vec();
    Client {
        inputs: json!(stored_hash),
        stored_hash,
        proof: serde_json::to_value(proof).unwrap(),
    }
}

fn metric_rows(app: &TestApp) -> Vec<String> {
    std::fs::read_to_string(app.dir.path().join("metrics").join("auth_metrics.csv"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app().await;
    let response = get(&app, "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = test_app().await;
    let response = get(&app, "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ready");
}

#[tokio::test]
async fn test_readiness_reports_unavailable_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        artifact_dir: dir.path().join("zk"),
        key_dir: dir.path().join("keys"),
        metrics_file: dir.path().join("metrics").join("auth_metrics.csv"),
        database_url: Some(format!("sqlite://{}", dir.path().join("users.db").display())),
        backend: ProofBackend::Mock,
        ..AppConfig::default()
    };
    let state = zkauth_api::bootstrap::bootstrap(config).await.unwrap();
    if let UserStore::Sqlite(pool) = state.engine.store() {
        pool.close().await;
    }
    let app = TestApp {
        router: zkauth_api::app(state),
        dir,
    };

    let response = get(&app, "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "SERVICE_UNAVAILABLE");
}

// -- Artifacts ----------------------------------------------------------------

#[tokio::test]
async fn test_artifacts_served_verbatim_with_cors() {
    let app = test_app().await;
    for (uri, file, content_type) in [
        ("/zk/out", "zk/out", "application/octet-stream"),
        ("/zk/abi.json", "zk/abi.json", "application/json"),
        ("/zk/proving.key", "zk/proving.key", "application/octet-stream"),
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], content_type, "{uri}");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*",
            "{uri}"
        );
        let on_disk = std::fs::read(app.dir.path().join(file)).unwrap();
        assert_eq!(body_bytes(response).await, on_disk, "{uri}");
    }
}

#[tokio::test]
async fn test_abi_names_commitment_output() {
    let app = test_app().await;
    let abi = body_json(get(&app, "/zk/abi.json").await).await;
    assert_eq!(abi["circuit"], "sha256_packed_commitment");
    assert_eq!(abi["inputs"][0]["components"]["size"], 4);
}

#[tokio::test]
async fn test_responses_are_gzip_compressed_on_request() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let plain = get(&app, "/openapi.json").await;
    assert!(plain.headers().get(header::CONTENT_ENCODING).is_none());
}

#[tokio::test]
async fn test_verification_key_is_not_served() {
    let app = test_app().await;
    let response = get(&app, "/zk/verification.key").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn test_register_created_then_conflict() {
    let app = test_app().await;
    let body = json!({"username": "alice", "stored_hash": ["111", "222"]});

    let response = post_json(&app, "/register", &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["username"], "alice");
    assert_eq!(created["stored_hash"], json!(["111", "222"]));

    let different = json!({"username": "alice", "stored_hash": ["333", "444"]});
    let response = post_json(&app, "/register", &different).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_bad_shapes() {
    let app = test_app().await;
    for body in [
        json!({"username": "alice", "stored_hash": ["1"]}),
        json!({"username": "alice", "stored_hash": ["1", "2", "3"]}),
        json!({"username": "alice", "stored_hash": ["1", "0xff"]}),
        json!({"username": "", "stored_hash": ["1", "2"]}),
        json!({"username": "alice"}),
        json!({"username": "alice", "stored_hash": "1,2"}),
    ] {
        let response = post_json(&app, "/register", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_register_rejects_non_json() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Login --------------------------------------------------------------------

#[tokio::test]
async fn test_login_round_trip() {
    let app = test_app().await;
    let c = client(&app, "alice", "correct horse").await;
    let response = post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": c.stored_hash}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        &app,
        "/login",
        &json!({"username": "alice", "proof": c.proof, "inputs": c.inputs}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Welcome back, alice");
}

#[tokio::test]
async fn test_login_accepts_nested_inputs_with_leading_elements() {
    let app = test_app().await;
    let c = client(&app, "alice", "correct horse").await;
    post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": c.stored_hash}),
    )
    .await;

    let nested = json!([["0", "0", "0"], [c.stored_hash[0], [c.stored_hash[1]]]]);
    let response = post_json(
        &app,
        "/login",
        &json!({"username": "alice", "proof": c.proof, "inputs": nested}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_unknown_user_is_404() {
    let app = test_app().await;
    let c = client(&app, "ghost", "pw").await;
    let response = post_json(
        &app,
        "/login",
        &json!({"username": "ghost", "proof": c.proof, "inputs": c.inputs}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_wrong_password_is_403() {
    let app = test_app().await;
    let good = client(&app, "alice", "right").await;
    let bad = client(&app, "alice", "wrong").await;
    post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": good.stored_hash}),
    )
    .await;

    let response = post_json(
        &app,
        "/login",
        &json!({"username": "alice", "proof": bad.proof, "inputs": bad.inputs}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"]["code"], "WRONG_CREDENTIALS");
}

#[tokio::test]
async fn test_login_forged_proof_is_401() {
    let app = test_app().await;
    let c = client(&app, "alice", "pw").await;
    post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": c.stored_hash}),
    )
    .await;

    for forged in [json!({"proof_hex": "0".repeat(64)}), json!({"pi_a": [1, 2]})] {
        let response = post_json(
            &app,
            "/login",
            &json!({"username": "alice", "proof": forged, "inputs": c.inputs}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_PROOF");
    }
}

#[tokio::test]
async fn test_login_malformed_inputs_is_400() {
    let app = test_app().await;
    let c = client(&app, "alice", "pw").await;
    post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": c.stored_hash}),
    )
    .await;

    let padded_claim = json!([format!("0{}", c.stored_hash[0]), c.stored_hash[1]]);
    for inputs in [
        json!(["1"]),
        json!([]),
        json!([["1", "x"]]),
        json!([1, 2]),
        padded_claim,
    ] {
        let response = post_json(
            &app,
            "/login",
            &json!({"username": "alice", "proof": c.proof, "inputs": inputs}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{inputs}");
    }
}

#[tokio::test]
async fn test_login_missing_fields_is_400() {
    let app = test_app().await;
    let response = post_json(&app, "/login", &json!({"username": "alice"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Metric Log ---------------------------------------------------------------

#[tokio::test]
async fn test_metric_log_rows() {
    let app = test_app().await;
    let c = client(&app, "alice", "pw").await;
    post_json(
        &app,
        "/register",
        &json!({
            "username": "alice",
            "stored_hash": c.stored_hash,
            "metrics": {"client_duration_ms": 41, "client_start_ms": 1000, "client_end_ms": 1041}
        }),
    )
    .await;
    post_json(
        &app,
        "/login",
        &json!({
            "username": "alice", "proof": c.proof, "inputs": c.inputs,
            "metrics": {"total_duration_ms": 730, "fetch_duration_ms": 120, "proof_duration_ms": 600}
        }),
    )
    .await;
    post_json(
        &app,
        "/login",
        &json!({"username": "alice", "proof": {"proof_hex": "f".repeat(64)}, "inputs": c.inputs}),
    )
    .await;
    // Not-found attempts leave no row.
    post_json(
        &app,
        "/login",
        &json!({"username": "nobody", "proof": c.proof, "inputs": c.inputs}),
    )
    .await;

    let rows = metric_rows(&app);
    assert_eq!(rows[0], "timestamp,event,username,duration_ms,extra1,extra2,extra3");
    assert_eq!(rows.len(), 4);
    assert!(rows[1].contains(",register,alice,41,start=1000,end=1041,stored_hash="));
    assert!(rows[2].ends_with(",login-success,alice,730,fetch=120,proof=600,-"));
    assert!(rows[3].contains(",login-invalid,alice,"));
}

// -- Persistence --------------------------------------------------------------

#[tokio::test]
async fn test_sqlite_store_enforces_create_once() {
    let app = test_app_with(true).await;
    let c = client(&app, "alice", "pw").await;
    let register = json!({"username": "alice", "stored_hash": c.stored_hash});

    assert_eq!(post_json(&app, "/register", &register).await.status(), StatusCode::CREATED);
    assert_eq!(post_json(&app, "/register", &register).await.status(), StatusCode::CONFLICT);

    let response = post_json(
        &app,
        "/login",
        &json!({"username": "alice", "proof": c.proof, "inputs": c.inputs}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Observability ------------------------------------------------------------

#[tokio::test]
async fn test_prometheus_metrics_endpoint() {
    let app = test_app().await;
    post_json(
        &app,
        "/register",
        &json!({"username": "alice", "stored_hash": ["1", "2"]}),
    )
    .await;
    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("zkauth_registered_users 1"));
    assert!(text.contains("path=\"/register\""));
}

#[tokio::test]
async fn test_openapi_document() {
    let app = test_app().await;
    let response = get(&app, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/login"]["post"].is_object());
    assert!(doc["paths"]["/register"]["post"].is_object());
}
