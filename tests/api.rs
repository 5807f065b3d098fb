//! HTTP surface: JSON bodies, name resolution and error-to-status mapping.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use vault_router::api::create_api_router;
use vault_router::config::WorldConfig;
use vault_router::sandbox::Sandbox;

const WORLD: &str = r#"
accounts: [gov, alice, bob]
router:
  owner: gov
  directory: registry
directories:
  - name: registry
    governance: gov
  - name: registry-v2
    governance: gov
  - name: foreign
    governance: bob
assets:
  - symbol: DAI
    decimals: 18
    balances:
      alice: 1000
  - symbol: USDC
    decimals: 6
backends:
  - name: yvDAI-old
    asset: DAI
    directory: registry
  - name: yvDAI
    asset: DAI
    directory: registry
    deposit_limit: 600
"#;

fn sandbox() -> Arc<Sandbox> {
    let world = WorldConfig::from_yaml(WORLD).unwrap();
    Arc::new(Sandbox::build(&world).unwrap())
}

async fn call(sandbox: &Arc<Sandbox>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = create_api_router(sandbox.clone())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn approve_router(sandbox: &Sandbox, holder: &str, symbol: &str) {
    use vault_router::ports::Asset;
    let holder = sandbox.resolve(holder).unwrap();
    let token = sandbox.token(&sandbox.resolve(symbol).unwrap()).unwrap();
    token
        .approve(&holder, &sandbox.router().address(), u128::MAX)
        .await
        .unwrap();
}

#[tokio::test]
async fn health_and_metrics() {
    let sb = sandbox();
    let (status, _) = call(&sb, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let response = create_api_router(sb.clone())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn backends_listed_oldest_first() {
    let sb = sandbox();
    let (status, body) = call(&sb, "GET", "/api/v1/assets/DAI/backends", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "yvDAI-old");
    assert_eq!(list[0]["preferred"], false);
    assert_eq!(list[1]["name"], "yvDAI");
    assert_eq!(list[1]["preferred"], true);

    let (status, body) = call(&sb, "GET", "/api/v1/assets/dai/best", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "yvDAI");
}

#[tokio::test]
async fn asset_without_backends_is_not_found() {
    let sb = sandbox();
    let (status, body) = call(&sb, "GET", "/api/v1/assets/USDC/best", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "no_backend_available");

    let (status, body) = call(&sb, "GET", "/api/v1/assets/USDC/backends", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_name_is_bad_request() {
    let sb = sandbox();
    let (status, body) = call(&sb, "GET", "/api/v1/positions/DAI/mallory", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "unresolved_address");
}

#[tokio::test]
async fn deposit_withdraw_round_trip() {
    let sb = sandbox();
    approve_router(&sb, "alice", "DAI").await;

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/deposit",
        Some(json!({ "caller": "alice", "asset": "DAI", "amount": 700 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deposited"], 600);
    assert_eq!(body["refunded"], 100);

    let (status, body) = call(&sb, "GET", "/api/v1/positions/DAI/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 600);
    assert_eq!(body["positions"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/withdraw",
        Some(json!({ "caller": "alice", "asset": "DAI", "amount": 900 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "insufficient_balance");

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/withdraw",
        Some(json!({ "caller": "alice", "asset": "DAI", "recipient": "bob", "amount": 250 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["withdrawn"], 250);
    assert_eq!(body["partial"], false);
}

#[tokio::test]
async fn zero_deposit_is_unprocessable() {
    let sb = sandbox();
    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/deposit",
        Some(json!({ "caller": "alice", "asset": "DAI", "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "zero_amount");
}

#[tokio::test]
async fn deposit_without_allowance_is_collaborator_error() {
    let sb = sandbox();
    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/deposit",
        Some(json!({ "caller": "alice", "asset": "DAI", "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "collaborator");
}

#[tokio::test]
async fn migrate_with_nothing_to_move() {
    let sb = sandbox();
    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/migrate",
        Some(json!({ "caller": "alice", "asset": "DAI" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["migrated"], 0);
    assert!(body["legs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_endpoints() {
    let sb = sandbox();
    let gov = sb.resolve("gov").unwrap().to_checksum();
    let bob = sb.resolve("bob").unwrap().to_checksum();

    let (status, body) = call(&sb, "GET", "/api/v1/admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], gov);

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/admin/directory",
        Some(json!({ "caller": "alice", "directory": "registry-v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "not_authorized");

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/admin/directory",
        Some(json!({ "caller": "gov", "directory": "foreign" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_directory");

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/admin/directory",
        Some(json!({ "caller": "gov", "directory": "registry-v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["directory"], sb.resolve("registry-v2").unwrap().to_checksum());

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/admin/directory",
        Some(json!({ "caller": "gov", "directory": "DAI" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "unknown_directory");

    let (status, body) = call(
        &sb,
        "POST",
        "/api/v1/admin/owner",
        Some(json!({ "caller": "gov", "new_owner": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], bob);
}

#[test]
fn sample_world_file_deploys() {
    let world = WorldConfig::load("config/sandbox.yaml").unwrap();
    let sb = Sandbox::build(&world).unwrap();
    assert_eq!(sb.vaults().count(), 4);
    assert!(sb.resolve("yvDAI-0.4.2").is_ok());
}
