// HTTP API for the sandbox router
// Exposes the router's read-only views, the three fund-moving operations and
// the admin calls over JSON. Addresses accept deployed names as well.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::RouterError;
use crate::metrics;
use crate::router::routes::{
    DepositReceipt, MigrateReceipt, Position, WithdrawReceipt, WithdrawRequest,
};
use crate::sandbox::{Sandbox, SandboxToken};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendInfo {
    pub backend: Address,
    pub name: Option<String>,
    pub preferred: bool,
}

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub asset: Address,
    pub holder: Address,
    pub positions: Vec<Position>,
    pub total: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResponse {
    pub router: Address,
    pub owner: Address,
    pub directory: Address,
}

#[derive(Debug, Deserialize)]
pub struct DepositBody {
    pub caller: String,
    pub asset: String,
    pub recipient: Option<String>,
    pub amount: u128,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawBody {
    pub caller: String,
    pub asset: String,
    pub recipient: Option<String>,
    /// Omit to withdraw the whole position
    pub amount: Option<u128>,
    #[serde(default)]
    pub accept_partial: bool,
}

#[derive(Debug, Deserialize)]
pub struct MigrateBody {
    pub caller: String,
    pub asset: String,
    pub amount: Option<u128>,
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnershipBody {
    pub caller: String,
    pub new_owner: String,
}

#[derive(Debug, Deserialize)]
pub struct SetDirectoryBody {
    pub caller: String,
    pub directory: String,
}

/// Create the HTTP API router
pub fn create_api_router(sandbox: Arc<Sandbox>) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/api/v1/assets/:asset/best", get(best_backend))
        .route("/api/v1/assets/:asset/backends", get(list_backends))
        .route("/api/v1/positions/:asset/:holder", get(positions))
        .route("/api/v1/deposit", post(deposit))
        .route("/api/v1/withdraw", post(withdraw))
        .route("/api/v1/migrate", post(migrate))
        .route("/api/v1/admin", get(admin))
        .route("/api/v1/admin/owner", post(transfer_ownership))
        .route("/api/v1/admin/directory", post(set_directory))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(sandbox)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics_text() -> String {
    metrics::render()
}

async fn best_backend(
    State(sandbox): State<Arc<Sandbox>>,
    Path(asset): Path<String>,
) -> ApiResult<BackendInfo> {
    let asset = resolve(&sandbox, &asset)?;
    let best = sandbox
        .router()
        .best_backend(&asset)
        .await
        .map_err(router_error)?;
    Ok(Json(describe(&sandbox, best.address(), true)))
}

async fn list_backends(
    State(sandbox): State<Arc<Sandbox>>,
    Path(asset): Path<String>,
) -> ApiResult<Vec<BackendInfo>> {
    let asset = resolve(&sandbox, &asset)?;
    let backends = sandbox
        .router()
        .all_backends(&asset)
        .await
        .map_err(router_error)?;
    let last = backends.len().saturating_sub(1);
    Ok(Json(
        backends
            .iter()
            .enumerate()
            .map(|(i, b)| describe(&sandbox, b.address(), i == last))
            .collect(),
    ))
}

async fn positions(
    State(sandbox): State<Arc<Sandbox>>,
    Path((asset, holder)): Path<(String, String)>,
) -> ApiResult<PositionsResponse> {
    let asset = resolve(&sandbox, &asset)?;
    let holder = resolve(&sandbox, &holder)?;
    let positions = sandbox
        .router()
        .positions(&asset, &holder)
        .await
        .map_err(router_error)?;
    let total = positions
        .iter()
        .try_fold(0u128, |acc, p| acc.checked_add(p.value))
        .ok_or_else(|| router_error(RouterError::Arithmetic))?;
    Ok(Json(PositionsResponse {
        asset,
        holder,
        positions,
        total,
    }))
}

async fn deposit(
    State(sandbox): State<Arc<Sandbox>>,
    Json(req): Json<DepositBody>,
) -> ApiResult<DepositReceipt> {
    let caller = resolve(&sandbox, &req.caller)?;
    let token = token(&sandbox, &req.asset)?;
    let recipient = resolve_opt(&sandbox, req.recipient.as_deref())?;
    let receipt = sandbox
        .router()
        .deposit(&caller, token.as_ref(), recipient, req.amount)
        .await
        .map_err(router_error)?;
    Ok(Json(receipt))
}

async fn withdraw(
    State(sandbox): State<Arc<Sandbox>>,
    Json(req): Json<WithdrawBody>,
) -> ApiResult<WithdrawReceipt> {
    let caller = resolve(&sandbox, &req.caller)?;
    let token = token(&sandbox, &req.asset)?;
    let request = WithdrawRequest {
        recipient: resolve_opt(&sandbox, req.recipient.as_deref())?,
        amount: req.amount,
        accept_partial: req.accept_partial,
    };
    let receipt = sandbox
        .router()
        .withdraw(&caller, token.as_ref(), request)
        .await
        .map_err(router_error)?;
    Ok(Json(receipt))
}

async fn migrate(
    State(sandbox): State<Arc<Sandbox>>,
    Json(req): Json<MigrateBody>,
) -> ApiResult<MigrateReceipt> {
    let caller = resolve(&sandbox, &req.caller)?;
    let token = token(&sandbox, &req.asset)?;
    let receipt = sandbox
        .router()
        .migrate(&caller, token.as_ref(), req.amount)
        .await
        .map_err(router_error)?;
    Ok(Json(receipt))
}

async fn admin(State(sandbox): State<Arc<Sandbox>>) -> ApiResult<AdminResponse> {
    Ok(Json(admin_view(&sandbox).await))
}

async fn transfer_ownership(
    State(sandbox): State<Arc<Sandbox>>,
    Json(req): Json<TransferOwnershipBody>,
) -> ApiResult<AdminResponse> {
    let caller = resolve(&sandbox, &req.caller)?;
    let new_owner = resolve(&sandbox, &req.new_owner)?;
    sandbox
        .router()
        .transfer_ownership(&caller, new_owner)
        .await
        .map_err(router_error)?;
    Ok(Json(admin_view(&sandbox).await))
}

async fn set_directory(
    State(sandbox): State<Arc<Sandbox>>,
    Json(req): Json<SetDirectoryBody>,
) -> ApiResult<AdminResponse> {
    let caller = resolve(&sandbox, &req.caller)?;
    let target = resolve(&sandbox, &req.directory)?;
    let registry = sandbox.registry(&target).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "unknown_directory",
            format!("no directory deployed at {target}"),
        )
    })?;
    sandbox
        .router()
        .set_directory(&caller, registry)
        .await
        .map_err(router_error)?;
    Ok(Json(admin_view(&sandbox).await))
}

async fn admin_view(sandbox: &Sandbox) -> AdminResponse {
    let router = sandbox.router();
    AdminResponse {
        router: router.address(),
        owner: router.owner().await,
        directory: router.directory().await.address(),
    }
}

fn describe(sandbox: &Sandbox, backend: Address, preferred: bool) -> BackendInfo {
    BackendInfo {
        backend,
        name: sandbox.vault(&backend).map(|v| v.name().to_string()),
        preferred,
    }
}

fn resolve(sandbox: &Sandbox, input: &str) -> Result<Address, ApiError> {
    sandbox
        .resolve(input)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "unresolved_address", e.to_string()))
}

fn resolve_opt(sandbox: &Sandbox, input: Option<&str>) -> Result<Option<Address>, ApiError> {
    input.map(|raw| resolve(sandbox, raw)).transpose()
}

fn token(sandbox: &Sandbox, input: &str) -> Result<Arc<SandboxToken>, ApiError> {
    let address = resolve(sandbox, input)?;
    sandbox.token(&address).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "unknown_asset",
            format!("no asset deployed at {address}"),
        )
    })
}

pub fn status_for(err: &RouterError) -> StatusCode {
    match err {
        RouterError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        RouterError::NoBackendAvailable { .. } => StatusCode::NOT_FOUND,
        RouterError::Reentrancy => StatusCode::CONFLICT,
        RouterError::InvalidDirectory { .. }
        | RouterError::InsufficientBalance { .. }
        | RouterError::ZeroAmount
        | RouterError::InvalidRecipient
        | RouterError::Arithmetic => StatusCode::UNPROCESSABLE_ENTITY,
        RouterError::Collaborator(_) => StatusCode::BAD_REQUEST,
    }
}

fn router_error(err: RouterError) -> ApiError {
    api_error(status_for(&err), err.kind(), err.to_string())
}

fn api_error(status: StatusCode, kind: &str, error: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error,
            kind: kind.to_string(),
        }),
    )
}
