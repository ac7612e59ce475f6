//! # HTTP Routes
//!
//! The POS-facing surface of the driver. Handlers translate HTTP into
//! [`DriverHandle`] calls and never touch driver state themselves.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST|GET|PUT /hw_proxy/payment_terminal_transaction_start   JSON-RPC  │
//! │  GET          /hw_proxy/payment_terminal_status?terminal_id=           │
//! │  GET          /hw_proxy/payment_terminal_history?order_id=             │
//! │  POST         /hw_proxy/payment_terminal_result              JSON-RPC  │
//! │  POST         /ctep_status                        form: price, mode    │
//! │  GET          /health                                                  │
//! │                                                                         │
//! │  Every route answers OPTIONS and carries permissive CORS headers.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Start Request
//! ```json
//! {"jsonrpc":"2.0","id":7,"params":{"payment_info":
//!     "{\"terminal_id\":\"T1\",\"amount\":10.0,\"order_id\":\"ORDER-1\"}"}}
//! ```
//! `payment_info` may also be sent as a plain object. The reply arrives as
//! soon as the driver accepted the sale:
//! ```json
//! {"jsonrpc":"2.0","id":7,"result":{"transaction_id":1,"terminal_id":"T1","order_id":"ORDER-1"}}
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Form, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ctep_core::validation::parse_amount;
use ctep_core::{PaymentError, PaymentRequest, TerminalId, TransactionId, CURRENCY_ISO};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::driver::DriverHandle;
use crate::error::{DriverError, DriverResult};

/// How long `payment_terminal_result` waits before answering "pending".
pub const RESULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Order reference used by the certification form.
pub const TEST_ORDER_ID: &str = "TEST";

// =============================================================================
// Errors
// =============================================================================

/// Error object returned to the POS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl ApiError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const INVALID_AMOUNT: i64 = -32001;
    pub const TERMINAL_NOT_READY: i64 = -32002;
    pub const UNKNOWN_TRANSACTION: i64 = -32004;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    fn status_code(&self) -> StatusCode {
        match self.code {
            Self::TERMINAL_NOT_READY => StatusCode::CONFLICT,
            Self::UNKNOWN_TRANSACTION => StatusCode::NOT_FOUND,
            Self::INTERNAL_ERROR => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let code = match &err {
            PaymentError::InvalidAmount { .. } => Self::INVALID_AMOUNT,
            PaymentError::TerminalNotReady { .. } => Self::TERMINAL_NOT_READY,
            PaymentError::UnknownTransaction(_) => Self::UNKNOWN_TRANSACTION,
            PaymentError::Validation(_) => Self::INVALID_PARAMS,
            PaymentError::TerminalCommunication(_) | PaymentError::DuplicateTransactionId(_) => {
                Self::INTERNAL_ERROR
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Payment(e) => e.into(),
            DriverError::SerializationFailed(msg) => ApiError::new(Self::PARSE_ERROR, msg),
            other => ApiError::new(Self::INTERNAL_ERROR, other.to_string()),
        }
    }
}

/// Non-JSON-RPC routes answer `{"error": {...}}` with a matching status.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self }))).into_response()
    }
}

// =============================================================================
// JSON-RPC Envelope
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    params: Value,
}

impl RpcRequest {
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::new(ApiError::PARSE_ERROR, format!("Invalid JSON-RPC request: {e}")))
    }
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

impl RpcResponse {
    fn new(id: Value, outcome: Result<Value, ApiError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e)),
        };
        RpcResponse {
            jsonrpc: "2.0",
            id,
            result,
            error,
        }
    }
}

/// Reply to an accepted start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartResponse {
    pub transaction_id: TransactionId,
    pub terminal_id: TerminalId,
    pub order_id: String,
}

// =============================================================================
// Payment Info
// =============================================================================

/// Builds a request from the POS `payment_info` object.
///
/// The amount is checked first, so a bad amount is reported as
/// `InvalidAmount` even when other fields are also wrong. A missing
/// `terminal_id` falls back to `default_terminal_id`.
pub fn payment_request_from_info(
    info: &Value,
    default_terminal_id: &str,
) -> Result<PaymentRequest, PaymentError> {
    let amount = parse_amount(info.get("amount"))?;
    let terminal_id = text_field(info, "terminal_id").unwrap_or_else(|| default_terminal_id.to_string());
    let order_id = text_field(info, "order_id").unwrap_or_default();
    PaymentRequest::new(TerminalId::from(terminal_id), amount, order_id)
}

/// Strings are taken as-is; numbers are accepted for ids sent unquoted.
fn text_field(info: &Value, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `payment_info` arrives either as an object or as a JSON-encoded string.
fn payment_info(params: &Value) -> Result<Value, ApiError> {
    match params.get("payment_info") {
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
            .ok()
            .filter(Value::is_object)
            .ok_or_else(|| ApiError::invalid_params("payment_info is not a JSON object")),
        Some(info @ Value::Object(_)) => Ok(info.clone()),
        _ => Err(ApiError::invalid_params("payment_info is required")),
    }
}

// =============================================================================
// Server
// =============================================================================

/// Shared state for the handlers.
pub struct ServerState {
    driver: DriverHandle,
    default_terminal_id: String,
    result_timeout: Duration,
}

impl ServerState {
    pub fn new(driver: DriverHandle, config: &DriverConfig) -> Self {
        ServerState {
            driver,
            default_terminal_id: config.default_terminal_id().to_string(),
            result_timeout: RESULT_WAIT_TIMEOUT,
        }
    }

    pub fn with_result_timeout(mut self, timeout: Duration) -> Self {
        self.result_timeout = timeout;
        self
    }

    async fn start(&self, info: &Value) -> Result<StartResponse, ApiError> {
        let request = payment_request_from_info(info, &self.default_terminal_id)?;
        let terminal_id = request.terminal_id().clone();
        let order_id = request.order_reference().to_string();

        if let Some(mode) = info.get("payment_mode").and_then(Value::as_str) {
            debug!(payment_mode = mode, order_id = %order_id, "Payment mode requested");
        }

        let transaction_id = self.driver.start_transaction(request).await?;
        Ok(StartResponse {
            transaction_id,
            terminal_id,
            order_id,
        })
    }
}

/// Builds the router with CORS applied to every route.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(
            "/hw_proxy/payment_terminal_transaction_start",
            get(transaction_start)
                .post(transaction_start)
                .put(transaction_start)
                .options(preflight),
        )
        .route(
            "/hw_proxy/payment_terminal_status",
            get(terminal_status).options(preflight),
        )
        .route(
            "/hw_proxy/payment_terminal_history",
            get(order_history).options(preflight),
        )
        .route(
            "/hw_proxy/payment_terminal_result",
            axum::routing::post(transaction_result).options(preflight),
        )
        .route(
            "/ctep_status",
            axum::routing::post(ctep_status).options(preflight),
        )
        .route("/health", get(health_handler))
        .layer(middleware::map_response(add_cors_headers))
        .with_state(state)
}

/// Binds the HTTP port and serves until `shutdown` completes.
pub async fn serve(
    config: &DriverConfig,
    driver: DriverHandle,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> DriverResult<()> {
    let state = Arc::new(ServerState::new(driver, config));
    let app = router(state);

    let bind_addr = config.http.bind_address();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}

async fn transaction_start(
    State(state): State<Arc<ServerState>>,
    method: Method,
    body: Bytes,
) -> Json<RpcResponse> {
    let rpc = match RpcRequest::parse(&body) {
        Ok(rpc) => rpc,
        Err(e) => {
            warn!(method = %method, error = %e.message, "Rejected start request");
            return Json(RpcResponse::new(Value::Null, Err(e)));
        }
    };

    let outcome = match payment_info(&rpc.params) {
        Ok(info) => state.start(&info).await,
        Err(e) => Err(e),
    };
    let outcome = outcome.and_then(|started| {
        info!(
            transaction_id = %started.transaction_id,
            terminal_id = %started.terminal_id,
            order_id = %started.order_id,
            "Payment terminal transaction started"
        );
        serde_json::to_value(started).map_err(|e| DriverError::from(e).into())
    });
    if let Err(ref e) = outcome {
        warn!(code = e.code, error = %e.message, "Start request failed");
    }
    Json(RpcResponse::new(rpc.id, outcome))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    terminal_id: Option<String>,
}

async fn terminal_status(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let terminal_id = query
        .terminal_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.default_terminal_id.clone());
    let status = state.driver.status(TerminalId::from(terminal_id)).await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    order_id: String,
}

async fn order_history(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.driver.history(query.order_id).await?;
    Ok(Json(history))
}

/// Long-poll for the outcome of one transaction.
async fn transaction_result(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Json<RpcResponse> {
    let rpc = match RpcRequest::parse(&body) {
        Ok(rpc) => rpc,
        Err(e) => return Json(RpcResponse::new(Value::Null, Err(e))),
    };

    let Some(transaction_id) = rpc.params.get("transaction_id").and_then(Value::as_u64) else {
        let err = ApiError::invalid_params("transaction_id is required");
        return Json(RpcResponse::new(rpc.id, Err(err)));
    };
    let transaction_id = TransactionId::new(transaction_id);

    let waited = tokio::time::timeout(
        state.result_timeout,
        state.driver.wait_for_result(transaction_id),
    )
    .await;

    let outcome: Result<Value, ApiError> = match waited {
        Ok(Ok(Some(entry))) => serde_json::to_value(entry).map_err(|e| DriverError::from(e).into()),
        Ok(Ok(None)) => Err(PaymentError::UnknownTransaction(transaction_id).into()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Ok(json!({ "transaction_id": transaction_id, "status": "pending" })),
    };
    Json(RpcResponse::new(rpc.id, outcome))
}

#[derive(Debug, Deserialize)]
struct CtepStatusForm {
    price: String,
    #[serde(default)]
    payment_mode: Option<String>,
}

/// Certification form: starts a sale for order "TEST" on the default terminal.
async fn ctep_status(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<CtepStatusForm>,
) -> Result<impl IntoResponse, ApiError> {
    let info = json!({
        "amount": form.price.trim(),
        "payment_mode": form.payment_mode.unwrap_or_else(|| "card".to_string()),
        "currency_iso": CURRENCY_ISO,
        "order_id": TEST_ORDER_ID,
    });
    info!(price = %form.price, "Test transaction requested");
    let started = state.start(&info).await?;
    Ok(Json(started))
}
