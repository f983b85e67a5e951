//! Route handlers.
//!
//! Each handler moves its exchange call onto the blocking pool: the
//! warehouse does synchronous DuckDB I/O.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use gbce_core::{
    CreateStock, Envelope, EnvelopeMeta, Exchange, ExchangeError, Operation, Payload, PriceQuery,
    RecordTrade, TransactionId, ValidationError, Warehouse, SCHEMA_VERSION,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResponse};

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<Exchange<Warehouse>>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolParams {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct VwspParams {
    pub symbol: String,
    #[serde(default)]
    pub window_minutes: Option<i64>,
}

type HandlerResult = Result<ApiResponse, ApiError>;

pub async fn create_stock(
    State(state): State<AppState>,
    body: Result<Json<CreateStock>, JsonRejection>,
) -> HandlerResult {
    let request = body.map(|Json(request)| request).map_err(malformed_body);
    let symbol = request.as_ref().ok().map(|request| request.symbol.clone());

    run(state, Operation::CreateStock, symbol, StatusCode::CREATED, move |exchange| {
        exchange.create_stock(request?)
    })
    .await
}

pub async fn list_stocks(State(state): State<AppState>) -> HandlerResult {
    run(state, Operation::ListStocks, None, StatusCode::OK, Exchange::stocks).await
}

pub async fn get_stock(State(state): State<AppState>, Path(symbol): Path<String>) -> HandlerResult {
    run(
        state,
        Operation::GetStock,
        Some(symbol.clone()),
        StatusCode::OK,
        move |exchange| exchange.stock(&symbol),
    )
    .await
}

pub async fn record_trade(
    State(state): State<AppState>,
    body: Result<Json<RecordTrade>, JsonRejection>,
) -> HandlerResult {
    let request = body.map(|Json(request)| request).map_err(malformed_body);
    let symbol = request
        .as_ref()
        .ok()
        .map(|request| request.stock_symbol.clone());

    run(state, Operation::RecordTrade, symbol, StatusCode::CREATED, move |exchange| {
        exchange.record_trade(request?)
    })
    .await
}

pub async fn list_trades(
    State(state): State<AppState>,
    params: Result<Query<SymbolParams>, QueryRejection>,
) -> HandlerResult {
    let params = params.map(|Query(params)| params).map_err(malformed_query);
    let symbol = params.as_ref().ok().map(|params| params.symbol.clone());

    run(state, Operation::ListTrades, symbol, StatusCode::OK, move |exchange| {
        exchange.trades(&params?.symbol)
    })
    .await
}

pub async fn dividend_yield(
    State(state): State<AppState>,
    body: Result<Json<PriceQuery>, JsonRejection>,
) -> HandlerResult {
    let query = body.map(|Json(query)| query).map_err(malformed_body);
    let symbol = query.as_ref().ok().map(|query| query.symbol.clone());

    run(state, Operation::DividendYield, symbol, StatusCode::OK, move |exchange| {
        exchange.dividend_yield(query?)
    })
    .await
}

pub async fn pe_ratio(
    State(state): State<AppState>,
    body: Result<Json<PriceQuery>, JsonRejection>,
) -> HandlerResult {
    let query = body.map(|Json(query)| query).map_err(malformed_body);
    let symbol = query.as_ref().ok().map(|query| query.symbol.clone());

    run(state, Operation::PeRatio, symbol, StatusCode::OK, move |exchange| {
        exchange.pe_ratio(query?)
    })
    .await
}

pub async fn vwsp(
    State(state): State<AppState>,
    params: Result<Query<VwspParams>, QueryRejection>,
) -> HandlerResult {
    let params = params.map(|Query(params)| params).map_err(malformed_query);
    let symbol = params.as_ref().ok().map(|params| params.symbol.clone());

    run(state, Operation::Vwsp, symbol, StatusCode::OK, move |exchange| {
        let params = params?;
        exchange.vwsp(&params.symbol, params.window_minutes)
    })
    .await
}

pub async fn all_share_index(State(state): State<AppState>) -> HandlerResult {
    run(
        state,
        Operation::AllShareIndex,
        None,
        StatusCode::OK,
        Exchange::all_share_index,
    )
    .await
}

pub async fn health() -> Json<Envelope<serde_json::Value>> {
    Json(Envelope::success(
        EnvelopeMeta::new(TransactionId::new(), 0),
        json!({ "status": "ok", "schema_version": SCHEMA_VERSION }),
    ))
}

pub async fn no_route(method: Method, uri: Uri) -> ApiError {
    ApiError::NoRoute {
        method: method.to_string(),
        path: uri.path().to_owned(),
    }
}

async fn run<T, F>(
    state: AppState,
    operation: Operation,
    symbol: Option<String>,
    success: StatusCode,
    call: F,
) -> HandlerResult
where
    T: Payload + Send + 'static,
    F: FnOnce(&Exchange<Warehouse>) -> Result<T, ExchangeError> + Send + 'static,
{
    let exchange = Arc::clone(&state.exchange);
    let handled =
        tokio::task::spawn_blocking(move || exchange.handle(operation, symbol.as_deref(), call))
            .await?;
    ApiResponse::from_handled(handled, success)
}

fn malformed_body(rejection: JsonRejection) -> ValidationError {
    ValidationError::MalformedRequest {
        reason: rejection.body_text(),
    }
}

fn malformed_query(rejection: QueryRejection) -> ValidationError {
    ValidationError::MalformedRequest {
        reason: rejection.body_text(),
    }
}
