// Shared fixtures for the behavior tests.
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use gbce_core::{CreateStock, Exchange, RecordTrade, Warehouse, WarehouseConfig};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// An exchange over a throwaway database. The directory lives as long as this value.
pub struct TestExchange {
    pub temp: TempDir,
    pub exchange: Arc<Exchange<Warehouse>>,
}

impl TestExchange {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let warehouse =
            Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("warehouse open");
        Self {
            temp,
            exchange: Arc::new(Exchange::new(warehouse)),
        }
    }

    pub fn router(&self) -> Router {
        gbce_web::router(Arc::clone(&self.exchange))
    }

    pub fn home(&self) -> &str {
        self.temp.path().to_str().expect("utf8 temp path")
    }
}

impl Default for TestExchange {
    fn default() -> Self {
        Self::new()
    }
}

pub fn common(symbol: &str, last_dividend: f64, par_value: f64) -> CreateStock {
    CreateStock {
        symbol: symbol.to_string(),
        stock_type: "Common".to_string(),
        par_value,
        last_dividend: Some(last_dividend),
        fixed_dividend: None,
    }
}

pub fn preferred(
    symbol: &str,
    last_dividend: Option<f64>,
    fixed_dividend: f64,
    par_value: f64,
) -> CreateStock {
    CreateStock {
        symbol: symbol.to_string(),
        stock_type: "Preferred".to_string(),
        par_value,
        last_dividend,
        fixed_dividend: Some(fixed_dividend),
    }
}

pub fn buy(symbol: &str, quantity: i64, price: f64) -> RecordTrade {
    RecordTrade {
        stock_symbol: symbol.to_string(),
        timestamp: None,
        quantity,
        trade_type: "buy".to_string(),
        price,
    }
}

/// Send one request through the router and decode the JSON body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}
