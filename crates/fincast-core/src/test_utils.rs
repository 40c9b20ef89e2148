//! Test utilities for fincast-core
//!
//! Provides a mock exchange-rate API server for integration tests and for
//! running the CLI without network access.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Mock rates API serving `/latest` and `/timeseries`
pub struct MockRatesServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockRatesServer {
    /// Rate returned by `/latest` for every symbol except `XYZ`
    pub const CURRENT_RATE: f64 = 0.92;

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/latest", get(handle_latest))
            .route("/timeseries", get(handle_timeseries));
        Self::serve(app).await
    }

    /// Start a server that rejects every request with an API error body
    pub async fn start_failing() -> Self {
        let app = Router::new()
            .route("/latest", get(handle_error))
            .route("/timeseries", get(handle_error));
        Self::serve(app).await
    }

    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockRatesServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct RatesQuery {
    base: Option<String>,
    symbols: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

fn known_symbols(query: &RatesQuery) -> Vec<String> {
    query
        .symbols
        .as_deref()
        .unwrap_or("EUR")
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| s != "XYZ")
        .collect()
}

async fn handle_latest(Query(query): Query<RatesQuery>) -> Json<Value> {
    let rates: BTreeMap<String, f64> = known_symbols(&query)
        .into_iter()
        .map(|s| (s, MockRatesServer::CURRENT_RATE))
        .collect();
    Json(json!({
        "success": true,
        "base": query.base.unwrap_or_else(|| "USD".to_string()),
        "rates": rates,
    }))
}

/// Daily rates drifting up from 0.90 by 0.001 per day
async fn handle_timeseries(Query(query): Query<RatesQuery>) -> impl IntoResponse {
    let parse = |s: &Option<String>| {
        s.as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    };
    let (Some(start), Some(end)) = (parse(&query.start_date), parse(&query.end_date)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": { "type": "invalid_date_range" } })),
        );
    };

    let symbols = known_symbols(&query);
    let mut rates = serde_json::Map::new();
    let mut day = start;
    let mut i = 0;
    while day <= end {
        let per_symbol: BTreeMap<&str, f64> = symbols
            .iter()
            .map(|s| (s.as_str(), 0.90 + 0.001 * i as f64))
            .collect();
        rates.insert(day.format("%Y-%m-%d").to_string(), json!(per_symbol));
        day += Duration::days(1);
        i += 1;
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "timeseries": true,
            "base": query.base.unwrap_or_else(|| "USD".to_string()),
            "rates": rates,
        })),
    )
}

async fn handle_error() -> Json<Value> {
    Json(json!({
        "success": false,
        "error": {
            "code": 101,
            "type": "invalid_access_key",
            "info": "You have not supplied a valid API Access Key."
        }
    }))
}
