//! Local holdings editor: a static page plus a small JSON API over the
//! portfolio file and the editable parts of `config.yaml`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{ConfigError, StoreError};
use crate::indicators::pct_change;
use crate::market::{MarketData, Period};
use crate::portfolio::PortfolioStore;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub store: PortfolioStore,
    pub market: Arc<dyn MarketData>,
    pub config_path: PathBuf,
}

/// A holding with its latest price. Price-derived fields are `null` when no
/// quote could be fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub symbol: String,
    pub shares: f64,
    pub avg_cost: f64,
    pub current_price: Option<f64>,
    pub cost_basis: f64,
    pub current_value: Option<f64>,
    pub pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NewHolding {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub avg_cost: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewWatch {
    #[serde(default)]
    pub symbol: String,
}

/// The settings the page can edit. Credentials are deliberately absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
    pub email_from: String,
    pub email_to: String,
    pub hard_stop: f64,
    pub warning: f64,
    pub profit_target: f64,
    pub pullback: f64,
    pub rsi_max: f64,
}

impl From<&AppConfig> for ConfigView {
    fn from(c: &AppConfig) -> Self {
        Self {
            email_from: c.email.from.clone(),
            email_to: c.email.to.clone(),
            hard_stop: c.rules.hard_stop_multiplier,
            warning: c.rules.warning_multiplier,
            profit_target: c.rules.profit_target_multiplier,
            pullback: c.rules.recommendation_pullback_percent,
            rsi_max: c.rules.recommendation_rsi_max,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdate {
    pub email_from: Option<String>,
    pub email_to: Option<String>,
    pub hard_stop: Option<f64>,
    pub warning: Option<f64>,
    pub profit_target: Option<f64>,
    pub pullback: Option<f64>,
    pub rsi_max: Option<f64>,
}

impl ConfigUpdate {
    fn apply(self, config: &mut AppConfig) {
        if let Some(v) = self.email_from {
            config.email.from = v;
        }
        if let Some(v) = self.email_to {
            config.email.to = v;
        }
        if let Some(v) = self.hard_stop {
            config.rules.hard_stop_multiplier = v;
        }
        if let Some(v) = self.warning {
            config.rules.warning_multiplier = v;
        }
        if let Some(v) = self.profit_target {
            config.rules.profit_target_multiplier = v;
        }
        if let Some(v) = self.pullback {
            config.rules.recommendation_pullback_percent = v;
        }
        if let Some(v) = self.rsi_max {
            config.rules.recommendation_rsi_max = v;
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/holdings", get(get_holdings).post(add_holding))
        .route("/api/holdings/{symbol}", delete(delete_holding))
        .route("/api/watchlist", get(get_watchlist).post(add_watch))
        .route("/api/watchlist/{symbol}", delete(delete_watch))
        .route("/api/config", get(get_config).post(update_config))
        .with_state(state)
}

pub async fn run_server(state: AppState, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("🌐 [WEB] Holdings editor listening on http://{}", bind);
    info!("⌨️ [WEB] Press Ctrl+C to stop the server");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("⏹️ [WEB] Server stopped");
        })
        .await
}

fn success() -> Response {
    Json(json!({ "success": true })).into_response()
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "success": false, "error": message.into() }))).into_response()
}

fn store_failure(e: StoreError) -> Response {
    match e {
        StoreError::InvalidSymbol { .. } | StoreError::InvalidHolding { .. } | StoreError::Duplicate { .. } => {
            failure(StatusCode::BAD_REQUEST, e.to_string())
        }
        StoreError::Io { .. } | StoreError::Yaml(_) => {
            error!("❌ [WEB] Portfolio file error: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save")
        }
    }
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Today's last one-minute bar, else the last daily close.
async fn latest_price(market: &dyn MarketData, symbol: &str) -> Option<f64> {
    for period in [Period::Intraday, Period::FiveDays] {
        match market.fetch(symbol, period).await {
            Ok(series) => {
                if let Some(price) = series.last_close() {
                    return Some(price);
                }
            }
            Err(e) => warn!("⚠️ [WEB] {} price ({}): {}", symbol, period.range(), e),
        }
    }
    None
}

pub async fn get_holdings(State(state): State<AppState>) -> Response {
    let portfolio = match state.store.load() {
        Ok(p) => p,
        Err(e) => return store_failure(e),
    };

    let mut views = Vec::with_capacity(portfolio.holdings.len());
    for h in &portfolio.holdings {
        let price = latest_price(state.market.as_ref(), &h.symbol).await;
        let cost_basis = h.cost_basis();
        views.push(HoldingView {
            symbol: h.symbol.clone(),
            shares: h.shares,
            avg_cost: h.avg_cost,
            current_price: price,
            cost_basis,
            current_value: price.map(|p| h.shares * p),
            pnl: price.map(|p| h.shares * p - cost_basis),
            pnl_percent: price.map(|p| pct_change(h.avg_cost, p)),
        });
    }
    Json(views).into_response()
}

pub async fn add_holding(State(state): State<AppState>, Json(body): Json<NewHolding>) -> Response {
    match state.store.add_holding(&body.symbol, body.shares, body.avg_cost) {
        Ok(_) => success(),
        Err(e) => store_failure(e),
    }
}

pub async fn delete_holding(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match state.store.remove_holding(&symbol) {
        Ok(_) => success(),
        Err(e) => store_failure(e),
    }
}

pub async fn get_watchlist(State(state): State<AppState>) -> Response {
    match state.store.load() {
        Ok(p) => Json(p.watchlist).into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn add_watch(State(state): State<AppState>, Json(body): Json<NewWatch>) -> Response {
    match state.store.add_watch(&body.symbol) {
        Ok(_) => success(),
        Err(e) => store_failure(e),
    }
}

pub async fn delete_watch(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match state.store.remove_watch(&symbol) {
        Ok(_) => success(),
        Err(e) => store_failure(e),
    }
}

/// The file as written; a missing file means defaults. Environment secrets
/// are never merged in, so saving cannot leak them to disk.
fn read_config_file(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    AppConfig::read_file(path)
}

pub async fn get_config(State(state): State<AppState>) -> Response {
    match read_config_file(&state.config_path) {
        Ok(config) => Json(ConfigView::from(&config)).into_response(),
        Err(e) => {
            error!("❌ [WEB] Cannot read config: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn update_config(State(state): State<AppState>, Json(update): Json<ConfigUpdate>) -> Response {
    let mut config = match read_config_file(&state.config_path) {
        Ok(c) => c,
        Err(e) => return failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    update.apply(&mut config);

    if let Err(e) = config.validate() {
        return failure(StatusCode::BAD_REQUEST, e.to_string());
    }
    match config.save(&state.config_path) {
        Ok(()) => {
            info!("⚙️ [WEB] Settings saved to {} (restart the bot to apply)", state.config_path.display());
            success()
        }
        Err(e) => {
            error!("❌ [WEB] Cannot save config: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save")
        }
    }
}
