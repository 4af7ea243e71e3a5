//! Dashboard API Routes
//!
//! Overview, screened growers, watchlist, signals and per-ticker detail.
//! A table that has not been written yet reads as empty.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use output_store::DASHBOARD_TABLES;
use screener_core::{normalize_ticker, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::views::{
    filter_in, filter_screened, find_ticker, mean, parse_list, revenue_bars, ticker_list,
    value_counts, CountEntry, RevenueBar, ScreenedFilter, Tables,
};
use crate::{ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub output_dir: String,
}

#[derive(Serialize)]
pub struct FileStatus {
    pub name: &'static str,
    pub present: bool,
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub screened: usize,
    pub watchlist: usize,
    pub signals: usize,
    pub avg_trailing_pe: Option<f64>,
    pub recommendations: Vec<CountEntry>,
    pub sectors: Vec<CountEntry>,
}

/// Column names plus one JSON object per row.
#[derive(Serialize)]
pub struct TableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl TableResponse {
    fn from_table(table: Option<&Table>) -> Self {
        match table {
            Some(t) => Self {
                columns: t.headers().to_vec(),
                rows: t.to_json_rows(),
            },
            None => Self {
                columns: Vec::new(),
                rows: Vec::new(),
            },
        }
    }
}

#[derive(Deserialize)]
pub struct SectorQuery {
    pub sector: Option<String>,
}

#[derive(Deserialize)]
pub struct SignalsQuery {
    pub recommendation: Option<String>,
    pub sector: Option<String>,
}

#[derive(Serialize)]
pub struct TickerDetail {
    pub ticker: String,
    pub snapshot: Option<Value>,
    pub recommendation: Option<String>,
    pub rev_flag: Option<String>,
    pub revenue: Vec<RevenueBar>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/files", get(files))
        .route("/api/overview", get(overview))
        .route("/api/screened", get(screened))
        .route("/api/watchlist", get(watchlist))
        .route("/api/signals", get(signals))
        .route("/api/tickers", get(tickers))
        .route("/api/ticker/:symbol", get(ticker_detail))
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        output_dir: state.store.dir().display().to_string(),
    }))
}

async fn files(State(state): State<AppState>) -> Json<ApiResponse<Vec<FileStatus>>> {
    let status = DASHBOARD_TABLES
        .iter()
        .map(|&name| FileStatus {
            name,
            present: state.store.exists(name),
        })
        .collect();
    Json(ApiResponse::success(status))
}

async fn overview(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OverviewResponse>>, AppError> {
    let tables = Tables::load(&state.store)?;
    let screened = tables.screened();

    Ok(Json(ApiResponse::success(OverviewResponse {
        screened: screened.as_ref().map_or(0, Table::len),
        watchlist: tables.watchlist.as_ref().map_or(0, Table::len),
        signals: tables.signals.as_ref().map_or(0, Table::len),
        avg_trailing_pe: screened.as_ref().and_then(|t| mean(t, "trailing_PE")),
        recommendations: tables
            .signals
            .as_ref()
            .map(|t| value_counts(t, "final_recommendation"))
            .unwrap_or_default(),
        sectors: tables
            .watchlist
            .as_ref()
            .map(|t| value_counts(t, "sector"))
            .unwrap_or_default(),
    })))
}

async fn screened(
    State(state): State<AppState>,
    Query(filter): Query<ScreenedFilter>,
) -> Result<Json<ApiResponse<TableResponse>>, AppError> {
    let tables = Tables::load(&state.store)?;
    let view = tables.screened().map(|t| filter_screened(&t, &filter));
    Ok(Json(ApiResponse::success(TableResponse::from_table(view.as_ref()))))
}

async fn watchlist(
    State(state): State<AppState>,
    Query(query): Query<SectorQuery>,
) -> Result<Json<ApiResponse<TableResponse>>, AppError> {
    let tables = Tables::load(&state.store)?;
    let sectors = parse_list(query.sector.as_deref());
    let view = tables.watchlist.map(|t| filter_in(&t, "sector", &sectors));
    Ok(Json(ApiResponse::success(TableResponse::from_table(view.as_ref()))))
}

async fn signals(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<ApiResponse<TableResponse>>, AppError> {
    let tables = Tables::load(&state.store)?;
    let recommendations = parse_list(query.recommendation.as_deref());
    let sectors = parse_list(query.sector.as_deref());
    let view = tables.signals.map(|t| {
        let t = filter_in(&t, "final_recommendation", &recommendations);
        filter_in(&t, "sector", &sectors)
    });
    Ok(Json(ApiResponse::success(TableResponse::from_table(view.as_ref()))))
}

async fn tickers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let tables = Tables::load(&state.store)?;
    let screened = tables.screened();
    Ok(Json(ApiResponse::success(ticker_list(
        tables.signals.as_ref(),
        screened.as_ref(),
    ))))
}

async fn ticker_detail(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<TickerDetail>>, AppError> {
    let ticker = normalize_ticker(&symbol);
    let tables = Tables::load(&state.store)?;
    let screened = tables.screened();

    let signal_row = tables.signals.as_ref().and_then(|t| find_ticker(t, &ticker));
    let watch_row = tables.watchlist.as_ref().and_then(|t| find_ticker(t, &ticker));
    let screened_row = screened
        .as_ref()
        .and_then(|t| find_ticker(t, &ticker).map(|r| (t, r)));

    let snapshot = signal_row
        .or(watch_row)
        .or(screened_row.map(|(_, r)| r))
        .map(|r| r.to_json());
    let Some(snapshot) = snapshot else {
        return Err(AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("no data for ticker {}", ticker),
        ));
    };

    Ok(Json(ApiResponse::success(TickerDetail {
        recommendation: signal_row
            .and_then(|r| r.get("final_recommendation"))
            .map(str::to_string),
        rev_flag: signal_row.and_then(|r| r.get("rev_flag")).map(str::to_string),
        revenue: screened_row
            .map(|(t, r)| revenue_bars(t, &r))
            .unwrap_or_default(),
        snapshot: Some(snapshot),
        ticker,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use axum::body::Body;
    use axum::http::Request;
    use output_store::{OutputStore, REVENUE_SCREENED, WATCHLIST_SIGNALS, WATCHLIST_SNAPSHOT};
    use tower::ServiceExt;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn seeded_store(dir: &std::path::Path) -> OutputStore {
        let store = OutputStore::open(dir).unwrap();

        let mut screened = Table::new(["ticker", "cik", "name", "Q1", "Q2", "Q3", "Q4"]);
        screened.push_row(vec![cell("MSFT"), cell("0000789019"), cell("Microsoft"), cell("4"), cell("3"), cell("2"), cell("1")]);
        store.write_table(REVENUE_SCREENED, &screened).unwrap();

        let mut snapshot = Table::new(["ticker", "name", "sector", "trailing_PE"]);
        snapshot.push_row(vec![cell("MSFT"), cell("Microsoft"), cell("Technology"), cell("10")]);
        snapshot.push_row(vec![cell("XOM"), cell("Exxon"), cell("Energy"), None]);
        store.write_table(WATCHLIST_SNAPSHOT, &snapshot).unwrap();

        let mut signals = Table::new(["ticker", "name", "sector", "rev_flag", "final_recommendation"]);
        signals.push_row(vec![cell("MSFT"), cell("Microsoft"), cell("Technology"), cell("green"), cell("BUY")]);
        signals.push_row(vec![cell("XOM"), cell("Exxon"), cell("Energy"), cell("neutral"), cell("SELL")]);
        store.write_table(WATCHLIST_SIGNALS, &signals).unwrap();
        store
    }

    async fn get_json(store: OutputStore, uri: &str) -> (StatusCode, Value) {
        let app = build_router(AppState { store });
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_tables_are_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::existing(tmp.path());

        let (status, body) = get_json(store.clone(), "/api/signals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rows"], serde_json::json!([]));

        let (_, body) = get_json(store.clone(), "/api/files").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["present"], serde_json::json!(false));

        let (_, body) = get_json(store, "/api/overview").await;
        assert_eq!(body["data"]["screened"], serde_json::json!(0));
        assert!(body["data"]["avg_trailing_pe"].is_null());
    }

    #[tokio::test]
    async fn test_signals_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded_store(tmp.path());
        let (_, body) = get_json(store.clone(), "/api/signals?recommendation=buy,hold").await;
        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ticker"], serde_json::json!("MSFT"));

        let (_, body) = get_json(store, "/api/watchlist?sector=Energy").await;
        assert_eq!(body["data"]["rows"][0]["ticker"], serde_json::json!("XOM"));
    }

    #[tokio::test]
    async fn test_screened_has_trend_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded_store(tmp.path());
        let (_, body) = get_json(store, "/api/screened?only_qoq=true").await;
        let row = &body["data"]["rows"][0];
        assert_eq!(row["QoQ_strict_up"], serde_json::json!(true));
        assert_eq!(row["RevScore"], serde_json::json!(3.0));
        assert_eq!(row["cik"], serde_json::json!("0000789019"));
    }

    #[tokio::test]
    async fn test_ticker_detail() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded_store(tmp.path());
        let (status, body) = get_json(store.clone(), "/api/ticker/msft").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["recommendation"], serde_json::json!("BUY"));
        assert_eq!(body["data"]["rev_flag"], serde_json::json!("green"));
        assert_eq!(body["data"]["revenue"][0]["quarter"], serde_json::json!("Q4"));

        let (status, body) = get_json(store, "/api/ticker/ZZZZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_tickers_prefer_signals() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded_store(tmp.path());
        let (_, body) = get_json(store, "/api/tickers").await;
        assert_eq!(body["data"], serde_json::json!(["MSFT", "XOM"]));
    }
}
