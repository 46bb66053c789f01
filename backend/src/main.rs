//! Dashboard host: serves the shell page, tab content, and the chart
//! callback endpoints (generate, linked selection, violin scope).

use std::env;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chart_builder::{ChartId, ChartInputs, ChartSet, SelectionUpdate};
use data_access::{DataError, Database, LocationScope};
use turbine_core::RowTag;

mod tabs;

const BIND_ADDR_ENV: &str = "BIND_ADDR";
const STATIC_DIR_ENV: &str = "STATIC_DIR";

#[derive(Clone)]
struct ServerState {
    db: Database,
    /// Chart set of the most recent generate action. `None` until the first
    /// generate: the charts endpoint serves placeholders until then.
    charts: Arc<Mutex<Option<ChartSet>>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db = Database::from_env().context("database configuration")?;
    let state = ServerState {
        db,
        charts: Arc::new(Mutex::new(None)),
    };

    let static_dir = env::var(STATIC_DIR_ENV).unwrap_or_else(|_| "static".to_string());

    let app = Router::new()
        .route("/api/tabs", get(tab_index_handler))
        .route("/api/tabs/:id", get(tab_content_handler))
        .route("/api/charts", get(charts_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/selection", post(selection_handler))
        .route("/api/violin", post(violin_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state);

    let addr = env::var(BIND_ADDR_ENV).unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "dashboard listening");
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

async fn tab_index_handler() -> Json<Vec<tabs::TabMeta>> {
    Json(tabs::tab_index())
}

async fn tab_content_handler(Path(id): Path<String>) -> impl IntoResponse {
    match id.parse::<tabs::TabId>() {
        Ok(tab) => Json(tabs::tab_content(tab)).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown tab id" })),
        )
            .into_response(),
    }
}

/// Cached chart set, or all-empty placeholders before the first generate.
async fn charts_handler(State(state): State<ServerState>) -> Json<ChartSet> {
    let cached = state.charts.lock().unwrap().clone();
    Json(cached.unwrap_or_else(ChartSet::placeholder))
}

/// Run all chart queries, rebuild the whole set, cache it, return it.
async fn generate_handler(State(state): State<ServerState>) -> Json<ChartSet> {
    let set = build_chart_set(&state.db).await;
    *state.charts.lock().unwrap() = Some(set.clone());
    Json(set)
}

#[derive(Debug, Deserialize)]
struct SelectionParams {
    /// Tags recovered from a point-selection event. `None` means no
    /// selection is active, which resolves to the full tag set; an empty
    /// list is a real (empty) selection.
    points: Option<Vec<RowTag>>,
}

async fn selection_handler(
    State(state): State<ServerState>,
    Json(params): Json<SelectionParams>,
) -> Json<SelectionUpdate> {
    let set = state
        .charts
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(ChartSet::placeholder);
    let tags = params.points.unwrap_or_else(|| set.linked_tags());
    Json(set.apply_selection(&tags))
}

#[derive(Debug, Deserialize)]
struct ViolinParams {
    scope: String,
}

/// Radio event: re-fetch the violin's query variant and rebuild the figure.
async fn violin_handler(
    State(state): State<ServerState>,
    Json(params): Json<ViolinParams>,
) -> impl IntoResponse {
    let Ok(scope) = params.scope.parse::<LocationScope>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown location scope" })),
        )
            .into_response();
    };
    let rows = rows_or_empty(
        state.db.efficiency_join(scope).await,
        ChartId::EfficiencyViolin,
    );
    Json(ChartSet::scoped_violin(&rows)).into_response()
}

async fn build_chart_set(db: &Database) -> ChartSet {
    // One query per chart. A failed query degrades to an empty row set so
    // the dashboard still renders; the warning below is what separates
    // "query failed" from "query matched nothing" in operation.
    let inputs = ChartInputs {
        spans: rows_or_empty(db.turbine_spans().await, ChartId::ActiveTurbines),
        production: rows_or_empty(db.production_readings().await, ChartId::PowerProduction),
        dimensions: rows_or_empty(db.dimension_samples().await, ChartId::HubRot),
        sizes: rows_or_empty(db.size_samples().await, ChartId::CapRotHub),
        efficiency: rows_or_empty(db.efficiency_samples().await, ChartId::EfficiencyHist),
        joined: rows_or_empty(
            db.efficiency_join(LocationScope::All).await,
            ChartId::CapacityEfficiency,
        ),
        survey: rows_or_empty(db.survey_rows().await, ChartId::Map),
    };
    ChartSet::build(inputs)
}

fn rows_or_empty<T>(result: Result<Vec<T>, DataError>, chart: ChartId) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(err) => {
            warn!(chart = chart.as_str(), %err, "query failed; rendering an empty chart");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_fetch_degrades_to_empty_rows() {
        let rows: Vec<turbine_core::TurbineSpan> = rows_or_empty(
            Err(DataError::MissingConfig("DATABASE_URL")),
            ChartId::ActiveTurbines,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn selection_params_accept_missing_and_empty_points() {
        let none: SelectionParams = serde_json::from_str("{}").unwrap();
        assert!(none.points.is_none());
        let empty: SelectionParams = serde_json::from_str(r#"{"points": []}"#).unwrap();
        assert_eq!(empty.points, Some(vec![]));
        let some: SelectionParams = serde_json::from_str(r#"{"points": [3, 1]}"#).unwrap();
        assert_eq!(some.points, Some(vec![3, 1]));
    }
}
