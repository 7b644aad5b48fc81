mod payload;

use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_EARLY_YEARS, ProjectionInput, calculate_spending_comparison,
    check_projection_staleness, generate_warnings, run_projection, run_sensitivity_analysis,
};

pub use payload::{
    LegacyDebt, LegacyProfile, PayloadError, ScenarioPayload, ValidationError, load_scenario,
    normalize, parse_scenario, validate,
};

#[derive(Parser, Debug)]
#[command(
    name = "runway",
    about = "Deterministic household retirement projections (accumulation, drawdown, RMDs, reserve floor)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one analysis over a scenario file and print JSON.
    Project {
        #[arg(long, help = "Path to a scenario JSON file")]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = Analysis::Projection)]
        analysis: Analysis,
        #[arg(
            long,
            default_value_t = DEFAULT_EARLY_YEARS,
            help = "Retirement years counted as early in the spending comparison"
        )]
        early_years: u32,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Analysis {
    Projection,
    Sensitivity,
    Comparison,
    Warnings,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("could not encode output: {0}")]
    Encode(serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonRequest {
    scenario: ScenarioPayload,
    #[serde(default)]
    early_years: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StalenessRequest {
    stored: ScenarioPayload,
    fresh: ScenarioPayload,
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port } => Ok(run_http_server(port).await?),
        Command::Project {
            input,
            analysis,
            early_years,
        } => {
            let output = run_project(&input, analysis, early_years)?;
            println!("{output}");
            Ok(())
        }
    }
}

/// Loads a scenario file and renders the chosen analysis as pretty JSON.
pub fn run_project(path: &Path, analysis: Analysis, early_years: u32) -> Result<String, CliError> {
    let input = load_scenario(path)?;
    log::info!(
        "running {analysis:?} for ages {}..={}",
        input.current_age,
        input.max_age
    );
    let rendered = match analysis {
        Analysis::Projection => serde_json::to_string_pretty(&run_projection(&input)),
        Analysis::Sensitivity => serde_json::to_string_pretty(&run_sensitivity_analysis(&input)),
        Analysis::Comparison => {
            serde_json::to_string_pretty(&calculate_spending_comparison(&input, early_years))
        }
        Analysis::Warnings => serde_json::to_string_pretty(&generate_warnings(&input)),
    };
    rendered.map_err(CliError::Encode)
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/sensitivity", post(sensitivity_handler))
        .route("/api/spending-comparison", post(comparison_handler))
        .route("/api/staleness", post(staleness_handler))
        .route("/api/warnings", post(warnings_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("runway HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    with_scenario(payload, run_projection)
}

async fn sensitivity_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    with_scenario(payload, run_sensitivity_analysis)
}

async fn warnings_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    with_scenario(payload, generate_warnings)
}

async fn comparison_handler(payload: Result<Json<ComparisonRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let early_years = request.early_years.unwrap_or(DEFAULT_EARLY_YEARS);
    match normalize(request.scenario) {
        Ok(input) => json_response(
            StatusCode::OK,
            calculate_spending_comparison(&input, early_years),
        ),
        Err(err) => validation_response(err),
    }
}

async fn staleness_handler(payload: Result<Json<StalenessRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let stored = match normalize(request.stored) {
        Ok(input) => input,
        Err(err) => return validation_response(err),
    };
    let fresh = match normalize(request.fresh) {
        Ok(input) => input,
        Err(err) => return validation_response(err),
    };
    json_response(StatusCode::OK, check_projection_staleness(&stored, &fresh))
}

fn with_scenario<T, F>(payload: Result<Json<ScenarioPayload>, JsonRejection>, analyse: F) -> Response
where
    T: Serialize,
    F: FnOnce(&ProjectionInput) -> T,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match normalize(payload) {
        Ok(input) => json_response(StatusCode::OK, analyse(&input)),
        Err(err) => validation_response(err),
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    log::warn!("rejected request body: {rejection}");
    error_response(StatusCode::BAD_REQUEST, &rejection.body_text())
}

fn validation_response(err: ValidationError) -> Response {
    log::warn!("rejected scenario: {err}");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
