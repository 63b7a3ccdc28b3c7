//! REST API for fleet simulation.
//!
//! Provides endpoints for:
//! - Demo data retrieval
//! - Fleet snapshot load and export
//! - Simulation runs and run history
//! - Dashboard summary and CSV report
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::assignment::UnassignedReason;
use crate::config::{SimulationPolicy, TrafficFactors};
use crate::demo_data::{generate_by_name, list_demo_data as demo_data_names};
use crate::dto::{
    ChartPointDto, DashboardDto, DriverAssignmentDto, DriverDto, FleetDto, OrderDto,
    PerformanceMetricsDto, RouteDto, RouteFuelCostDto, SimulationRecordDto, SimulationRequestDto,
    SimulationResultDto, UnassignedOrderDto,
};
use crate::error::SimulationError;
use crate::simulation::SimulationService;
use crate::store::InMemoryFleetStore;

/// Response header carrying the id of a finished run.
pub const SIMULATION_ID_HEADER: &str = "x-simulation-id";

/// Application state shared across handlers.
pub struct AppState {
    pub fleet: Arc<InMemoryFleetStore>,
    pub simulations: SimulationService,
}

impl AppState {
    /// Creates state with an empty fleet.
    pub fn new(policy: SimulationPolicy) -> Self {
        Self::with_store(Arc::new(InMemoryFleetStore::new()), policy)
    }

    pub fn with_store(fleet: Arc<InMemoryFleetStore>, policy: SimulationPolicy) -> Self {
        Self {
            simulations: SimulationService::new(fleet.clone(), policy),
            fleet,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SimulationPolicy::default())
    }
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::HeaderName::from_static(SIMULATION_ID_HEADER)]);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{name}", get(get_demo_data))
        // Fleet
        .route("/fleet", get(get_fleet).put(replace_fleet))
        // Simulations
        .route("/simulations", get(list_simulations).post(run_simulation))
        .route("/simulations/{id}", get(get_simulation))
        // Dashboard
        .route("/dashboard", get(dashboard))
        .route("/dashboard/report.csv", get(dashboard_report))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Body of a rejected request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable code such as `INVALID_CAPACITY`.
    pub error: String,
    pub message: String,
}

impl IntoResponse for SimulationError {
    fn into_response(self) -> Response {
        warn!(code = self.code(), error = %self, "Request rejected");
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    /// Assignment strategy used by the engine.
    pub engine: &'static str,
    pub policy: SimulationPolicy,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Fleet Simulation",
        version: env!("CARGO_PKG_VERSION"),
        engine: "greedy value-first, capacity-first",
        policy: state.simulations.policy().clone(),
    })
}

// ============================================================================
// Demo Data
// ============================================================================

/// GET /demo-data - List available demo datasets.
#[utoipa::path(
    get,
    path = "/demo-data",
    responses((status = 200, description = "List of demo dataset names", body = Vec<String>))
)]
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data_names())
}

/// GET /demo-data/{name} - Get a specific demo fleet.
#[utoipa::path(
    get,
    path = "/demo-data/{name}",
    params(("name" = String, Path, description = "Demo dataset name")),
    responses(
        (status = 200, description = "Demo fleet", body = FleetDto),
        (status = 404, description = "Dataset not found")
    )
)]
async fn get_demo_data(Path(name): Path<String>) -> Result<Json<FleetDto>, StatusCode> {
    match generate_by_name(&name) {
        Some(fleet) => Ok(Json(FleetDto::from_snapshot(&fleet))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Fleet
// ============================================================================

/// GET /fleet - Every stored driver, route and order.
#[utoipa::path(
    get,
    path = "/fleet",
    responses((status = 200, description = "Current fleet", body = FleetDto))
)]
async fn get_fleet(State(state): State<Arc<AppState>>) -> Json<FleetDto> {
    Json(FleetDto::from_snapshot(&state.fleet.all()))
}

/// PUT /fleet - Replace the whole fleet.
#[utoipa::path(
    put,
    path = "/fleet",
    request_body = FleetDto,
    responses(
        (status = 200, description = "Fleet replaced", body = FleetDto),
        (status = 422, description = "A record is invalid", body = ErrorResponse)
    )
)]
async fn replace_fleet(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<FleetDto>,
) -> Result<Json<FleetDto>, SimulationError> {
    state.fleet.replace(dto.to_domain()?)?;
    Ok(Json(FleetDto::from_snapshot(&state.fleet.all())))
}

// ============================================================================
// Simulations
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RunParams {
    #[serde(default)]
    commit: bool,
}

/// POST /simulations - Run a simulation over the current fleet.
///
/// The run id is returned in the `x-simulation-id` header.
#[utoipa::path(
    post,
    path = "/simulations",
    params(("commit" = Option<bool>, Query, description = "Write assignments back to the fleet")),
    request_body = SimulationRequestDto,
    responses(
        (status = 200, description = "Simulation result", body = SimulationResultDto),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
async fn run_simulation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunParams>,
    Json(dto): Json<SimulationRequestDto>,
) -> Response {
    let request = match dto.to_domain() {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    let worker = state.clone();
    let run = tokio::task::spawn_blocking(move || worker.simulations.run(request, params.commit)).await;

    match run {
        Ok(Ok(record)) => (
            [(SIMULATION_ID_HEADER, record.id.clone())],
            Json(SimulationResultDto::from_result(&record.result)),
        )
            .into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!(error = %err, "Simulation task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /simulations - List stored run IDs, newest first.
#[utoipa::path(
    get,
    path = "/simulations",
    responses((status = 200, description = "List of run IDs", body = Vec<String>))
)]
async fn list_simulations(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(
        state
            .simulations
            .list_runs()
            .iter()
            .map(|record| record.id.clone())
            .collect(),
    )
}

/// GET /simulations/{id} - Get a stored run.
#[utoipa::path(
    get,
    path = "/simulations/{id}",
    params(("id" = String, Path, description = "Simulation ID")),
    responses(
        (status = 200, description = "Stored run", body = SimulationRecordDto),
        (status = 404, description = "Not found")
    )
)]
async fn get_simulation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SimulationRecordDto>, StatusCode> {
    match state.simulations.get_run(&id) {
        Some(record) => Ok(Json(SimulationRecordDto::from_record(&record))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /dashboard - Summary of the latest run.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard summary", body = DashboardDto))
)]
async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardDto> {
    let latest = state.simulations.latest();
    Json(DashboardDto::from_record(latest.as_deref()))
}

/// GET /dashboard/report.csv - Dashboard summary as CSV.
#[utoipa::path(
    get,
    path = "/dashboard/report.csv",
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = String),
        (status = 500, description = "Report could not be written")
    )
)]
async fn dashboard_report(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, StatusCode> {
    let latest = state.simulations.latest();
    let csv = DashboardDto::from_record(latest.as_deref())
        .to_csv()
        .map_err(|err| {
            error!(error = %err, "CSV report failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"dashboard-report.csv\"",
            ),
        ],
        csv,
    ))
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        list_demo_data,
        get_demo_data,
        get_fleet,
        replace_fleet,
        run_simulation,
        list_simulations,
        get_simulation,
        dashboard,
        dashboard_report,
    ),
    components(schemas(
        HealthResponse,
        InfoResponse,
        ErrorResponse,
        SimulationPolicy,
        TrafficFactors,
        DriverDto,
        RouteDto,
        OrderDto,
        FleetDto,
        SimulationRequestDto,
        SimulationResultDto,
        RouteFuelCostDto,
        DriverAssignmentDto,
        PerformanceMetricsDto,
        UnassignedOrderDto,
        UnassignedReason,
        SimulationRecordDto,
        DashboardDto,
        ChartPointDto,
    ))
)]
struct ApiDoc;
