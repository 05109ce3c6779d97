//! REST API for the cartonization service.
//!
//! Wraps the engine in HTTP endpoints. Uses Axum as the web framework and
//! supports CORS and request tracing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, EngineConfig};
use crate::diagnostics::DiagnosticEvent;
use crate::engine::CartonizationEngine;
use crate::error::ValidationError;
use crate::model::{ContainerType, FragilityTier, Item, ShippingBox, validate_boxes, validate_items};
use crate::packer::{PackedItem, PackingFailure, PackingResult};
use crate::params::{CartonizationParams, CartonizeOptions, OptimizationObjective};
use crate::recommendation::{
    BoxAlternative, Cartonization, CartonizationResult, MultiPackageCartonizationResult,
    PackageRecommendation, PackingSolution, SplittingStrategy,
};
use crate::types::Vec3;

#[derive(Clone)]
struct ApiState {
    engine_config: EngineConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>cartonizer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the cartonization endpoints.
///
/// `parameters` overrides the service defaults for this call only.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "id": "mug", "name": "Mug", "length": 10.0, "width": 8.0, "height": 6.0,
              "weight": 5.0, "quantity": 1 }
        ],
        "boxes": [
            { "id": "A", "name": "Small", "length": 12.0, "width": 10.0, "height": 8.0,
              "max_weight": 50.0, "cost": 1.0, "in_stock": 10 }
        ],
        "enable_multi_package": false,
        "objective": "balanced"
    })
)]
pub struct CartonizeRequest {
    pub items: Vec<Item>,
    pub boxes: Vec<ShippingBox>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub parameters: Option<CartonizationParams>,
    #[serde(default)]
    pub enable_multi_package: bool,
    #[serde(default)]
    pub objective: OptimizationObjective,
}

/// Request structure for the multi-package endpoint.
#[derive(Deserialize, ToSchema)]
pub struct MultiPackageRequest {
    pub items: Vec<Item>,
    pub boxes: Vec<ShippingBox>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub parameters: Option<CartonizationParams>,
    #[serde(default)]
    pub objective: OptimizationObjective,
}

impl From<MultiPackageRequest> for CartonizeRequest {
    fn from(request: MultiPackageRequest) -> Self {
        Self {
            items: request.items,
            boxes: request.boxes,
            parameters: request.parameters,
            enable_multi_package: true,
            objective: request.objective,
        }
    }
}

#[derive(Debug)]
struct ValidatedCartonizeRequest {
    items: Vec<Item>,
    engine: CartonizationEngine,
    options: CartonizeOptions,
}

#[derive(Debug)]
enum CartonizeRequestValidationError {
    MissingItems,
    MissingBoxes,
    InvalidItem(ValidationError),
    InvalidBox(ValidationError),
    InvalidParameters(ValidationError),
}

impl CartonizeRequest {
    fn into_validated(
        self,
        defaults: CartonizationParams,
    ) -> Result<ValidatedCartonizeRequest, CartonizeRequestValidationError> {
        if self.items.is_empty() {
            return Err(CartonizeRequestValidationError::MissingItems);
        }
        if self.boxes.is_empty() {
            return Err(CartonizeRequestValidationError::MissingBoxes);
        }
        validate_items(&self.items).map_err(CartonizeRequestValidationError::InvalidItem)?;
        validate_boxes(&self.boxes).map_err(CartonizeRequestValidationError::InvalidBox)?;

        let params = self.parameters.unwrap_or(defaults);
        params
            .validate()
            .map_err(CartonizeRequestValidationError::InvalidParameters)?;

        Ok(ValidatedCartonizeRequest {
            items: self.items,
            engine: CartonizationEngine::new(&self.boxes, params),
            options: CartonizeOptions {
                enable_multi_package: self.enable_multi_package,
                objective: self.objective,
            },
        })
    }
}

/// Response of `POST /cartonize`.
#[derive(Serialize, ToSchema)]
pub struct CartonizeResponse {
    pub result: Cartonization,
    pub diagnostics: Vec<DiagnosticEvent>,
}

/// Response of `POST /cartonize/multi`.
#[derive(Serialize, ToSchema)]
pub struct MultiPackageResponse {
    pub result: MultiPackageCartonizationResult,
    pub diagnostics: Vec<DiagnosticEvent>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn box_catalog_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid box catalog",
        details,
    )
}

fn no_viable_packaging() -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "No viable packaging found",
        "No single box or multi-package split can hold the items",
    )
}

fn validate_request(
    request: CartonizeRequest,
    defaults: CartonizationParams,
) -> Result<ValidatedCartonizeRequest, Response> {
    match request.into_validated(defaults) {
        Ok(validated) => Ok(validated),
        Err(CartonizeRequestValidationError::MissingItems) => {
            Err(validation_error("At least one item must be specified"))
        }
        Err(CartonizeRequestValidationError::MissingBoxes) => {
            Err(box_catalog_error("At least one box must be specified"))
        }
        Err(CartonizeRequestValidationError::InvalidItem(err)) => {
            Err(validation_error(err.to_string()))
        }
        Err(CartonizeRequestValidationError::InvalidBox(err)) => {
            Err(box_catalog_error(err.to_string()))
        }
        Err(CartonizeRequestValidationError::InvalidParameters(err)) => {
            Err(validation_error(err.to_string()))
        }
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

fn run_cartonize(request: ValidatedCartonizeRequest) -> Option<CartonizeResponse> {
    let mut diagnostics: Vec<DiagnosticEvent> = Vec::new();
    let result = request.engine.cartonize_with_diagnostics(
        &request.items,
        request.options,
        &mut diagnostics,
    )?;
    Some(CartonizeResponse {
        result,
        diagnostics,
    })
}

fn run_split(request: ValidatedCartonizeRequest) -> Option<MultiPackageResponse> {
    let mut diagnostics: Vec<DiagnosticEvent> = Vec::new();
    let result = request.engine.split_and_pack_with_diagnostics(
        &request.items,
        request.options.objective,
        &mut diagnostics,
    )?;
    Some(MultiPackageResponse {
        result,
        diagnostics,
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_cartonize, handle_cartonize_multi, handle_cartonize_stream, handle_health),
    components(
        schemas(
            CartonizeRequest,
            MultiPackageRequest,
            CartonizeResponse,
            MultiPackageResponse,
            HealthResponse,
            ErrorResponse,
            Item,
            ShippingBox,
            FragilityTier,
            ContainerType,
            CartonizationParams,
            OptimizationObjective,
            Cartonization,
            CartonizationResult,
            MultiPackageCartonizationResult,
            PackageRecommendation,
            PackingSolution,
            BoxAlternative,
            SplittingStrategy,
            PackingResult,
            PackedItem,
            PackingFailure,
            Vec3,
            DiagnosticEvent
        )
    ),
    tags((name = "cartonization", description = "Endpoints for box selection and splitting"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cartonize", post(handle_cartonize))
        .route("/cartonize/multi", post(handle_cartonize_multi))
        .route("/cartonize_stream", post(handle_cartonize_stream))
        .route("/health", get(handle_health))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
///
/// Returns an error when the listener cannot be bound or the server fails.
pub async fn start_api_server(
    config: ApiConfig,
    engine_config: EngineConfig,
) -> std::io::Result<()> {
    let app = router(ApiState { engine_config });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("local access: http://localhost:{}", config.port());
    }
    tracing::info!(
        "endpoints: POST /cartonize, POST /cartonize/multi, POST /cartonize_stream, GET /health, GET /docs"
    );

    axum::serve(listener, app).await
}

/// Handler for POST /cartonize.
///
/// Runs single-box selection and, when requested or needed, the multi-package
/// splitter, returning the engine's decision with its diagnostics trail.
#[utoipa::path(
    post,
    path = "/cartonize",
    request_body = CartonizeRequest,
    responses(
        (status = 200, description = "Recommended packaging", body = CartonizeResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or no viable packaging",
            body = ErrorResponse
        )
    ),
    tag = "cartonization"
)]
async fn handle_cartonize(
    State(state): State<ApiState>,
    payload: Result<Json<CartonizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload)
        .and_then(|request| validate_request(request, state.engine_config.params()))
    {
        Ok(request) => request,
        Err(response) => return response,
    };

    tracing::info!(
        items = request.items.len(),
        boxes = request.engine.boxes().len(),
        multi = request.options.enable_multi_package,
        "cartonize request"
    );

    match run_cartonize(request) {
        Some(response) => {
            tracing::info!(
                packages = response.result.package_count(),
                confidence = response.result.confidence(),
                "cartonize result"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        None => no_viable_packaging(),
    }
}

/// Handler for POST /cartonize/multi.
///
/// Always runs the multi-package splitter.
#[utoipa::path(
    post,
    path = "/cartonize/multi",
    request_body = MultiPackageRequest,
    responses(
        (status = 200, description = "Best multi-package split", body = MultiPackageResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or no viable split",
            body = ErrorResponse
        )
    ),
    tag = "cartonization"
)]
async fn handle_cartonize_multi(
    State(state): State<ApiState>,
    payload: Result<Json<MultiPackageRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload).and_then(|request| {
        validate_request(request.into(), state.engine_config.params())
    }) {
        Ok(request) => request,
        Err(response) => return response,
    };

    tracing::info!(
        items = request.items.len(),
        objective = request.options.objective.as_str(),
        "multi-package request"
    );

    match run_split(request) {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => no_viable_packaging(),
    }
}

/// Handler for POST /cartonize_stream (SSE).
///
/// Streams diagnostic events as `diagnostic` events while the engine runs,
/// followed by one `result` event (or an `error` event when nothing fits).
#[utoipa::path(
    post,
    path = "/cartonize_stream",
    request_body = CartonizeRequest,
    responses(
        (
            status = 200,
            description = "Streams diagnostic events and the final result",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request",
            body = ErrorResponse
        )
    ),
    tag = "cartonization"
)]
async fn handle_cartonize_stream(
    State(state): State<ApiState>,
    payload: Result<Json<CartonizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload)
        .and_then(|request| validate_request(request, state.engine_config.params()))
    {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<Event>(32);

    tokio::task::spawn_blocking(move || {
        let ValidatedCartonizeRequest {
            items,
            engine,
            options,
        } = request;

        let mut forward = |event: &DiagnosticEvent| {
            if let Ok(json) = serde_json::to_string(event) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(Event::default().event("diagnostic").data(json));
            }
        };
        let result = engine.cartonize_with_diagnostics(&items, options, &mut forward);

        let last = match result {
            Some(result) => serde_json::to_string(&result)
                .map(|json| Event::default().event("result").data(json)),
            None => serde_json::to_string(&ErrorResponse::new(
                "No viable packaging found",
                "No single box or multi-package split can hold the items",
            ))
            .map(|json| Event::default().event("error").data(json)),
        };
        match last {
            Ok(event) => {
                let _ = tx.blocking_send(event);
            }
            Err(err) => tracing::warn!("could not serialize final stream event: {}", err),
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for GET /health.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "cartonization"
)]
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
