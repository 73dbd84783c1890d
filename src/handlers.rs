// handlers.rs

use crate::{
    commands::DispatchReport,
    docs,
    error::{AppError, ErrorBody},
    models::{AppState, ColorRequest, Device, DeviceState, PowerRequest},
};
use axum::{
    Json, Router,
    extract::{FromRequest, Path, Request, State, rejection::JsonRejection},
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/color", post(set_color))
        .route("/api/power", post(set_power))
        .route("/api/devices", get(list_devices))
        .route("/api/device/{id}", get(get_device))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", docs::ApiDoc::openapi()))
        .layer(cors())
        .with_state(state)
}

// Credentials cannot be combined with a literal `*`, so the caller's origin is echoed back.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
        ])
}

/// `Json` whose rejections (bad syntax, wrongly typed fields) become [`AppError`] bodies.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

#[utoipa::path(
    post,
    path = "/api/color",
    request_body = ColorRequest,
    responses(
        (status = 200, description = "Every targeted device accepted the color", body = DispatchReport),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "One or more devices failed", body = ErrorBody),
    )
)]
pub async fn set_color(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<ColorRequest>,
) -> Result<Json<DispatchReport>, AppError> {
    let action = request.action()?;
    let snapshot = state.registry.current_snapshot();
    let targets = request.filter().select(&snapshot.devices);

    state.dispatcher.dispatch(targets, action).await.into_result().map(Json)
}

#[utoipa::path(
    post,
    path = "/api/power",
    request_body = PowerRequest,
    responses(
        (status = 200, description = "Every targeted device accepted the power state", body = DispatchReport),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "One or more devices failed", body = ErrorBody),
    )
)]
pub async fn set_power(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<PowerRequest>,
) -> Result<Json<DispatchReport>, AppError> {
    let action = request.action()?;
    let snapshot = state.registry.current_snapshot();
    let targets = request.filter().select(&snapshot.devices);

    state.dispatcher.dispatch(targets, action).await.into_result().map(Json)
}

#[utoipa::path(
    get,
    path = "/api/devices",
    responses((status = 200, description = "Current device inventory", body = [Device]))
)]
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<Device>> {
    Json(state.query.list_devices())
}

#[utoipa::path(
    get,
    path = "/api/device/{id}",
    params(("id" = String, Path, description = "Device id reported by discovery")),
    responses(
        (status = 200, description = "Live device state", body = DeviceState),
        (status = 404, description = "No such device", body = ErrorBody),
        (status = 502, description = "Device did not answer", body = ErrorBody),
    )
)]
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceState>, AppError> {
    state.query.get_device_state(&id).await.map(Json)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub device_count: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.registry.current_snapshot();
    Json(HealthResponse {
        status: "ok",
        device_count: snapshot.devices.len(),
        last_refresh: snapshot.refreshed_at,
    })
}
