use utoipa::OpenApi;
use crate::{commands, error, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::set_color,
        handlers::set_power,
        handlers::list_devices,
        handlers::get_device,
        handlers::health,
    ),
    components(
        schemas(
            models::Device,
            models::DeviceState,
            models::Rgb,
            models::ColorRequest,
            models::PowerRequest,
            commands::DispatchReport,
            commands::DeviceFailure,
            error::ErrorBody,
            handlers::HealthResponse,
        )
    )
)]
pub struct ApiDoc;
