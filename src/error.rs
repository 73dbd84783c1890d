// error.rs
use crate::{commands::DeviceFailure, devices::ControlError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Couldn't parse color: {0}")]
    InvalidColorFormat(String),
    #[error("Color must be of type string (hex) or number (decimal)")]
    UnsupportedColorType,
    #[error("{0} must be defined")]
    MissingRequiredField(&'static str),
    #[error("Power value must be boolean")]
    InvalidPowerType,
    #[error("No device with id {0} was found")]
    DeviceNotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{} of {attempted} devices failed: {}", .failures.len(), summarize(.failures))]
    DispatchPartialFailure {
        attempted: usize,
        failures: Vec<DeviceFailure>,
    },
    #[error("All {attempted} devices failed: {}", summarize(.failures))]
    DispatchTotalFailure {
        attempted: usize,
        failures: Vec<DeviceFailure>,
    },
    #[error("Device control failed: {0}")]
    Controller(#[from] ControlError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

fn summarize(failures: &[DeviceFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({}): {}", f.device_id, f.address, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{field} {message}"),
                    None => format!("{field} is invalid ({})", e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidColorFormat(_)
            | AppError::UnsupportedColorType
            | AppError::MissingRequiredField(_)
            | AppError::InvalidPowerType
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Controller(_) => StatusCode::BAD_GATEWAY,
            AppError::DispatchPartialFailure { .. }
            | AppError::DispatchTotalFailure { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidColorFormat(_) => "invalid_color_format",
            AppError::UnsupportedColorType => "unsupported_color_type",
            AppError::MissingRequiredField(_) => "missing_required_field",
            AppError::InvalidPowerType => "invalid_power_type",
            AppError::DeviceNotFound(_) => "device_not_found",
            AppError::Validation(_) => "validation",
            AppError::DispatchPartialFailure { .. } => "dispatch_partial_failure",
            AppError::DispatchTotalFailure { .. } => "dispatch_total_failure",
            AppError::Controller(_) => "controller",
            AppError::Internal(_) => "internal",
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<DeviceFailure>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(ref e) = self {
            tracing::error!("Internal error: {:#}", e);
        }

        let status = self.status_code();
        let failures = match &self {
            AppError::DispatchPartialFailure { failures, .. }
            | AppError::DispatchTotalFailure { failures, .. } => Some(failures.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            failures,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(id: &str) -> DeviceFailure {
        DeviceFailure {
            device_id: id.into(),
            address: format!("10.0.0.{}", id.len()),
            error: "connection refused".into(),
        }
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(
            AppError::InvalidColorFormat("zzz".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MissingRequiredField("Color").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidPowerType.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let e = AppError::DeviceNotFound("abc".into());
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "No device with id abc was found");
    }

    #[test]
    fn partial_failure_message_names_every_device() {
        let e = AppError::DispatchPartialFailure {
            attempted: 3,
            failures: vec![failure("a"), failure("bb")],
        };
        let message = e.to_string();
        assert!(message.starts_with("2 of 3 devices failed"));
        assert!(message.contains("a (10.0.0.1)"));
        assert!(message.contains("bb (10.0.0.2)"));
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validator_errors_read_as_sentences() {
        let mut errors = validator::ValidationErrors::new();
        let mut range = validator::ValidationError::new("range");
        range.message = Some("must be between 0 and 100".into());
        errors.add("brightness", range);
        errors.add("id", validator::ValidationError::new("length"));

        let e = AppError::from(errors);
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            e.to_string(),
            "Validation error: brightness must be between 0 and 100; id is invalid (length)"
        );
    }

    #[test]
    fn missing_field_message() {
        assert_eq!(
            AppError::MissingRequiredField("Power state").to_string(),
            "Power state must be defined"
        );
    }
}
