use crate::{
    color::{self, ColorInput},
    commands::{Action, CommandDispatcher},
    devices::DeviceController,
    error::AppError,
    matcher::DeviceFilter,
    query::QueryService,
    registry::DeviceRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use validator::Validate;

/// A light found on the network by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Device {
    pub id: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Live state reported by a device controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceState {
    pub device_type: u8,
    pub on: bool,
    pub mode: u8,
    pub speed: u8,
    pub color: Rgb,
    pub warm_white: u8,
    pub cold_white: u8,
    pub firmware_version: u8,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ColorRequest {
    /// Packed integer (0..=16777215) or hex string ("#0AF", "00AAFF").
    pub color: Option<Value>,
    /// Percentage, 0..=100. Absent means full brightness.
    #[validate(range(max = 100, message = "must be between 0 and 100"))]
    pub brightness: Option<u8>,
    pub id: Option<String>,
    pub address: Option<String>,
}

impl ColorRequest {
    pub fn action(&self) -> Result<Action, AppError> {
        let color = self
            .color
            .clone()
            .ok_or(AppError::MissingRequiredField("Color"))?;
        self.validate()?;

        let color = color::normalize(&ColorInput::try_from(color)?)?;
        let brightness = color::resolve_brightness(self.brightness);
        debug!(color = %color.to_hex(), brightness, "Parsed color request");
        Ok(Action::SetColor { color, brightness })
    }

    pub fn filter(&self) -> DeviceFilter {
        DeviceFilter::new(self.id.clone(), self.address.clone())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PowerRequest {
    pub power: Option<Value>,
    pub id: Option<String>,
    pub address: Option<String>,
}

impl PowerRequest {
    pub fn action(&self) -> Result<Action, AppError> {
        match self.power {
            None => Err(AppError::MissingRequiredField("Power state")),
            Some(Value::Bool(on)) => Ok(Action::SetPower { on }),
            Some(_) => Err(AppError::InvalidPowerType),
        }
    }

    pub fn filter(&self) -> DeviceFilter {
        DeviceFilter::new(self.id.clone(), self.address.clone())
    }
}

pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub dispatcher: CommandDispatcher,
    pub query: QueryService,
}

impl AppState {
    pub fn new(registry: Arc<DeviceRegistry>, controller: Arc<dyn DeviceController>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(Arc::clone(&controller)),
            query: QueryService::new(Arc::clone(&registry), controller),
            registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn color_request(body: Value) -> ColorRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn color_request_defaults_brightness_to_full() {
        let action = color_request(json!({ "color": "#ff0000" })).action().unwrap();
        assert_eq!(
            action,
            Action::SetColor {
                color: Rgb { r: 255, g: 0, b: 0 },
                brightness: 100
            }
        );
    }

    #[test]
    fn color_request_keeps_zero_brightness() {
        let action = color_request(json!({ "color": 255, "brightness": 0 }))
            .action()
            .unwrap();
        assert_eq!(
            action,
            Action::SetColor {
                color: Rgb { r: 0, g: 0, b: 255 },
                brightness: 0
            }
        );
    }

    #[test]
    fn color_request_requires_color() {
        let err = color_request(json!({ "brightness": 50 })).action().unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField("Color")));

        let err = color_request(json!({ "color": null })).action().unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField(_)));
    }

    #[test]
    fn color_request_rejects_brightness_out_of_range() {
        let err = color_request(json!({ "color": "fff", "brightness": 101 }))
            .action()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: brightness must be between 0 and 100"
        );
    }

    #[test]
    fn color_request_brightness_must_be_a_small_integer() {
        for brightness in [json!("50"), json!(50.5), json!(-1), json!(300)] {
            let parsed: Result<ColorRequest, _> =
                serde_json::from_value(json!({ "color": "fff", "brightness": brightness }));
            assert!(parsed.is_err(), "{brightness} should not parse");
        }
    }

    #[test]
    fn color_request_rejects_unsupported_type() {
        let err = color_request(json!({ "color": [1, 2, 3] })).action().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedColorType));
    }

    #[test]
    fn power_request_parses_boolean() {
        let request: PowerRequest = serde_json::from_value(json!({ "power": false })).unwrap();
        assert_eq!(request.action().unwrap(), Action::SetPower { on: false });
    }

    #[test]
    fn power_request_rejects_missing_and_non_boolean() {
        let missing: PowerRequest = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        assert!(matches!(
            missing.action().unwrap_err(),
            AppError::MissingRequiredField("Power state")
        ));

        let wrong: PowerRequest = serde_json::from_value(json!({ "power": "on" })).unwrap();
        assert!(matches!(wrong.action().unwrap_err(), AppError::InvalidPowerType));
    }

    #[test]
    fn requests_build_filters() {
        let request: PowerRequest =
            serde_json::from_value(json!({ "power": true, "address": "10.0.0.2" })).unwrap();
        assert_eq!(
            request.filter(),
            DeviceFilter::new(None, Some("10.0.0.2".into()))
        );
    }
}
