//! Color input normalization.
//!
//! Colors arrive either as a packed `0xRRGGBB` integer or as a hex string
//! (`"#0AF"`, `"00aaff"`). Both resolve to an [`Rgb`] triple.

use crate::{error::AppError, models::Rgb};
use serde_json::Value;

pub const MAX_PACKED_COLOR: i64 = 0xFF_FF_FF;
pub const DEFAULT_BRIGHTNESS: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorInput {
    Numeric(i64),
    Hex(String),
}

impl TryFrom<Value> for ColorInput {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(ColorInput::Numeric)
                .ok_or_else(|| AppError::InvalidColorFormat(format!("{n} is not an integer color"))),
            Value::String(s) => Ok(ColorInput::Hex(s)),
            _ => Err(AppError::UnsupportedColorType),
        }
    }
}

pub fn normalize(input: &ColorInput) -> Result<Rgb, AppError> {
    match input {
        ColorInput::Numeric(value) => from_packed(*value),
        ColorInput::Hex(s) => from_hex(s),
    }
}

fn from_packed(value: i64) -> Result<Rgb, AppError> {
    if !(0..=MAX_PACKED_COLOR).contains(&value) {
        return Err(AppError::InvalidColorFormat(format!(
            "{value} is outside 0..={MAX_PACKED_COLOR}"
        )));
    }
    let value = value as u32;
    Ok(Rgb {
        r: (value >> 16) as u8,
        g: (value >> 8) as u8,
        b: value as u8,
    })
}

fn from_hex(s: &str) -> Result<Rgb, AppError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidColorFormat(s.to_string()));
    }

    // "0AF" -> "00AAFF"
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(AppError::InvalidColorFormat(s.to_string())),
    };

    let value = u32::from_str_radix(&expanded, 16)
        .map_err(|_| AppError::InvalidColorFormat(s.to_string()))?;
    from_packed(i64::from(value))
}

/// Absent brightness means full brightness. Range is checked on the request.
pub fn resolve_brightness(brightness: Option<u8>) -> u8 {
    brightness.unwrap_or(DEFAULT_BRIGHTNESS)
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
