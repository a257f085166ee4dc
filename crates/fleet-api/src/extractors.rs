//! # Custom Extractors & Validation
//!
//! - [`Validate`]: field-level checks on request DTOs, run by
//!   [`extract_validated_json`] before a request reaches the use-cases.
//! - [`DronePath`]: the `{id}` path segment as a [`DroneId`].
//! - Small field checks shared by the DTOs.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::Json;

use fleet_core::DroneId;

use crate::error::AppError;

/// Request types that check field-level rules serde cannot express.
pub trait Validate {
    /// Check the fields. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// The drone identifier from the `{id}` path segment.
///
/// A non-numeric segment is a bad request; a number that cannot be a drone
/// identifier (zero, negative) names no drone and is a 404.
#[derive(Debug, Clone, Copy)]
pub struct DronePath(pub DroneId);

impl<S: Send + Sync> FromRequestParts<S> for DronePath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        DroneId::new(raw)
            .map(Self)
            .map_err(|_| AppError::NotFound(format!("drone {raw} not found")))
    }
}

// -- Field checks -------------------------------------------------------------

/// `value` must be present and non-blank.
pub(crate) fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

/// `value` must lie in `min..=max`.
pub(crate) fn in_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), String> {
    if !(min..=max).contains(&value) {
        return Err(format!("{field} must be between {min} and {max}, got {value}"));
    }
    Ok(())
}

/// `value` must be an absolute `http` or `https` URL with a host.
///
/// Whitespace is refused outright rather than percent-encoded.
pub(crate) fn http_url(field: &str, value: &str) -> Result<(), String> {
    let invalid = || format!("{field} must be an http(s) URL, got \"{value}\"");
    if value.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let url = url::Url::parse(value).map_err(|_| invalid())?;
    let http = matches!(url.scheme(), "http" | "https");
    if !http || url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }
    Ok(())
}
