//! HTTP route modules.
//!
//! Each resource module exposes a public `router()` for reads and, where it
//! has writes, an `admin_router()` that the app builder wraps in session and
//! admin middleware.

pub mod accounts;
pub mod acts;
pub mod groups;
pub mod health;
pub mod search;
pub mod sections;

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kayda_core::models::Jurisdiction;

use crate::error::AppError;

/// JSON body extractor whose rejections use the [`AppError`] envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor whose rejections use the [`AppError`] envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parse a path id, rejecting anything that is not a UUID before it reaches storage.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid, AppError> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::BadRequest(format!("invalid {kind} id '{raw}'")))
}

/// Parse an optional `jurisdiction` value, defaulting to Maharashtra.
pub(crate) fn parse_jurisdiction(raw: Option<&str>) -> Result<Jurisdiction, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Jurisdiction::default()),
        Some(s) => s.parse().map_err(AppError::BadRequest),
    }
}

/// `?jurisdiction=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct JurisdictionQuery {
    pub jurisdiction: Option<String>,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_uuid() {
        assert!(matches!(parse_id("act", "123"), Err(AppError::BadRequest(_))));
        assert!(parse_id("act", &Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn jurisdiction_defaults_to_maharashtra() {
        assert!(matches!(parse_jurisdiction(None), Ok(Jurisdiction::Maharashtra)));
        assert!(matches!(parse_jurisdiction(Some("")), Ok(Jurisdiction::Maharashtra)));
        assert!(matches!(parse_jurisdiction(Some("indian")), Ok(Jurisdiction::Indian)));
        assert!(matches!(parse_jurisdiction(Some("goa")), Err(AppError::BadRequest(_))));
    }
}
