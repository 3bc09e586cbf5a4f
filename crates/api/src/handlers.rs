pub mod auth;
pub mod health;
pub mod intake;
pub mod invitation;
pub mod workspace;

use crate::error::{validation_error, ApiError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use serde::Deserialize;

/// `?token=` on the public lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

/// Malformed or incomplete bodies are validation errors (400), not 422.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| validation_error(&rejection.body_text()))
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| validation_error(&rejection.body_text()))
}
