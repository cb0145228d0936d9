use crate::error::{InferenceError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Client sent an invalid patient record
    Validation(ValidationError),
    /// Model failed; `detail` is what the client sees
    Inference { detail: String },
}

#[derive(Serialize)]
struct ValidationDetail {
    loc: Vec<String>,
    msg: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ValidationBody {
    detail: Vec<ValidationDetail>,
}

#[derive(Serialize)]
struct MessageBody {
    detail: String,
}

impl ApiError {
    pub fn validation(err: ValidationError) -> Self {
        tracing::warn!(fields = ?err.fields(), "Rejected prediction request: {}", err);
        ApiError::Validation(err)
    }

    /// Log the full error and keep either it or its public message for the
    /// response body.
    pub fn inference(err: InferenceError, expose_details: bool) -> Self {
        tracing::error!(error = %err, "Inference failed");
        let detail = if expose_details {
            err.to_string()
        } else {
            err.public_message().to_string()
        };
        ApiError::Inference { detail }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(err) => {
                let detail = err
                    .errors
                    .into_iter()
                    .map(|e| ValidationDetail {
                        loc: e.loc(),
                        msg: e.message,
                        kind: e.kind,
                    })
                    .collect();
                (status, Json(ValidationBody { detail })).into_response()
            }
            ApiError::Inference { detail } => (status, Json(MessageBody { detail })).into_response(),
        }
    }
}
