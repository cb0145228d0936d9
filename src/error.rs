//! Domain errors: client-caused validation failures and server-caused
//! inference failures.

use thiserror::Error;

/// A single rejected field in a prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Offending wire field; `None` when the body as a whole is rejected.
    pub field: Option<String>,
    /// Machine-readable error type, e.g. `missing` or `enum`.
    pub kind: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            kind,
            message: message.into(),
        }
    }

    pub fn body(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: None,
            kind,
            message: message.into(),
        }
    }

    /// Location path, rooted at the request body.
    pub fn loc(&self) -> Vec<String> {
        let mut loc = vec!["body".to_string()];
        if let Some(field) = &self.field {
            loc.push(field.clone());
        }
        loc
    }
}

/// The request payload does not describe a valid patient record.
#[derive(Debug, Clone, Error)]
#[error("invalid patient record: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// The body could not be parsed as JSON at all.
    pub fn json_invalid(err: &serde_json::Error) -> Self {
        Self::new(vec![FieldError::body(
            "json_invalid",
            format!("JSON decode error: {err}"),
        )])
    }

    /// Names of the rejected fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().filter_map(|e| e.field.as_deref()).collect()
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The model could not produce a prediction for a validated record.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model input '{column}' has no matching column")]
    ColumnMismatch { column: String },

    #[error("model input '{column}' expects {expected}, got {actual}")]
    UnsupportedInput {
        column: String,
        expected: String,
        actual: &'static str,
    },

    #[error("model input '{column}' cannot hold {value:e} as {expected}")]
    OutOfRange {
        column: String,
        expected: String,
        value: f64,
    },

    #[error("model prediction failed: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),

    #[error("unexpected class label {0}")]
    UnexpectedLabel(i64),

    #[error("model session lock poisoned")]
    Poisoned,

    #[error("inference task failed: {0}")]
    Join(String),
}

impl InferenceError {
    pub fn runtime(err: impl std::fmt::Display) -> Self {
        InferenceError::Runtime(err.to_string())
    }

    /// Message safe to return to clients: names the failure without the
    /// runtime's own error text.
    pub fn public_message(&self) -> &'static str {
        match self {
            InferenceError::ColumnMismatch { .. } | InferenceError::UnsupportedInput { .. } => {
                "Model input does not match the expected columns"
            }
            InferenceError::OutOfRange { .. } => "Model input value is out of range",
            InferenceError::UnexpectedOutput(_) | InferenceError::UnexpectedLabel(_) => {
                "Model returned an unexpected prediction"
            }
            InferenceError::Runtime(_) | InferenceError::Poisoned | InferenceError::Join(_) => {
                "Model prediction failed"
            }
        }
    }
}
