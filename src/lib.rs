//! Heart Risk Service Library
//!
//! Validates patient attributes and classifies heart disease risk with a
//! pre-trained pipeline exported to ONNX, behind a small HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use config::AppConfig;
pub use error::{FieldError, InferenceError, ValidationError};
pub use models::inference::{InferenceEngine, Predictor};
pub use types::{patient::PatientRecord, prediction::PredictionResult};
