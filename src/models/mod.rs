//! Model artifact loading and inference

pub mod inference;
pub mod loader;
pub mod tabular;

pub use inference::{InferenceEngine, OnnxPredictor, Predictor};
pub use loader::ModelLoader;
pub use tabular::TabularRow;
