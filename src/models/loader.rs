//! ONNX model loader

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Element type of a model graph input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Int32,
    Float32,
    Float64,
    Text,
    /// Anything else the graph declares; rejected when fed.
    Unsupported(String),
}

impl ColumnType {
    pub fn from_value_type(value_type: &ValueType) -> Self {
        match value_type {
            ValueType::Tensor { ty, .. } => match ty {
                TensorElementType::Int64 => ColumnType::Int64,
                TensorElementType::Int32 => ColumnType::Int32,
                TensorElementType::Float32 => ColumnType::Float32,
                TensorElementType::Float64 => ColumnType::Float64,
                TensorElementType::String => ColumnType::Text,
                other => ColumnType::Unsupported(format!("tensor({other:?})")),
            },
            other => ColumnType::Unsupported(format!("{other:?}")),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int64 => f.write_str("int64"),
            ColumnType::Int32 => f.write_str("int32"),
            ColumnType::Float32 => f.write_str("float"),
            ColumnType::Float64 => f.write_str("double"),
            ColumnType::Text => f.write_str("string"),
            ColumnType::Unsupported(ty) => f.write_str(ty),
        }
    }
}

/// Declared graph input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInput {
    pub name: String,
    pub column_type: ColumnType,
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Graph inputs, one per training column
    pub inputs: Vec<ModelInput>,
    /// Output holding the predicted class label
    pub label_output: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the model artifact from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        if !path.exists() {
            anyhow::bail!("Model artifact not found at {}", path.display());
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let inputs: Vec<ModelInput> = session
            .inputs
            .iter()
            .map(|input| ModelInput {
                name: input.name.clone(),
                column_type: ColumnType::from_value_type(&input.input_type),
            })
            .collect();

        if inputs.is_empty() {
            anyhow::bail!("Model {} declares no inputs", path.display());
        }

        for input in &inputs {
            if let ColumnType::Unsupported(ty) = &input.column_type {
                warn!(model = %name, input = %input.name, ty = %ty, "Model input has an unsupported type");
            }
        }

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .with_context(|| format!("Model {} declares no outputs", path.display()))?;

        info!(
            model = %name,
            inputs = ?inputs.iter().map(|i| format!("{}:{}", i.name, i.column_type)).collect::<Vec<_>>(),
            output = %label_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            inputs,
            label_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
