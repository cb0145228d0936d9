//! Inference adapter: runs one validated record through the model artifact

use crate::config::ModelConfig;
use crate::error::InferenceError;
use crate::models::loader::{ColumnType, LoadedModel, ModelInput, ModelLoader};
use crate::models::tabular::{Cell, TabularRow};
use crate::types::{PatientRecord, PredictionResult};
use anyhow::Result;
use ort::value::{DynValue, Tensor};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// An opaque, read-only classifier over single tabular rows.
pub trait Predictor: Send + Sync {
    /// Predict the class label for one row.
    fn predict(&self, row: &TabularRow) -> Result<i64, InferenceError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Predictor backed by an ONNX Runtime session.
///
/// Each graph input is fed from the row column of the same name as a
/// `[1, 1]` tensor of the input's declared element type.
pub struct OnnxPredictor {
    name: String,
    inputs: Vec<ModelInput>,
    label_output: String,
    // `Session::run` takes `&mut self`
    session: Mutex<ort::session::Session>,
}

impl OnnxPredictor {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name,
            inputs: model.inputs,
            label_output: model.label_output,
            session: Mutex::new(model.session),
        }
    }

    pub fn inputs(&self) -> &[ModelInput] {
        &self.inputs
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, row: &TabularRow) -> Result<i64, InferenceError> {
        let feeds = feeds(&self.inputs, row)?;

        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session.run(feeds).map_err(InferenceError::runtime)?;

        let output = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| {
                InferenceError::UnexpectedOutput(format!("missing output '{}'", self.label_output))
            })?;

        read_label(output)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the named input tensors for a row, one per declared graph input.
fn feeds(
    inputs: &[ModelInput],
    row: &TabularRow,
) -> Result<Vec<(String, DynValue)>, InferenceError> {
    inputs
        .iter()
        .map(|input| -> Result<(String, DynValue), InferenceError> {
            let cell = row
                .column(&input.name)
                .ok_or_else(|| InferenceError::ColumnMismatch {
                    column: input.name.clone(),
                })?;
            Ok((input.name.clone(), input_tensor(input, cell)?))
        })
        .collect()
}

fn input_tensor(input: &ModelInput, cell: &Cell) -> Result<DynValue, InferenceError> {
    let shape = vec![1_i64, 1];
    let mismatch = || InferenceError::UnsupportedInput {
        column: input.name.clone(),
        expected: input.column_type.to_string(),
        actual: cell.type_name(),
    };

    let value = match &input.column_type {
        ColumnType::Int64 => {
            let v = cell.as_i64().ok_or_else(mismatch)?;
            Tensor::from_array((shape, vec![v]))
                .map_err(InferenceError::runtime)?
                .into_dyn()
        }
        ColumnType::Int32 => {
            let v = cell
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(mismatch)?;
            Tensor::from_array((shape, vec![v]))
                .map_err(InferenceError::runtime)?
                .into_dyn()
        }
        ColumnType::Float32 => {
            let wide = cell.as_f64().ok_or_else(mismatch)?;
            let v = wide as f32;
            if !v.is_finite() {
                return Err(InferenceError::OutOfRange {
                    column: input.name.clone(),
                    expected: input.column_type.to_string(),
                    value: wide,
                });
            }
            Tensor::from_array((shape, vec![v]))
                .map_err(InferenceError::runtime)?
                .into_dyn()
        }
        ColumnType::Float64 => {
            let v = cell.as_f64().ok_or_else(mismatch)?;
            Tensor::from_array((shape, vec![v]))
                .map_err(InferenceError::runtime)?
                .into_dyn()
        }
        ColumnType::Text => match cell {
            Cell::Text(s) => Tensor::from_string_array((shape, std::slice::from_ref(s)))
                .map_err(InferenceError::runtime)?
                .into_dyn(),
            _ => return Err(mismatch()),
        },
        ColumnType::Unsupported(_) => return Err(mismatch()),
    };

    Ok(value)
}

/// Read exactly one class label from the label output.
///
/// Classifiers fitted on string targets emit the label as text, so a string
/// tensor is accepted when its single element parses as an integer.
fn read_label(output: &DynValue) -> Result<i64, InferenceError> {
    if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
        return single(data.iter().copied());
    }
    if let Ok((_, data)) = output.try_extract_tensor::<i32>() {
        return single(data.iter().map(|&v| v as i64));
    }
    if let Ok((_, data)) = output.try_extract_strings() {
        let text = single(data.into_iter())?;
        return text.trim().parse::<i64>().map_err(|_| {
            InferenceError::UnexpectedOutput(format!("label '{text}' is not an integer"))
        });
    }
    Err(InferenceError::UnexpectedOutput(format!(
        "label output has type {:?}",
        output.dtype()
    )))
}

fn single<T>(mut labels: impl Iterator<Item = T>) -> Result<T, InferenceError> {
    match (labels.next(), labels.next()) {
        (Some(label), None) => Ok(label),
        (None, _) => Err(InferenceError::UnexpectedOutput("no label returned".to_string())),
        (Some(_), Some(_)) => Err(InferenceError::UnexpectedOutput(
            "more than one label returned for a single row".to_string(),
        )),
    }
}

/// Maps validated records to prediction results through a shared predictor.
#[derive(Clone)]
pub struct InferenceEngine {
    predictor: Arc<dyn Predictor>,
}

impl InferenceEngine {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    /// Load the ONNX artifact named in the configuration.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let model = loader.load_model(&config.path)?;
        let predictor = OnnxPredictor::new(model);

        info!(
            model = %predictor.name(),
            inputs = predictor.inputs().len(),
            "Inference engine initialized"
        );

        Ok(Self::new(Arc::new(predictor)))
    }

    pub fn model_name(&self) -> &str {
        self.predictor.name()
    }

    /// Run one record through the model and map the label to a risk level.
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, InferenceError> {
        let row = TabularRow::from_record(record);
        let label = self.predictor.predict(&row)?;
        let result = PredictionResult::from_label(label)?;

        debug!(
            model = %self.predictor.name(),
            label = label,
            risk = result.risk.as_str(),
            "Inference complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tabular::TRAINING_COLUMNS;
    use crate::types::RiskLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPredictor {
        label: i64,
        calls: AtomicUsize,
    }

    impl Predictor for FixedPredictor {
        fn predict(&self, row: &TabularRow) -> Result<i64, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(row.names().len(), 13);
            Ok(self.label)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn predict(&self, _row: &TabularRow) -> Result<i64, InferenceError> {
            Err(InferenceError::ColumnMismatch {
                column: "thal".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn engine_with_label(label: i64) -> (InferenceEngine, Arc<FixedPredictor>) {
        let predictor = Arc::new(FixedPredictor {
            label,
            calls: AtomicUsize::new(0),
        });
        (InferenceEngine::new(predictor.clone()), predictor)
    }

    #[test]
    fn test_high_risk_mapping() {
        let (engine, predictor) = engine_with_label(1);
        let result = engine.predict(&PatientRecord::example()).unwrap();

        assert_eq!(result.prediction, 1);
        assert_eq!(result.risk, RiskLevel::High);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.model_name(), "fixed");
    }

    #[test]
    fn test_low_risk_mapping() {
        let (engine, _) = engine_with_label(0);
        let result = engine.predict(&PatientRecord::example()).unwrap();

        assert_eq!(result.prediction, 0);
        assert_eq!(result.risk, RiskLevel::Low);
    }

    #[test]
    fn test_unexpected_label_is_inference_error() {
        let (engine, _) = engine_with_label(7);
        assert!(matches!(
            engine.predict(&PatientRecord::example()),
            Err(InferenceError::UnexpectedLabel(7))
        ));
    }

    #[test]
    fn test_predictor_error_propagates() {
        let engine = InferenceEngine::new(Arc::new(FailingPredictor));
        let err = engine.predict(&PatientRecord::example()).unwrap_err();
        assert!(matches!(err, InferenceError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_repeated_predictions_are_identical() {
        let (engine, _) = engine_with_label(1);
        let record = PatientRecord::example();
        assert_eq!(engine.predict(&record).unwrap(), engine.predict(&record).unwrap());
    }

    #[test]
    fn test_single_label() {
        assert_eq!(single([1_i64].into_iter()).unwrap(), 1);
        assert!(single(std::iter::empty::<i64>()).is_err());
        assert!(single([0_i64, 1].into_iter()).is_err());
    }

    fn string_label_tensor(labels: Vec<&str>) -> DynValue {
        let shape = vec![labels.len() as i64];
        let labels: Vec<String> = labels.into_iter().map(String::from).collect();
        Tensor::from_string_array((shape, labels.as_slice())).unwrap().into_dyn()
    }

    #[test]
    fn test_read_integer_labels() {
        let int64 = Tensor::from_array((vec![1_i64], vec![1_i64])).unwrap();
        assert_eq!(read_label(&int64.into_dyn()).unwrap(), 1);

        let int32 = Tensor::from_array((vec![1_i64], vec![0_i32])).unwrap();
        assert_eq!(read_label(&int32.into_dyn()).unwrap(), 0);
    }

    #[test]
    fn test_read_string_label() {
        assert_eq!(read_label(&string_label_tensor(vec!["1"])).unwrap(), 1);
        assert_eq!(read_label(&string_label_tensor(vec!["0"])).unwrap(), 0);

        let err = read_label(&string_label_tensor(vec!["presence"])).unwrap_err();
        assert!(matches!(err, InferenceError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_read_label_rejects_batches() {
        let batch = Tensor::from_array((vec![2_i64], vec![0_i64, 1])).unwrap();
        let err = read_label(&batch.into_dyn()).unwrap_err();
        assert!(matches!(err, InferenceError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_read_label_rejects_probabilities() {
        let scores = Tensor::from_array((vec![1_i64, 1], vec![0.8_f32])).unwrap();
        let err = read_label(&scores.into_dyn()).unwrap_err();
        assert!(matches!(err, InferenceError::UnexpectedOutput(_)));
    }

    fn training_inputs() -> Vec<ModelInput> {
        TRAINING_COLUMNS
            .iter()
            .map(|name| ModelInput {
                name: name.to_string(),
                column_type: match *name {
                    "age" => ColumnType::Int64,
                    "trestbps" | "chol" | "thalch" | "oldpeak" | "ca" => ColumnType::Float32,
                    _ => ColumnType::Text,
                },
            })
            .collect()
    }

    #[test]
    fn test_feeds_cover_every_input() {
        let row = TabularRow::from_record(&PatientRecord::example());
        let feeds = feeds(&training_inputs(), &row).unwrap();

        let names: Vec<&str> = feeds.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, TRAINING_COLUMNS.to_vec());
    }

    #[test]
    fn test_feeds_missing_column() {
        let row = TabularRow::from_record(&PatientRecord::example());
        let mut inputs = training_inputs();
        inputs.push(ModelInput {
            name: "num".to_string(),
            column_type: ColumnType::Int64,
        });

        let err = feeds(&inputs, &row).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ColumnMismatch { ref column } if column == "num"
        ));
    }

    #[test]
    fn test_float32_input_out_of_range() {
        let input = ModelInput {
            name: "chol".to_string(),
            column_type: ColumnType::Float32,
        };
        let err = input_tensor(&input, &Cell::Float(1e300)).unwrap_err();
        assert!(matches!(err, InferenceError::OutOfRange { .. }));

        assert!(input_tensor(&input, &Cell::Float(233.0)).is_ok());
    }

    #[test]
    fn test_int64_input_does_not_saturate() {
        let input = ModelInput {
            name: "ca".to_string(),
            column_type: ColumnType::Int64,
        };
        assert!(input_tensor(&input, &Cell::Float(1e30)).is_err());
        assert!(input_tensor(&input, &Cell::Float(2.0)).is_ok());
    }

    #[test]
    fn test_input_type_mismatch() {
        let input = ModelInput {
            name: "sex".to_string(),
            column_type: ColumnType::Float32,
        };
        let err = input_tensor(&input, &Cell::Text("Male".to_string())).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::UnsupportedInput { actual: "string", .. }
        ));

        let input = ModelInput {
            name: "age".to_string(),
            column_type: ColumnType::Unsupported("tensor(Bool)".to_string()),
        };
        assert!(input_tensor(&input, &Cell::Int(63)).is_err());
    }
}
