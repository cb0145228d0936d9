//! Single-row tabular input for the model.
//!
//! The pipeline was trained on a data frame whose columns are the request's
//! wire names, holding raw values and category strings. Shaping here must
//! reproduce that frame exactly; the encoders live inside the model.

use crate::types::{Categorical, PatientRecord};

/// Training-time column order.
pub const TRAINING_COLUMNS: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalch", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// One cell of the input row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Int(_) => "integer",
            Cell::Float(_) => "float",
            Cell::Text(_) => "string",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    /// Integer view; floats qualify only when they have no fractional part
    /// and fit in an `i64` without saturating.
    pub fn as_i64(&self) -> Option<i64> {
        const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

        match self {
            Cell::Int(v) => Some(*v),
            Cell::Float(v) if v.fract() == 0.0 && *v >= -LIMIT && *v < LIMIT => Some(*v as i64),
            _ => None,
        }
    }
}

/// A single named, ordered row.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    columns: Vec<(&'static str, Cell)>,
}

impl TabularRow {
    /// Shape a record into the training column layout.
    pub fn from_record(record: &PatientRecord) -> Self {
        let columns = vec![
            ("age", Cell::Int(record.age)),
            ("sex", text(record.sex)),
            ("cp", text(record.chest_pain_type)),
            ("trestbps", Cell::Float(record.resting_blood_pressure)),
            ("chol", Cell::Float(record.cholesterol)),
            ("fbs", text(record.fasting_blood_sugar_high)),
            ("restecg", text(record.resting_ecg)),
            ("thalch", Cell::Float(record.max_heart_rate_achieved)),
            ("exang", text(record.exercise_induced_angina)),
            ("oldpeak", Cell::Float(record.st_depression)),
            ("slope", text(record.st_slope)),
            ("ca", Cell::Float(record.num_major_vessels)),
            ("thal", text(record.thalassemia)),
        ];

        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, cell)| cell)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }
}

fn text<T: Categorical>(value: T) -> Cell {
    Cell::Text(value.as_str().to_string())
}
