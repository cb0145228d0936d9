//! Prediction result data structures

use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

/// Human-readable risk label derived from the model's class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    /// Map a binary class label to its risk level
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(RiskLevel::Low),
            1 => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn label(&self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::High => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::High => "High",
        }
    }
}

/// Response body of a successful prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Class label (0 = low risk, 1 = high risk)
    pub prediction: u8,
    pub risk: RiskLevel,
}

impl PredictionResult {
    /// Build a result from the raw class label returned by the model.
    pub fn from_label(label: i64) -> Result<Self, InferenceError> {
        let risk = RiskLevel::from_label(label).ok_or(InferenceError::UnexpectedLabel(label))?;
        Ok(Self {
            prediction: risk.label(),
            risk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        let low = PredictionResult::from_label(0).unwrap();
        assert_eq!(low.prediction, 0);
        assert_eq!(low.risk, RiskLevel::Low);

        let high = PredictionResult::from_label(1).unwrap();
        assert_eq!(high.prediction, 1);
        assert_eq!(high.risk, RiskLevel::High);
    }

    #[test]
    fn test_unexpected_label() {
        assert!(matches!(
            PredictionResult::from_label(2),
            Err(InferenceError::UnexpectedLabel(2))
        ));
        assert!(PredictionResult::from_label(-1).is_err());
    }

    #[test]
    fn test_prediction_serialization() {
        let result = PredictionResult::from_label(1).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"prediction":1,"risk":"High"}"#);
    }
}
