//! Type definitions for the heart risk service

pub mod patient;
pub mod prediction;

pub use patient::{
    Categorical, ChestPain, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia, YesNo,
};
pub use prediction::{PredictionResult, RiskLevel};
