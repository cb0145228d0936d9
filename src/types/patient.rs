//! Patient record data structures for heart disease risk prediction

use serde::{Deserialize, Serialize};
use std::fmt;

/// A categorical attribute with a closed set of accepted wire values.
pub trait Categorical: Sized + Copy + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Accepted wire values, in declaration order.
    const VALUES: &'static [&'static str];

    /// Parse an exact (case-sensitive) wire value.
    fn parse(value: &str) -> Option<Self>;

    /// Wire value, which is also the category the model was trained on.
    fn as_str(&self) -> &'static str;
}

macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Categorical for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const VALUES: &'static [&'static str] = &[$($label),+];

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical! {
    /// Biological sex
    Sex {
        Male => "Male",
        Female => "Female",
    }
}

categorical! {
    /// Yes/No flag, used for fasting blood sugar and exercise angina
    YesNo {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    /// Chest pain type (cp)
    ChestPain {
        TypicalAngina => "Typical angina",
        AtypicalAngina => "Atypical angina",
        NonAnginalPain => "Non-anginal pain",
        Asymptomatic => "Asymptomatic",
    }
}

categorical! {
    /// Resting electrocardiographic result (restecg)
    RestingEcg {
        Normal => "Normal",
        StTAbnormality => "ST-T wave abnormality",
        LvHypertrophy => "Left ventricular hypertrophy",
    }
}

categorical! {
    /// Slope of the peak exercise ST segment
    StSlope {
        Upsloping => "Upsloping",
        Flat => "Flat",
        Downsloping => "Downsloping",
    }
}

categorical! {
    /// Thalassemia test result (thal)
    Thalassemia {
        Normal => "Normal",
        FixedDefect => "Fixed defect",
        ReversibleDefect => "Reversible defect",
    }
}

/// Patient attributes submitted for a single prediction.
///
/// Wire names follow the UCI heart disease dataset columns the model was
/// trained on; they must not change without retraining the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: i64,

    pub sex: Sex,

    #[serde(rename = "cp")]
    pub chest_pain_type: ChestPain,

    /// Resting blood pressure (mm Hg)
    #[serde(rename = "trestbps")]
    pub resting_blood_pressure: f64,

    /// Serum cholesterol (mg/dl)
    #[serde(rename = "chol")]
    pub cholesterol: f64,

    /// Fasting blood sugar > 120 mg/dl
    #[serde(rename = "fbs")]
    pub fasting_blood_sugar_high: YesNo,

    #[serde(rename = "restecg")]
    pub resting_ecg: RestingEcg,

    #[serde(rename = "thalch")]
    pub max_heart_rate_achieved: f64,

    #[serde(rename = "exang")]
    pub exercise_induced_angina: YesNo,

    /// ST depression induced by exercise relative to rest
    #[serde(rename = "oldpeak")]
    pub st_depression: f64,

    #[serde(rename = "slope")]
    pub st_slope: StSlope,

    /// Number of major vessels colored by fluoroscopy
    #[serde(rename = "ca")]
    pub num_major_vessels: f64,

    #[serde(rename = "thal")]
    pub thalassemia: Thalassemia,
}

impl PatientRecord {
    /// The reference patient used in documentation and smoke tests.
    pub fn example() -> Self {
        Self {
            age: 63,
            sex: Sex::Male,
            chest_pain_type: ChestPain::TypicalAngina,
            resting_blood_pressure: 145.0,
            cholesterol: 233.0,
            fasting_blood_sugar_high: YesNo::Yes,
            resting_ecg: RestingEcg::LvHypertrophy,
            max_heart_rate_achieved: 150.0,
            exercise_induced_angina: YesNo::No,
            st_depression: 2.3,
            st_slope: StSlope::Downsloping,
            num_major_vessels: 0.0,
            thalassemia: Thalassemia::FixedDefect,
        }
    }
}
