//! Schema validation for prediction requests.
//!
//! Turns an untyped JSON payload into a [`PatientRecord`], or reports every
//! rejected field at once. Error types and messages (`missing`, `enum`,
//! `int_parsing`, ...) keep the shape existing clients already parse.

use crate::error::{FieldError, ValidationError};
use crate::types::{
    Categorical, ChestPain, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia, YesNo,
};
use serde_json::{Map, Value};

/// Validate a parsed JSON payload into a patient record.
///
/// Unknown fields are ignored. Numeric fields accept JSON numbers and
/// numeric strings; categorical fields accept only their exact wire values.
pub fn validate(payload: &Value) -> Result<PatientRecord, ValidationError> {
    let object = payload.as_object().ok_or_else(|| {
        ValidationError::new(vec![FieldError::body(
            "model_attributes_type",
            "Input should be a valid dictionary or object to extract fields from",
        )])
    })?;

    let mut fields = FieldReader::new(object);

    let draft = Draft {
        age: fields.integer("age"),
        sex: fields.categorical("sex"),
        chest_pain_type: fields.categorical("cp"),
        resting_blood_pressure: fields.float("trestbps"),
        cholesterol: fields.float("chol"),
        fasting_blood_sugar_high: fields.categorical("fbs"),
        resting_ecg: fields.categorical("restecg"),
        max_heart_rate_achieved: fields.float("thalch"),
        exercise_induced_angina: fields.categorical("exang"),
        st_depression: fields.float("oldpeak"),
        st_slope: fields.categorical("slope"),
        num_major_vessels: fields.float("ca"),
        thalassemia: fields.categorical("thal"),
    };

    match draft.finish() {
        Some(record) if fields.errors.is_empty() => Ok(record),
        _ => Err(ValidationError::new(fields.errors)),
    }
}

/// Parse raw request bytes and validate them.
pub fn validate_json(body: &[u8]) -> Result<PatientRecord, ValidationError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::json_invalid(&e))?;
    validate(&payload)
}

/// Per-field results; every `None` has pushed a field error.
struct Draft {
    age: Option<i64>,
    sex: Option<Sex>,
    chest_pain_type: Option<ChestPain>,
    resting_blood_pressure: Option<f64>,
    cholesterol: Option<f64>,
    fasting_blood_sugar_high: Option<YesNo>,
    resting_ecg: Option<RestingEcg>,
    max_heart_rate_achieved: Option<f64>,
    exercise_induced_angina: Option<YesNo>,
    st_depression: Option<f64>,
    st_slope: Option<StSlope>,
    num_major_vessels: Option<f64>,
    thalassemia: Option<Thalassemia>,
}

impl Draft {
    fn finish(self) -> Option<PatientRecord> {
        Some(PatientRecord {
            age: self.age?,
            sex: self.sex?,
            chest_pain_type: self.chest_pain_type?,
            resting_blood_pressure: self.resting_blood_pressure?,
            cholesterol: self.cholesterol?,
            fasting_blood_sugar_high: self.fasting_blood_sugar_high?,
            resting_ecg: self.resting_ecg?,
            max_heart_rate_achieved: self.max_heart_rate_achieved?,
            exercise_induced_angina: self.exercise_induced_angina?,
            st_depression: self.st_depression?,
            st_slope: self.st_slope?,
            num_major_vessels: self.num_major_vessels?,
            thalassemia: self.thalassemia?,
        })
    }
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            errors: Vec::new(),
        }
    }

    fn present(&mut self, name: &str) -> Option<&'a Value> {
        let value = self.object.get(name);
        if value.is_none() {
            self.errors
                .push(FieldError::new(name, "missing", "Field required"));
        }
        value
    }

    fn integer(&mut self, name: &str) -> Option<i64> {
        let value = self.present(name)?;
        match parse_integer(value) {
            Ok(v) => Some(v),
            Err((kind, message)) => {
                self.errors.push(FieldError::new(name, kind, message));
                None
            }
        }
    }

    fn float(&mut self, name: &str) -> Option<f64> {
        let value = self.present(name)?;
        match parse_float(value) {
            Ok(v) => Some(v),
            Err((kind, message)) => {
                self.errors.push(FieldError::new(name, kind, message));
                None
            }
        }
    }

    fn categorical<T: Categorical>(&mut self, name: &str) -> Option<T> {
        let value = self.present(name)?;
        let parsed = value.as_str().and_then(T::parse);
        if parsed.is_none() {
            self.errors.push(FieldError::new(
                name,
                "enum",
                format!("Input should be {}", expected_values(T::VALUES)),
            ));
        }
        parsed
    }
}

type Rejection = (&'static str, &'static str);

fn parse_integer(value: &Value) -> Result<i64, Rejection> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                Some(f) if f.fract() != 0.0 => Err((
                    "int_from_float",
                    "Input should be a valid integer, got a number with a fractional part",
                )),
                _ => Err(("int_parsing", "Input should be a valid integer")),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            (
                "int_parsing",
                "Input should be a valid integer, unable to parse string as an integer",
            )
        }),
        _ => Err(("int_type", "Input should be a valid integer")),
    }
}

fn parse_float(value: &Value) -> Result<f64, Rejection> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| {
            (
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number",
            )
        })?),
        _ => return Err(("float_type", "Input should be a valid number")),
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(("finite_number", "Input should be a finite number")),
    }
}

/// Render accepted values as `'A', 'B' or 'C'`.
fn expected_values(values: &[&str]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn example_payload() -> Value {
        json!({
            "age": 63,
            "sex": "Male",
            "cp": "Typical angina",
            "trestbps": 145,
            "chol": 233,
            "fbs": "Yes",
            "restecg": "Left ventricular hypertrophy",
            "thalch": 150,
            "exang": "No",
            "oldpeak": 2.3,
            "slope": "Downsloping",
            "ca": 0,
            "thal": "Fixed defect"
        })
    }

    #[test]
    fn test_valid_payload() {
        let record = validate(&example_payload()).unwrap();
        assert_eq!(record, PatientRecord::example());
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut payload = example_payload();
        payload.as_object_mut().unwrap().remove("chol");

        let err = validate(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["chol"]);
        assert_eq!(err.errors[0].kind, "missing");
        assert_eq!(err.errors[0].message, "Field required");
    }

    #[test]
    fn test_enum_outside_closed_set() {
        let mut payload = example_payload();
        payload["sex"] = json!("Other");

        let err = validate(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["sex"]);
        assert_eq!(err.errors[0].kind, "enum");
        assert_eq!(err.errors[0].message, "Input should be 'Male' or 'Female'");
    }

    #[test]
    fn test_enum_is_case_sensitive() {
        let mut payload = example_payload();
        payload["cp"] = json!("typical angina");

        let err = validate(&payload).unwrap_err();
        assert_eq!(
            err.errors[0].message,
            "Input should be 'Typical angina', 'Atypical angina', 'Non-anginal pain' or 'Asymptomatic'"
        );
    }

    #[test]
    fn test_all_errors_collected() {
        let payload = json!({
            "age": "sixty",
            "sex": "Female",
            "cp": "Asymptomatic",
            "trestbps": true,
            "thal": 3
        });

        let err = validate(&payload).unwrap_err();
        let fields = err.fields();
        assert!(fields.contains(&"age"));
        assert!(fields.contains(&"trestbps"));
        assert!(fields.contains(&"thal"));
        assert!(fields.contains(&"chol"));
        assert!(!fields.contains(&"sex"));
        // 13 fields, 2 valid
        assert_eq!(err.errors.len(), 11);
    }

    #[test]
    fn test_numeric_coercion() {
        let mut payload = example_payload();
        payload["age"] = json!("63");
        payload["trestbps"] = json!("145.5");
        payload["ca"] = json!(1);

        let record = validate(&payload).unwrap();
        assert_eq!(record.age, 63);
        assert_eq!(record.resting_blood_pressure, 145.5);
        assert_eq!(record.num_major_vessels, 1.0);
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let mut payload = example_payload();
        payload["age"] = json!(63.5);

        let err = validate(&payload).unwrap_err();
        assert_eq!(err.errors[0].kind, "int_from_float");

        payload["age"] = json!(63.0);
        assert_eq!(validate(&payload).unwrap().age, 63);
    }

    #[test]
    fn test_null_is_a_type_error() {
        let mut payload = example_payload();
        payload["oldpeak"] = Value::Null;

        let err = validate(&payload).unwrap_err();
        assert_eq!(err.errors[0].kind, "float_type");
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut payload = example_payload();
        payload["chol"] = json!("NaN");

        let err = validate(&payload).unwrap_err();
        assert_eq!(err.errors[0].kind, "finite_number");
    }

    #[test]
    fn test_extra_fields_ignored() {
        let mut payload = example_payload();
        payload["patient_id"] = json!("abc");

        assert!(validate(&payload).is_ok());
    }

    #[test]
    fn test_non_object_payload() {
        let err = validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, None);
        assert_eq!(err.errors[0].kind, "model_attributes_type");
    }

    #[test]
    fn test_invalid_json() {
        let err = validate_json(b"{\"age\": 63,").unwrap_err();
        assert_eq!(err.errors[0].kind, "json_invalid");
    }

    #[test]
    fn test_categorical_values_parsed() {
        let mut payload = example_payload();
        payload["sex"] = json!("Female");
        payload["cp"] = json!("Non-anginal pain");
        payload["thal"] = json!("Reversible defect");

        let record = validate(&payload).unwrap();
        assert_eq!(record.sex, Sex::Female);
        assert_eq!(record.chest_pain_type, ChestPain::NonAnginalPain);
        assert_eq!(record.thalassemia, Thalassemia::ReversibleDefect);
    }

    #[test]
    fn test_expected_values_rendering() {
        assert_eq!(expected_values(&["A"]), "'A'");
        assert_eq!(expected_values(&["A", "B"]), "'A' or 'B'");
        assert_eq!(expected_values(&["A", "B", "C"]), "'A', 'B' or 'C'");
    }
}
