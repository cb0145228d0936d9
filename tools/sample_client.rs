//! Sample Prediction Client
//!
//! Generates random patient records and posts them to a running heart risk
//! service, logging the returned risk distribution.

use heart_risk_service::types::{
    Categorical, ChestPain, PatientRecord, PredictionResult, RestingEcg, RiskLevel, Sex, StSlope,
    Thalassemia, YesNo,
};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Patient generator for exercising the service
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a patient with a typical, low-risk looking profile
    fn generate_typical(&mut self) -> PatientRecord {
        PatientRecord {
            age: self.rng.gen_range(29..60),
            sex: self.random_choice(),
            chest_pain_type: self.random_choice_of(&[
                ChestPain::AtypicalAngina,
                ChestPain::NonAnginalPain,
            ]),
            resting_blood_pressure: self.rng.gen_range(100.0..135.0_f64).round(),
            cholesterol: self.rng.gen_range(160.0..240.0_f64).round(),
            fasting_blood_sugar_high: YesNo::No,
            resting_ecg: RestingEcg::Normal,
            max_heart_rate_achieved: self.rng.gen_range(140.0..200.0_f64).round(),
            exercise_induced_angina: YesNo::No,
            st_depression: (self.rng.gen_range(0.0..1.0_f64) * 10.0).round() / 10.0,
            st_slope: StSlope::Upsloping,
            num_major_vessels: 0.0,
            thalassemia: Thalassemia::Normal,
        }
    }

    /// Generate a patient with a high-risk looking profile
    fn generate_high_risk(&mut self) -> PatientRecord {
        PatientRecord {
            age: self.rng.gen_range(55..78),
            sex: Sex::Male,
            chest_pain_type: ChestPain::Asymptomatic,
            resting_blood_pressure: self.rng.gen_range(135.0..190.0_f64).round(),
            cholesterol: self.rng.gen_range(240.0..400.0_f64).round(),
            fasting_blood_sugar_high: self.random_choice(),
            resting_ecg: self.random_choice_of(&[
                RestingEcg::StTAbnormality,
                RestingEcg::LvHypertrophy,
            ]),
            max_heart_rate_achieved: self.rng.gen_range(90.0..140.0_f64).round(),
            exercise_induced_angina: YesNo::Yes,
            st_depression: (self.rng.gen_range(1.5..4.5_f64) * 10.0).round() / 10.0,
            st_slope: self.random_choice_of(&[StSlope::Flat, StSlope::Downsloping]),
            num_major_vessels: self.rng.gen_range(1..4) as f64,
            thalassemia: self.random_choice_of(&[
                Thalassemia::FixedDefect,
                Thalassemia::ReversibleDefect,
            ]),
        }
    }

    fn random_choice<T: Categorical>(&mut self) -> T {
        self.random_choice_of(T::ALL)
    }

    fn random_choice_of<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_client=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).map(String::as_str) == Some("--example") {
        println!(
            "{}",
            serde_json::to_string_pretty(&PatientRecord::example())?
        );
        return Ok(());
    }

    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_risk_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.3)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(50);

    info!(
        base_url = %base_url,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Starting sample client"
    );

    let client = reqwest::Client::new();

    let health = client.get(format!("{}/health", base_url)).send().await?;
    info!(status = %health.status(), "Health check");

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    let mut low = 0u64;
    let mut high = 0u64;
    let mut failed = 0u64;

    for i in 0..count {
        let patient = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_typical()
        };

        let response = client
            .post(format!("{}/predict", base_url))
            .json(&patient)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let result: PredictionResult = response.json().await?;
            match result.risk {
                RiskLevel::Low => low += 1,
                RiskLevel::High => high += 1,
            }
        } else {
            failed += 1;
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Prediction request failed");
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} patients ({} low, {} high, {} failed)",
                i + 1,
                count,
                low,
                high,
                failed
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} patients ({} low, {} high, {} failed)",
        count, low, high, failed
    );

    Ok(())
}
