//! Heart Risk Service - Main Entry Point
//!
//! Loads the trained pipeline once, then serves `GET /health` and
//! `POST /predict` until interrupted.

use anyhow::{Context, Result};
use heart_risk_service::{
    api::{self, AppState},
    config::AppConfig,
    metrics::{MetricsReporter, ServiceMetrics},
    models::InferenceEngine,
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.logging)?;

    info!("Starting Heart Risk Service");
    info!(
        bind = %config.server.bind_address(),
        model = %config.model.path,
        onnx_threads = config.model.onnx_threads,
        "Configuration loaded"
    );
    if config.server.expose_error_details {
        warn!("Inference error details will be returned to clients");
    }

    // No request can succeed without the model
    let engine = InferenceEngine::from_config(&config.model).with_context(|| {
        format!("Failed to load model artifact from {}", config.model.path)
    })?;
    info!(model = %engine.model_name(), "Model ready");

    let metrics = Arc::new(ServiceMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(engine, metrics.clone())
        .with_error_details(config.server.expose_error_details);
    let app = api::router(state);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
