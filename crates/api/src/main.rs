mod config;
mod metrics;

use std::process::ExitCode;
use std::sync::Arc;

use annotate::{ConverterOptions, DocumentConverter, Request, RequestType, Response};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use clap::Parser;
use engine::{BaselineEngine, EngineConfig};
use serde::Serialize;
use service::{AnalysisGuard, EngineLoader, RequestDispatcher};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::{AppConfig, Cli};
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<RequestDispatcher<BaselineEngine>>,
    metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    engine: String,
    processed: usize,
    reloads: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli)?;
    let state = build_state(&config)?;
    let app = build_router(state, config.server.max_concurrent_calls);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(
        %address,
        max_concurrent_calls = config.server.max_concurrent_calls,
        max_parse_seconds = config.analysis.max_parse_seconds,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn build_state(config: &AppConfig) -> Result<AppState> {
    let engine_config = EngineConfig::with_max_parse_seconds(config.analysis.max_parse_seconds);
    let loader: EngineLoader<BaselineEngine> =
        Box::new(move || Ok(BaselineEngine::new(engine_config.clone())));
    let guard = Arc::new(AnalysisGuard::new(loader, config.analysis.reload_after)?);

    let converter = DocumentConverter::new(ConverterOptions {
        strict_dependencies: config.analysis.strict_dependencies,
    });

    Ok(AppState {
        dispatcher: Arc::new(RequestDispatcher::new(guard, converter)),
        metrics: Metrics::new(),
    })
}

fn build_router(state: AppState, max_concurrent_calls: usize) -> Router {
    Router::new()
        .route(
            "/process",
            post(process_document).layer(GlobalConcurrencyLimitLayer::new(max_concurrent_calls)),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn process_document(
    State(state): State<AppState>,
    Json(request): Json<Request>,
) -> Result<Json<Response>, StatusCode> {
    let request_id = Uuid::new_v4();
    let request_type = request.request_type;
    let documents = request.documents.len();
    let span = info_span!("process", %request_id, ?request_type, documents);

    let timer = TimedOperation::start();
    let dispatcher = Arc::clone(&state.dispatcher);
    let reload_span = span.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        dispatcher.process(request)
    })
    .await;

    match outcome {
        Ok(report) => {
            let elapsed = timer.elapsed();
            state.metrics.record_request(
                request_type == RequestType::Parse,
                documents,
                report.degraded,
                elapsed,
            );
            info!(
                %request_id,
                ?request_type,
                documents,
                degraded = report.degraded,
                elapsed_ms = elapsed.as_millis() as u64,
                "Request completed"
            );

            // Detached: the reply does not wait for in-flight readers to drain
            let dispatcher = Arc::clone(&state.dispatcher);
            tokio::task::spawn_blocking(move || {
                let _entered = reload_span.enter();
                dispatcher.maybe_reload()
            });
            Ok(Json(report.response))
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(%request_id, error = %e, "Processing task failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let guard = state.dispatcher.guard();
    Json(HealthResponse {
        status: "ok",
        engine: guard.engine_name(),
        processed: guard.processed(),
        reloads: guard.reloads(),
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received, draining in-flight calls");
}
