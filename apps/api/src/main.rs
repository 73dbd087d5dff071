mod config;
mod delivery;
mod errors;
mod form;
mod llm_client;
mod reports;
mod routes;
mod state;
mod submission;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::delivery::{HttpPdfRenderer, SmtpMailer};
use crate::form::session::spawn_expiry_task;
use crate::form::{SessionStore, StepCatalog};
use crate::llm_client::LlmClient;
use crate::reports::LlmReportGenerator;
use crate::routes::build_router;
use crate::state::AppState;
use crate::submission::SubmissionPipeline;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Holland Bridge API v{}", env!("CARGO_PKG_VERSION"));

    // Step catalog: built once, read-only for the life of the process
    let catalog = Arc::new(StepCatalog::holland_bridge(config.admired_life_slots)?);
    info!(
        "Step catalog loaded: {} steps, {} admired-life slots",
        catalog.len(),
        catalog.admired_life_slots()
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.llm_settings())?;
    info!("LLM client initialized (model: {})", llm.model());

    let renderer = HttpPdfRenderer::new(&config.pdf_renderer_url, config.external_call_timeout)?;
    info!("PDF renderer: {}", config.pdf_renderer_url);

    let mailer = SmtpMailer::new(config.smtp_settings());
    info!("SMTP relay: {}:{}", config.smtp_host, config.smtp_port);

    let pipeline = SubmissionPipeline::new(
        Arc::new(LlmReportGenerator::new(llm)),
        Arc::new(renderer),
        Arc::new(mailer),
        config.external_call_timeout,
    );

    let sessions = SessionStore::new(catalog, config.session_idle_ttl);
    spawn_expiry_task(sessions.clone(), SESSION_SWEEP_INTERVAL);
    info!(
        "Sessions expire after {}s idle",
        config.session_idle_ttl.as_secs()
    );

    // Build app state
    let state = AppState { sessions, pipeline };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the form's origin once it is hosted

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
