pub mod api;
pub mod config;
pub mod core_state;
pub mod safety; // Interaction + burden engine

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Process entry point: load the knowledge base, then serve the API until Ctrl-C.
///
/// A knowledge base that fails validation stops startup; there is no
/// degraded mode.
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = start() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn start() -> Result<(), String> {
    let settings = config::Settings::from_env()?;

    let core = core_state::CoreState::load(settings.knowledge_source.clone())
        .map_err(|e| format!("Knowledge base failed validation: {e}"))?;
    let status = core.knowledge().map_err(|e| e.to_string())?.status();
    tracing::info!(
        version = %status.version,
        drugs = status.drugs,
        aliases = status.aliases,
        drug_pair_rules = status.drug_pair_rules,
        class_pair_rules = status.class_pair_rules,
        critical_patterns = status.critical_patterns,
        source = ?settings.knowledge_source,
        "Knowledge base loaded"
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {e}"))?;

    runtime.block_on(async move {
        let mut server = api::start_api_server(Arc::new(core), settings.bind_addr).await?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        server.shutdown();
        server.join().await;
        Ok(())
    })
}
