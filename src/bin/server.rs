use clap::Parser;
use empulse::core::narration::Pacing;
use empulse::utils::{logger, validation::Validate};
use empulse::web::{self, AppState, EventHub, WorkerContext, WorkerPool};
use empulse::{GeminiClient, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    logger::init_server_logger();

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let model = match GeminiClient::from_env(&config.api_base, &config.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.chart_dir).await?;

    let hub = EventHub::new();
    let pool = WorkerPool::spawn(
        config.workers,
        config.queue_depth,
        WorkerContext {
            model: Arc::new(model),
            hub: hub.clone(),
            chart_dir: config.chart_dir.clone(),
            pacing: Pacing::default(),
        },
    );

    let app = web::router(AppState {
        hub,
        pool,
        upload_dir: config.upload_dir.clone(),
        chart_dir: config.chart_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        "🚀 Server listening on {} ({} workers, queue depth {})",
        config.bind,
        config.workers,
        config.queue_depth
    );

    axum::serve(listener, app).await?;

    Ok(())
}
