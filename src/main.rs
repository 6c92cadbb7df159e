use fileshed::app;
use fileshed::state::{AppState, MIGRATOR};
use fileshed::thumbs::{worker, ThumbnailQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fileshed=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (thumbs, jobs) = ThumbnailQueue::new();
    let state = AppState::init(thumbs).await?;

    if let Err(e) = MIGRATOR.run(&state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    tokio::spawn(worker::run(state.clone(), jobs));

    let config = state.config.clone();
    let app = app::build_app(state);
    app::serve(app, &config).await
}
