use remora::Converter;
use remora_server::{AppState, build_router};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    tracing::info!("starting remora-server");

    // Discovery probes external processes and is blocking; it runs once, before the
    // listener is up.
    let converter = tokio::task::spawn_blocking(Converter::discover)
        .await
        .map_err(|err| std::io::Error::other(format!("discovery task panicked: {err}")))?;
    if converter.is_available() {
        if let Some(candidate) = converter.active_candidate() {
            tracing::info!(candidate = %candidate.label(), "Mermaid CLI available");
        }
    } else {
        tracing::warn!("Mermaid CLI not available; conversions will return placeholder images");
    }

    let state = AppState::new(converter, "uploads", "outputs")?;
    let app = build_router(state);

    let host = std::env::var("REMORA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("REMORA_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;

    tracing::info!("listening on {host}:{port}");
    tracing::info!("endpoints:");
    tracing::info!("  - GET  /api/health");
    tracing::info!("  - GET  /api/check-dependencies");
    tracing::info!("  - POST /api/convert");
    tracing::info!("  - POST /api/convert-file");
    tracing::info!("  - GET  /api/examples");

    axum::serve(listener, app).await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,remora=debug,remora_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
