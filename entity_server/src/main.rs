//! Entity server: reads settings from the environment, opens the configured data
//! context and serves the entity controller plus health routes.
//!
//! Run from repo root: `cargo run -p entity-server`
//! In-memory without PostgreSQL: `DATA_CONTEXT=memory cargo run -p entity-server`

use entity_crud::{open_context, router, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_crud=info,entity_server=info,tower_http=info")),
        )
        .init();

    let context = open_context(&settings).await?;
    let state = AppState::new(context, settings.base_path.as_str());
    let app = router(state, settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(
        base_path = %settings.base_path,
        "listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
