use std::sync::Arc;

use anyhow::Context;
use buddy_mentorship::{
    AppState, auth, config::Config, db, mail::Mailer, requests::notify::Notifier,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("buddy_mentorship=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_expiry_minutes,
        )));

    let db_pool = db::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;

    let clients = auth::Clients::from_file(&config.oauth_clients_path, &config.site_url)
        .map_err(|err| anyhow::anyhow!("loading OAuth clients: {err:?}"))?;
    let mailer = Mailer::from_config(&config)?;
    let notifier = Notifier::new(mailer, &config.site_url);

    let http_addr = config.http_addr;
    let app_state = AppState {
        db_pool,
        clients,
        notifier,
        config: Arc::new(config),
    };

    let app = buddy_mentorship::router()
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("binding {http_addr}"))?;
    tracing::info!(%http_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
