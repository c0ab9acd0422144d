mod seed;

use std::sync::Arc;

use api::{AppState, resources::memory_store, router};
use auth::{AuthService, LogMailer, TokenService};
use chrono::Duration;
use devcamper_core::{AppConfig, init_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, overrides) = AppConfig::load_with_env()?;
    init_tracing(config.server.log_filter.as_deref());
    if !overrides.is_empty() {
        info!(?overrides, "configuration overridden from environment");
    }

    let store = Arc::new(memory_store());
    let mailer = Arc::new(LogMailer::new(&config.mail.from_name, &config.mail.from_email));
    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_expiry_seconds);
    let auth = AuthService::new(store.clone(), tokens, mailer)
        .with_reset_ttl(Duration::seconds(config.auth.reset_token_expiry_seconds));

    let report = seed::run(store.as_ref(), &auth, &config.seed).await?;
    info!(
        bootcamps = report.bootcamps,
        courses = report.courses,
        reviews = report.reviews,
        users = report.users,
        "seeded store"
    );

    let state = Arc::new(AppState::new(store, auth));
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
