use std::sync::Arc;

use anyhow::Context;

use ussd_engine::config::UssdConfig;
use ussd_engine::gateway::{GatewayFacade, HttpGateway, PlatformGateway};
use ussd_engine::handler::UssdHandler;
use ussd_engine::routes::ussd_routes;
use ussd_engine::session::{self, InMemorySessionStore, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = UssdConfig::from_env().context("invalid configuration")?;

    eprintln!("📱 USSD Engine v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Callback: http://{}/ussd/callback", config.bind_addr);
    eprintln!("   Gateway: {}", config.gateway.base_url);
    eprintln!(
        "   Session timeout: {} min",
        config.session_timeout.as_secs() / 60
    );
    eprintln!(
        "   Retries: {} attempts, connect {} ms, read {} ms",
        config.gateway.max_attempts,
        config.gateway.connect_timeout.as_millis(),
        config.gateway.read_timeout.as_millis(),
    );

    // ── Sessions ────────────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = InMemorySessionStore::new(config.session_timeout);
    let _sweep_handle = session::spawn_expiry_task(Arc::clone(&store), config.sweep_interval);

    // ── Collaborators ───────────────────────────────────────────────────
    let http: Arc<dyn PlatformGateway> =
        Arc::new(HttpGateway::new(&config.gateway).context("failed to build HTTP client")?);
    let facade = Arc::new(GatewayFacade::new(
        http,
        config.gateway.registration_cache_ttl,
    ));

    // ── Server ──────────────────────────────────────────────────────────
    let handler = Arc::new(UssdHandler::new(store, facade));
    let app = ussd_routes(handler);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "USSD callback server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
