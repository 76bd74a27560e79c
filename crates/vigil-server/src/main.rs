mod config;
mod http;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use vigil_adapters::clock::SystemClock;
use vigil_adapters::persistence::sqlite::SqliteDb;
use vigil_app::alert_service::AlertService;
use vigil_app::scheduler::EscalationScheduler;
use vigil_core::escalation::PolicyRegistry;
use vigil_ports::outbound::Clock;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "vigil.toml".into());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    let db = SqliteDb::new(&config.database.url)
        .await
        .with_context(|| format!("opening database {}", config.database.url))?;

    let policies = config.build_policies()?;
    let suppression_rules = config.build_suppression_rules()?;
    let notifiers = config.build_notifiers()?;
    tracing::info!(
        policies = policies.len(),
        suppression_rules = suppression_rules.len(),
        channels = notifiers.len(),
        "configuration loaded"
    );

    let service: Arc<http::Service> = Arc::new(AlertService::new(
        db.clone(),
        db.clone(),
        db,
        PolicyRegistry::new(policies),
        suppression_rules,
        notifiers,
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = EscalationScheduler::new(service.clone(), clock.clone())
        .with_poll_interval(Duration::from_secs(config.server.poll_interval_secs.max(1)));
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    let app = http::router(http::AppState { service, clock });
    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    tracing::info!(listen = %config.server.listen, "vigil listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    scheduler_handle.await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
