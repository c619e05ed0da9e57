//! # thermopland — thermoplan daemon
//!
//! Composition root that wires all adapters together and starts the
//! scheduler.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Construct the JSON store, the virtual device fleet, and the event bus
//! - Construct the reconciliation coordinator and load persisted state
//! - Spawn the periodic tick loop
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use thermoplan_adapter_climate_virtual::VirtualClimate;
use thermoplan_adapter_http_axum::state::AppState;
use thermoplan_adapter_storage_json::JsonScheduleStore;
use thermoplan_app::coordinator::{Coordinator, CoordinatorConfig};
use thermoplan_app::event_bus::InProcessEventBus;
use thermoplan_app::ports::SystemClock;
use thermoplan_domain::id::EntityId;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Storage
    let store = Arc::new(JsonScheduleStore::new(&config.storage.path));

    // Device layer — the virtual fleet stands in for real hardware.
    let actuator = Arc::new(VirtualClimate::new());
    let demo_entities: Vec<EntityId> = if config.demo.enabled {
        config
            .demo
            .devices
            .iter()
            .filter_map(|raw| match EntityId::new(raw.clone()) {
                Ok(entity) => Some(entity),
                Err(err) => {
                    tracing::warn!(device = %raw, error = %err, "skipping invalid demo device id");
                    None
                }
            })
            .collect()
    } else {
        Vec::new()
    };
    for entity in &demo_entities {
        actuator.register_standard(entity.clone());
    }

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Coordinator
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&actuator),
        Arc::clone(&store),
        Arc::clone(&event_bus),
        SystemClock,
        CoordinatorConfig {
            tick_interval: Duration::from_secs(config.scheduler.tick_interval_secs),
            actuation_timeout: Duration::from_secs(config.scheduler.actuation_timeout_secs),
        },
    ));
    coordinator.load().await?;
    for entity in &demo_entities {
        coordinator.track_entity(entity).await?;
    }
    coordinator.force_update_all().await;

    tracing::info!(
        interval_secs = config.scheduler.tick_interval_secs,
        "starting reconciliation loop"
    );
    tokio::spawn(Arc::clone(&coordinator).run());

    // HTTP
    let state = AppState::new(coordinator, event_bus);
    let app = thermoplan_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "thermopland listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
