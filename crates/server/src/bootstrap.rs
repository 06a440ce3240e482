use std::sync::Arc;

use tablemate_agent::{guardrails::BookingPolicy, runtime::AgentRuntime};
use tablemate_core::audit::{AuditEvent, AuditSink};
use tablemate_core::catalog::Catalog;
use tablemate_core::config::AppConfig;
use tablemate_core::errors::ApplicationError;
use tablemate_core::store::RestaurantStore;
use thiserror::Error;
use tracing::info;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RestaurantStore>,
    pub runtime: Arc<AgentRuntime>,
    pub default_restaurant: String,
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog could not be loaded: {0}")]
    Catalog(#[source] ApplicationError),
    #[error("default restaurant `{0}` is not in the catalog")]
    UnknownDefaultRestaurant(String),
}

/// Forwards audit events to the tracing pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        info!(
            event_name = "audit.event",
            audit_event_id = %event.event_id,
            audit_event_type = %event.event_type,
            category = ?event.category,
            outcome = ?event.outcome,
            correlation_id = %event.correlation_id,
            restaurant = event.restaurant.as_deref().unwrap_or("unknown"),
            session_id = event.session_id.as_deref().unwrap_or("unknown"),
            actor = %event.actor,
            metadata = %metadata,
            "audit event recorded"
        );
    }
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load(path).map_err(BootstrapError::Catalog)?,
        None => Catalog::builtin(),
    };
    if catalog.find(&config.catalog.default_restaurant).is_none() {
        return Err(BootstrapError::UnknownDefaultRestaurant(
            config.catalog.default_restaurant.clone(),
        ));
    }
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        restaurants = catalog.restaurants.len(),
        source = if config.catalog.path.is_some() { "file" } else { "builtin" },
        "restaurant catalog loaded"
    );

    let store = RestaurantStore::from_catalog(catalog, config.booking.wait_estimator());
    let runtime =
        AgentRuntime::new(BookingPolicy::from(&config.booking), Arc::new(TracingAuditSink));
    let state = AppState {
        store: Arc::new(store),
        runtime: Arc::new(runtime),
        default_restaurant: config.catalog.default_restaurant.clone(),
    };

    Ok(Application { config, state })
}
