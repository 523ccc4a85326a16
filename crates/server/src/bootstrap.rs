use std::sync::Arc;

use robo_advisor_core::{
    config::AppConfig,
    errors::DomainError,
    verify_allocation_table, TracingTelemetrySink,
};
use robo_advisor_lex::{default_dispatcher, IntentDispatcher};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub dispatcher: Arc<IntentDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("allocation table failed startup verification: {0}")]
    AllocationTable(#[from] DomainError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    verify_allocation_table()?;
    info!(
        event_name = "system.bootstrap.allocation_table_verified",
        correlation_id = "bootstrap",
        "risk allocation table verified"
    );

    let dispatcher = default_dispatcher(Arc::new(TracingTelemetrySink));
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        intents = ?dispatcher.supported_intents(),
        "intent dispatcher ready"
    );

    Ok(Application { config, dispatcher: Arc::new(dispatcher) })
}
