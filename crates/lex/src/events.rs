use std::{collections::HashMap, sync::Arc};

use robo_advisor_core::{
    errors::{ApplicationError, DomainError},
    telemetry::{TelemetryEvent, TelemetryOutcome, TelemetrySink},
    DialogResponse, LexEvent,
};
use thiserror::Error;

use crate::portfolio::RecommendPortfolioHandler;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("intent with name `{intent_name}` not supported")]
    UnsupportedIntent { intent_name: String },
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl From<DispatchError> for ApplicationError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::UnsupportedIntent { intent_name } => {
                Self::UnsupportedIntent { intent_name }
            }
            DispatchError::Handler(HandlerError::Domain(error)) => Self::Domain(error),
        }
    }
}

pub trait IntentHandler: Send + Sync {
    fn intent_name(&self) -> &'static str;
    fn handle(
        &self,
        event: &LexEvent,
        ctx: &EventContext,
    ) -> Result<DialogResponse, HandlerError>;
}

/// Routes events to handlers by intent name. Routing outcomes go to the
/// injected sink alongside the handlers' own telemetry.
pub struct IntentDispatcher {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl IntentDispatcher {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { handlers: HashMap::new(), telemetry }
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: IntentHandler + 'static,
    {
        self.handlers.insert(handler.intent_name().to_owned(), Arc::new(handler));
    }

    pub fn dispatch(
        &self,
        event: &LexEvent,
        ctx: &EventContext,
    ) -> Result<DialogResponse, DispatchError> {
        let intent_name = event.current_intent.name.as_str();

        let Some(handler) = self.handlers.get(intent_name) else {
            self.telemetry.emit(
                routing_event(event, ctx, "lex.dispatch.unsupported_intent", TelemetryOutcome::Failed)
                    .with_metadata("supported_intents", self.supported_intents().join(",")),
            );
            return Err(DispatchError::UnsupportedIntent { intent_name: intent_name.to_owned() });
        };

        handler.handle(event, ctx).map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn supported_intents(&self) -> Vec<&str> {
        let mut intents: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        intents.sort_unstable();
        intents
    }
}

pub fn default_dispatcher(telemetry: Arc<dyn TelemetrySink>) -> IntentDispatcher {
    let mut dispatcher = IntentDispatcher::new(telemetry.clone());
    dispatcher.register(RecommendPortfolioHandler::new(telemetry));
    dispatcher
}

/// Entry point for one platform event: records which bot invoked us and
/// forwards to the dispatcher.
pub fn handle_event(
    dispatcher: &IntentDispatcher,
    event: &LexEvent,
    ctx: &EventContext,
) -> Result<DialogResponse, DispatchError> {
    dispatcher.telemetry.emit(
        routing_event(event, ctx, "lex.event.received", TelemetryOutcome::Success)
            .with_metadata("bot_name", event.bot.name.as_str())
            .with_metadata("invocation_source", format!("{:?}", event.invocation_source)),
    );

    dispatcher.dispatch(event, ctx)
}

fn routing_event(
    event: &LexEvent,
    ctx: &EventContext,
    event_name: &str,
    outcome: TelemetryOutcome,
) -> TelemetryEvent {
    TelemetryEvent::new(
        event_name,
        ctx.correlation_id.clone(),
        event.user_id.clone(),
        event.current_intent.name.clone(),
        outcome,
    )
}
