use std::sync::Arc;

use robo_advisor_core::{
    allocation_for,
    errors::DomainError,
    telemetry::{TelemetryEvent, TelemetryOutcome, TelemetrySink},
    validate, DialogResponse, FulfillmentState, InvocationSource, LexEvent, LexMessage, SlotName,
    ValidationResult,
};

use crate::events::{EventContext, HandlerError, IntentHandler};

pub const RECOMMEND_PORTFOLIO_INTENT: &str = "recommendPortfolio";

/// Dialog management and fulfillment for the `recommendPortfolio` intent.
pub struct RecommendPortfolioHandler {
    telemetry: Arc<dyn TelemetrySink>,
}

impl RecommendPortfolioHandler {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { telemetry }
    }

    pub fn recommend_portfolio(
        &self,
        event: &LexEvent,
        ctx: &EventContext,
    ) -> Result<DialogResponse, HandlerError> {
        let mut slots = event.current_intent.slots.clone();
        let mut session_attributes = event.session_attributes.clone();
        let validation = validate(event);

        match event.invocation_source {
            InvocationSource::DialogCodeHook => {
                if let ValidationResult {
                    violated_slot: Some(slot), message: Some(message), ..
                } = validation
                {
                    slots.clear(slot);
                    self.emit(
                        telemetry_event(event, ctx, "lex.slot.rejected", TelemetryOutcome::Rejected)
                            .with_metadata("violated_slot", slot.as_str()),
                    );
                    return Ok(DialogResponse::elicit_slot(
                        session_attributes,
                        &event.current_intent.name,
                        slots,
                        slot,
                        message,
                    ));
                }

                if let Some(risk_level) = slots.risk_level.as_deref() {
                    let allocation = allocation_for(risk_level)?;
                    session_attributes.insert("bonds".to_owned(), allocation.bonds.into());
                    session_attributes.insert("equities".to_owned(), allocation.equities.into());
                }

                self.emit(telemetry_event(
                    event,
                    ctx,
                    "lex.dialog.delegated",
                    TelemetryOutcome::Success,
                ));
                Ok(DialogResponse::delegate(session_attributes, slots))
            }
            InvocationSource::FulfillmentCodeHook => {
                let risk_level = slots
                    .get(SlotName::RiskLevel)
                    .ok_or(DomainError::MissingSlot(SlotName::RiskLevel))?;
                let allocation = allocation_for(risk_level)?;

                self.emit(
                    telemetry_event(event, ctx, "lex.dialog.closed", TelemetryOutcome::Success)
                        .with_metadata("bonds", allocation.bonds.to_string())
                        .with_metadata("equities", allocation.equities.to_string()),
                );
                Ok(DialogResponse::close(
                    session_attributes,
                    FulfillmentState::Fulfilled,
                    LexMessage::plain_text(allocation.recommendation()),
                ))
            }
        }
    }

    fn emit(&self, event: TelemetryEvent) {
        self.telemetry.emit(event);
    }
}

impl IntentHandler for RecommendPortfolioHandler {
    fn intent_name(&self) -> &'static str {
        RECOMMEND_PORTFOLIO_INTENT
    }

    fn handle(
        &self,
        event: &LexEvent,
        ctx: &EventContext,
    ) -> Result<DialogResponse, HandlerError> {
        self.recommend_portfolio(event, ctx).map_err(|error| {
            self.emit(
                telemetry_event(event, ctx, "lex.dialog.failed", TelemetryOutcome::Failed)
                    .with_metadata("error", error.to_string()),
            );
            error
        })
    }
}

fn telemetry_event(
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
