//! Robo Advisor core: dialog wire types, slot validation, and the risk
//! allocation table shared by the Lex handler, the HTTP server, and the CLI.

pub mod advisor;
pub mod config;
pub mod domain;
pub mod errors;
pub mod telemetry;

pub use advisor::{
    allocation_for, validate, validate_slots, verify_allocation_table, Allocation, ParsedNumber,
    RiskLevel, ValidationResult,
};
pub use domain::dialog::{
    BotInfo, ContentType, CurrentIntent, DialogAction, DialogResponse, FulfillmentState,
    InvocationSource, LexEvent, LexMessage, SessionAttributes, SlotName, Slots,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use telemetry::{
    InMemoryTelemetrySink, TelemetryEvent, TelemetryOutcome, TelemetrySink, TracingTelemetrySink,
};
