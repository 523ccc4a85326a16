//! Lex integration: routes dialog code hook events to intent handlers.
//!
//! ```text
//! Lex event → handle_event → IntentDispatcher → RecommendPortfolioHandler
//!                                                   ↓
//!                        ElicitSlot | Delegate | Close  ← validate + allocation
//! ```
//!
//! # Key Types
//!
//! - `IntentDispatcher` - Routes events by `currentIntent.name`
//! - `IntentHandler` - Trait implemented per supported intent
//! - `RecommendPortfolioHandler` - Slot validation and portfolio recommendation

pub mod events;
pub mod portfolio;

pub use events::{
    default_dispatcher, handle_event, DispatchError, EventContext, HandlerError, IntentDispatcher,
    IntentHandler,
};
pub use portfolio::{RecommendPortfolioHandler, RECOMMEND_PORTFOLIO_INTENT};
