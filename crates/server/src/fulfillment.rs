use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use robo_advisor_core::{errors::ApplicationError, DialogResponse, InterfaceError, LexEvent};
use robo_advisor_lex::{handle_event, EventContext, IntentDispatcher};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const FULFILLMENT_PATH: &str = "/v1/lex/fulfillment";

#[derive(Clone)]
pub struct LexState {
    dispatcher: Arc<IntentDispatcher>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

impl From<&InterfaceError> for ErrorBody {
    fn from(value: &InterfaceError) -> Self {
        Self {
            error: value.code().to_string(),
            message: value.message().to_string(),
            correlation_id: value.correlation_id().to_string(),
        }
    }
}

pub fn router(dispatcher: Arc<IntentDispatcher>) -> Router {
    Router::new().route(FULFILLMENT_PATH, post(fulfill)).with_state(LexState { dispatcher })
}

/// Code hook endpoint: one dialog event in, one dialog response out.
/// Bodies that are not a valid dialog event get a 400 `ErrorBody`.
pub async fn fulfill(
    State(state): State<LexState>,
    payload: Result<Json<LexEvent>, JsonRejection>,
) -> Result<Json<DialogResponse>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let event = match payload {
        Ok(Json(event)) => event,
        Err(rejection) => {
            warn!(
                event_name = "lex.fulfillment.rejected_body",
                correlation_id = %correlation_id,
                status = rejection.status().as_u16(),
                error = %rejection.body_text(),
                "request body is not a dialog event"
            );
            let body = ErrorBody {
                error: "bad_request".to_string(),
                message: rejection.body_text(),
                correlation_id,
            };
            return Err((StatusCode::BAD_REQUEST, Json(body)));
        }
    };
    let ctx = EventContext::new(correlation_id.clone());

    match handle_event(&state.dispatcher, &event, &ctx) {
        Ok(response) => {
            info!(
                event_name = "lex.fulfillment.responded",
                correlation_id = %correlation_id,
                user_id = %event.user_id,
                intent_name = %event.current_intent.name,
                dialog_action = response.action_type(),
                "dialog response returned"
            );
            Ok(Json(response))
        }
        Err(error) => {
            let interface = ApplicationError::from(error).into_interface(correlation_id);
            warn!(
                event_name = "lex.fulfillment.failed",
                correlation_id = %interface.correlation_id(),
                user_id = %event.user_id,
                intent_name = %event.current_intent.name,
                error = %interface,
                "dialog event could not be handled"
            );

            let status = match interface {
                InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
                InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorBody::from(&interface))))
        }
    }
}
