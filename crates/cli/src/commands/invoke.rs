use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use robo_advisor_core::{errors::ApplicationError, InterfaceError, LexEvent, TracingTelemetrySink};
use robo_advisor_lex::{default_dispatcher, handle_event, EventContext};

use super::CommandResult;

const COMMAND: &str = "invoke";

/// Reads the event from `event_path`, or stdin when the path is absent or `-`.
pub fn run(event_path: Option<&Path>) -> CommandResult {
    let raw = match event_path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .map_err(|error| format!("could not read event file `{}`: {error}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map(|_| buffer)
                .map_err(|error| format!("could not read event from stdin: {error}"))
        }
    };

    match raw {
        Ok(raw) => run_with_input(&raw),
        Err(message) => CommandResult::failure(COMMAND, "event_read", message, 2),
    }
}

pub fn run_with_input(raw_event: &str) -> CommandResult {
    let event: LexEvent = match serde_json::from_str(raw_event) {
        Ok(event) => event,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "event_parse",
                format!("event is not a valid dialog request: {error}"),
                2,
            );
        }
    };

    let dispatcher = default_dispatcher(Arc::new(TracingTelemetrySink));
    let ctx = EventContext::new(format!("cli-{}", event.user_id));

    match handle_event(&dispatcher, &event, &ctx) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure(
                COMMAND,
                "serialization",
                format!("could not serialize dialog response: {error}"),
                1,
            ),
        },
        Err(error) => {
            let application_error = ApplicationError::from(error);
            let error_class = match &application_error {
                ApplicationError::UnsupportedIntent { .. } => "unsupported_intent",
                ApplicationError::Domain(_) => "invalid_argument",
            };
            let interface = application_error.into_interface(ctx.correlation_id);
            let exit_code = match interface {
                InterfaceError::BadRequest { .. } => 1,
                InterfaceError::Internal { .. } => 3,
            };
            CommandResult::failure(COMMAND, error_class, interface.message(), exit_code)
        }
    }
}
