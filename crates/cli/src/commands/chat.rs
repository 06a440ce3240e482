//! Interactive chat session against an in-process restaurant store.
//!
//! The REPL plays the caller role: it keeps the phase, booking draft and
//! reservation history between turns, exactly as a web session would.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tablemate_agent::guardrails::BookingPolicy;
use tablemate_agent::responses::TurnResponse;
use tablemate_agent::runtime::{AgentRuntime, ChatTurn};
use tablemate_core::audit::NoopAuditSink;
use tablemate_core::config::{AppConfig, LoadOptions};
use tablemate_core::domain::reservation::Reservation;
use tablemate_core::errors::ApplicationError;
use tablemate_core::flows::{BookingDraft, Phase};
use tablemate_core::store::RestaurantStore;

use crate::commands::{load_catalog, CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_IO, EXIT_NOT_FOUND};

const QUIT_WORDS: &[&str] = &["quit", "exit", "/q"];

#[derive(Debug, Default)]
pub struct ChatSession {
    pub phase: Phase,
    pub draft: BookingDraft,
    pub reservations: Vec<Reservation>,
    turns: u64,
}

impl ChatSession {
    /// Runs one turn and keeps whatever state the runtime hands back.
    pub fn send(
        &mut self,
        runtime: &AgentRuntime,
        store: &RestaurantStore,
        restaurant: &str,
        message: &str,
    ) -> Result<TurnResponse, ApplicationError> {
        self.turns += 1;
        let turn = ChatTurn::new(message, restaurant)
            .with_state(self.phase, self.draft.clone())
            .with_reservations(self.reservations.clone())
            .with_correlation_id(format!("cli-{}", self.turns));

        let outcome = runtime.process_message(store, turn)?;
        self.phase = outcome.next_phase;
        self.draft = outcome.draft;
        self.reservations = outcome.reservations;
        Ok(outcome.response)
    }
}

pub fn run(restaurant: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };
    let catalog = match load_catalog(&config) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("chat", "catalog_load", error.to_string(), EXIT_CATALOG)
        }
    };

    let restaurant = restaurant.unwrap_or(&config.catalog.default_restaurant).to_string();
    if catalog.find(&restaurant).is_none() {
        return CommandResult::failure(
            "chat",
            "not_found",
            format!("unknown restaurant `{restaurant}` (known: {})", catalog.names().join(", ")),
            EXIT_NOT_FOUND,
        );
    }

    let store = RestaurantStore::from_catalog(catalog, config.booking.wait_estimator());
    let runtime = AgentRuntime::new(BookingPolicy::from(&config.booking), Arc::new(NoopAuditSink));
    let stdin = io::stdin();
    let stdout = io::stdout();

    match repl(&runtime, &store, &restaurant, stdin.lock(), stdout.lock()) {
        Ok(session) => CommandResult::success(
            "chat",
            format!(
                "session ended after {} turns with {} reservations",
                session.turns,
                session.reservations.len()
            ),
        ),
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), EXIT_IO),
    }
}

/// Reads one message per line until EOF or a quit word. Blank lines are
/// skipped rather than sent.
pub fn repl(
    runtime: &AgentRuntime,
    store: &RestaurantStore,
    restaurant: &str,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<ChatSession> {
    let mut session = ChatSession::default();
    writeln!(output, "Chatting with {restaurant}. Type `quit` to leave.")?;

    for line in input.lines() {
        let line = line?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&message.to_lowercase().as_str()) {
            break;
        }

        match session.send(runtime, store, restaurant, message) {
            Ok(response) => writeln!(output, "{}", render(&response))?,
            Err(error) => writeln!(output, "! {error}")?,
        }
    }

    Ok(session)
}

pub fn render(response: &TurnResponse) -> String {
    let mut lines = vec![response.message().replace("**", "")];

    match response {
        TurnResponse::Menu { menu, .. } => {
            for item in menu {
                let tags = if item.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", item.tags.join(", "))
                };
                lines.push(format!("  - {} ${}: {}{tags}", item.name, item.price, item.description));
            }
        }
        TurnResponse::Success { details, notification_text, .. } => {
            lines.extend(details.iter().map(|field| format!("  {}: {}", field.label, field.value)));
            lines.push(format!("  sms> {notification_text}"));
        }
        TurnResponse::Confirm { details, .. } => {
            lines.extend(details.iter().map(|field| format!("  {}: {}", field.label, field.value)));
        }
        TurnResponse::Reservations { reservations, .. } => {
            lines.extend(reservations.iter().map(|reservation| {
                format!(
                    "  - {} {} at {} for {} (table {})",
                    reservation.confirmation_code,
                    reservation.date,
                    reservation.time,
                    reservation.party_size,
                    reservation.table_id
                )
            }));
        }
        _ => {}
    }

    let chips = response.chip_labels();
    if !chips.is_empty() {
        lines.push(
            chips.iter().map(|chip| format!("[{chip}]")).collect::<Vec<_>>().join(" "),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use tablemate_agent::guardrails::BookingPolicy;
    use tablemate_agent::responses::TurnResponse;
    use tablemate_agent::runtime::AgentRuntime;
    use tablemate_core::audit::NoopAuditSink;
    use tablemate_core::catalog::Catalog;
    use tablemate_core::domain::waitlist::WaitEstimator;
    use tablemate_core::flows::Phase;
    use tablemate_core::store::RestaurantStore;

    use super::{render, repl};

    fn fixtures() -> (AgentRuntime, RestaurantStore) {
        (
            AgentRuntime::new(BookingPolicy::default(), Arc::new(NoopAuditSink)),
            RestaurantStore::from_catalog(Catalog::builtin(), WaitEstimator::default()),
        )
    }

    #[test]
    fn scripted_session_books_a_table() {
        let (runtime, store) = fixtures();
        let script = "hello\nbook a table\n\nMaya\n2\nTonight\n7pm\nNo special requests\nyes\nquit\nhello\n";
        let mut output = Vec::new();

        let session = repl(&runtime, &store, "Trattoria Roma", Cursor::new(script), &mut output)
            .expect("repl runs");

        let transcript = String::from_utf8(output).expect("utf8");
        assert!(transcript.contains("Reservation confirmed!"));
        assert!(transcript.contains("sms> TableMate: Reservation confirmed!"));
        assert_eq!(session.reservations.len(), 1);
        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(store.stats()["Trattoria Roma"].reserved, 1);
    }

    #[test]
    fn runtime_errors_are_printed_not_fatal() {
        let (runtime, store) = fixtures();
        let mut output = Vec::new();

        let session = repl(&runtime, &store, "Nowhere", Cursor::new("hello\n"), &mut output)
            .expect("repl runs");

        let transcript = String::from_utf8(output).expect("utf8");
        assert!(transcript.contains("! unknown restaurant `Nowhere`"));
        assert_eq!(session.phase, Phase::Greeting);
    }

    #[test]
    fn render_strips_markdown_and_lists_chips() {
        let response = TurnResponse::chips("Lovely, **Maya**!", vec!["1".to_string(), "2".to_string()]);
        assert_eq!(render(&response), "Lovely, Maya!\n[1] [2]");
    }
}
