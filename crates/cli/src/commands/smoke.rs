use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tablemate_agent::guardrails::BookingPolicy;
use tablemate_agent::runtime::AgentRuntime;
use tablemate_core::audit::InMemoryAuditSink;
use tablemate_core::config::{AppConfig, LoadOptions};
use tablemate_core::domain::table::TableStatus;
use tablemate_core::store::RestaurantStore;

use crate::commands::chat::ChatSession;
use crate::commands::{load_catalog, CommandResult, EXIT_SMOKE};

const BOOKING_SCRIPT: &[&str] =
    &["hello", "book a table", "Smoke Test", "2", "Tonight", "7pm", "No special requests", "yes"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    run_with(AppConfig::load(LoadOptions::default()).map_err(|error| error.to_string()))
}

/// Books and cancels one table per configured setup, against a throwaway
/// in-process store.
pub fn run_with(config: Result<AppConfig, String>) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match config {
        Ok(config) => {
            checks.push(passed("config_validation", 0, "configuration loaded and validated"));
            config
        }
        Err(error) => {
            checks.push(failed("config_validation", 0, error));
            checks.extend(["catalog_load", "booking_dialog", "cancellation"].map(skipped));
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    let catalog_started = Instant::now();
    let store = match load_catalog(&config) {
        Ok(catalog) => {
            checks.push(passed(
                "catalog_load",
                elapsed_ms(catalog_started),
                format!("{} restaurants loaded", catalog.restaurants.len()),
            ));
            RestaurantStore::from_catalog(catalog, config.booking.wait_estimator())
        }
        Err(error) => {
            checks.push(failed("catalog_load", elapsed_ms(catalog_started), error.to_string()));
            checks.extend(["booking_dialog", "cancellation"].map(skipped));
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    let sink = InMemoryAuditSink::default();
    let runtime = AgentRuntime::new(BookingPolicy::from(&config.booking), Arc::new(sink.clone()));
    let restaurant = config.catalog.default_restaurant.as_str();

    let booking_started = Instant::now();
    let mut session = ChatSession::default();
    let mut last_kind = "none";
    for message in BOOKING_SCRIPT {
        match session.send(&runtime, &store, restaurant, message) {
            Ok(response) => last_kind = response.kind(),
            Err(error) => {
                checks.push(failed(
                    "booking_dialog",
                    elapsed_ms(booking_started),
                    format!("turn `{message}` failed: {error}"),
                ));
                checks.push(skipped("cancellation"));
                return finalize_report(checks, elapsed_ms(started));
            }
        }
    }
    let Some(reservation) = session.reservations.first().cloned() else {
        checks.push(failed(
            "booking_dialog",
            elapsed_ms(booking_started),
            format!("booking dialog ended with a `{last_kind}` response instead of a reservation"),
        ));
        checks.push(skipped("cancellation"));
        return finalize_report(checks, elapsed_ms(started));
    };
    checks.push(passed(
        "booking_dialog",
        elapsed_ms(booking_started),
        format!("{} reserved table {}", reservation.confirmation_code, reservation.table_id),
    ));

    let cancel_started = Instant::now();
    let cancel_message = format!("cancel {}", reservation.confirmation_code);
    let cancelled = session.send(&runtime, &store, restaurant, &cancel_message).is_ok();
    let table_free = store
        .tables(restaurant)
        .map(|tables| {
            tables
                .iter()
                .any(|table| table.id == reservation.table_id && table.status == TableStatus::Available)
        })
        .unwrap_or(false);
    let audited = sink.event_types().iter().any(|event| event == "reservation.cancelled");
    if cancelled && table_free && audited {
        checks.push(passed(
            "cancellation",
            elapsed_ms(cancel_started),
            format!("table {} released", reservation.table_id),
        ));
    } else {
        checks.push(failed(
            "cancellation",
            elapsed_ms(cancel_started),
            format!("table {} was not released after cancellation", reservation.table_id),
        ));
    }

    finalize_report(checks, elapsed_ms(started))
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let all_pass = checks.iter().all(|check| check.status == SmokeStatus::Pass);
    let report = SmokeReport {
        command: "smoke",
        status: if all_pass { SmokeStatus::Pass } else { SmokeStatus::Fail },
        summary: format!(
            "{}/{} smoke checks passed",
            checks.iter().filter(|check| check.status == SmokeStatus::Pass).count(),
            checks.len()
        ),
        total_elapsed_ms,
        checks,
    };

    let mut lines = report
        .checks
        .iter()
        .map(|check| format!("{:?} {} ({}ms): {}", check.status, check.name, check.elapsed_ms, check.message))
        .collect::<Vec<_>>();
    match serde_json::to_string(&report) {
        Ok(json) => lines.push(json),
        Err(error) => {
            return CommandResult::failure("smoke", "serialization", error.to_string(), EXIT_SMOKE)
        }
    }

    CommandResult { exit_code: if all_pass { 0 } else { EXIT_SMOKE }, output: lines.join("\n") }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn passed(name: &'static str, elapsed_ms: u64, message: impl Into<String>) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Pass, elapsed_ms, message: message.into() }
}

fn failed(name: &'static str, elapsed_ms: u64, message: impl Into<String>) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Fail, elapsed_ms, message: message.into() }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to earlier failure".to_string(),
    }
}
