use serde::Serialize;
use tablemate_core::config::{AppConfig, LoadOptions};

use crate::commands::{escape_json, load_catalog};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report(AppConfig::load(LoadOptions::default()).map_err(|e| e.to_string()));

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(config: Result<AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_bind_address(&config));
            checks.extend(check_catalog(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["bind_address", "catalog_load", "default_restaurant"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bind_address(config: &AppConfig) -> DoctorCheck {
    match config.server.socket_addr() {
        Ok(address) => DoctorCheck {
            name: "bind_address",
            status: CheckStatus::Pass,
            details: format!("server will listen on {address}"),
        },
        Err(error) => {
            DoctorCheck { name: "bind_address", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_catalog(config: &AppConfig) -> Vec<DoctorCheck> {
    let catalog = match load_catalog(config) {
        Ok(catalog) => catalog,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "catalog_load",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
                DoctorCheck {
                    name: "default_restaurant",
                    status: CheckStatus::Skipped,
                    details: "skipped because the catalog did not load".to_string(),
                },
            ];
        }
    };

    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "the built-in catalog".to_string());
    let default_restaurant = &config.catalog.default_restaurant;
    let default_check = if catalog.find(default_restaurant).is_some() {
        DoctorCheck {
            name: "default_restaurant",
            status: CheckStatus::Pass,
            details: format!("`{default_restaurant}` is in the catalog"),
        }
    } else {
        DoctorCheck {
            name: "default_restaurant",
            status: CheckStatus::Fail,
            details: format!(
                "`{default_restaurant}` is not in the catalog (known: {})",
                catalog.names().join(", ")
            ),
        }
    };

    vec![
        DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Pass,
            details: format!("{} restaurants loaded from {source}", catalog.restaurants.len()),
        },
        default_check,
    ]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
