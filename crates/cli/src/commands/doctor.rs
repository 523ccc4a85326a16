use std::sync::Arc;

use robo_advisor_core::config::{AppConfig, LoadOptions};
use robo_advisor_core::{verify_allocation_table, InMemoryTelemetrySink, RiskLevel};
use robo_advisor_lex::{default_dispatcher, RECOMMEND_PORTFOLIO_INTENT};
use serde::Serialize;

use super::{escape_json, CommandResult};

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

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded; server would listen on {}",
                    config.listen_address()
                ),
            });
            checks.push(check_allocation_table());
            checks.push(check_intent_registry());
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["allocation_table", "intent_registry"] {
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

fn check_allocation_table() -> DoctorCheck {
    match verify_allocation_table() {
        Ok(()) => DoctorCheck {
            name: "allocation_table",
            status: CheckStatus::Pass,
            details: format!("{} risk levels each allocate 100%", RiskLevel::ALL.len()),
        },
        Err(error) => DoctorCheck {
            name: "allocation_table",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_intent_registry() -> DoctorCheck {
    let dispatcher = default_dispatcher(Arc::new(InMemoryTelemetrySink::default()));
    let intents = dispatcher.supported_intents();

    if intents.contains(&RECOMMEND_PORTFOLIO_INTENT) {
        DoctorCheck {
            name: "intent_registry",
            status: CheckStatus::Pass,
            details: format!("registered intents: {}", intents.join(", ")),
        }
    } else {
        DoctorCheck {
            name: "intent_registry",
            status: CheckStatus::Fail,
            details: format!("`{RECOMMEND_PORTFOLIO_INTENT}` has no registered handler"),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

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

#[cfg(test)]
mod tests {
    use super::{check_allocation_table, check_intent_registry, render_human, CheckStatus};
    use super::{DoctorCheck, DoctorReport};

    #[test]
    fn built_in_allocation_table_passes() {
        let check = check_allocation_table();
        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.details, "4 risk levels each allocate 100%");
    }

    #[test]
    fn intent_registry_lists_recommend_portfolio() {
        let check = check_intent_registry();
        assert_eq!(check.status, CheckStatus::Pass);
        assert!(check.details.contains("recommendPortfolio"));
    }

    #[test]
    fn human_rendering_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck {
                    name: "config_validation",
                    status: CheckStatus::Fail,
                    details: "bad port".to_string(),
                },
                DoctorCheck {
                    name: "allocation_table",
                    status: CheckStatus::Skipped,
                    details: "skipped".to_string(),
                },
            ],
        };

        let rendered = render_human(&report);
        assert!(rendered.contains("- [fail] config_validation: bad port"));
        assert!(rendered.contains("- [skip] allocation_table: skipped"));
    }
}
