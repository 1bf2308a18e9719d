use seafoodtruck_api::SeattleFoodTruckClient;
use seafoodtruck_core::config::{AppConfig, LoadOptions};
use seafoodtruck_core::{DayToken, FoodTruckDirectory};
use serde::Serialize;

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
    let report = build_report();

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

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_bot_token(&config));
            checks.push(check_broadcast(&config));
            checks.push(check_food_truck_api(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_token_readiness", "broadcast_readiness", "food_truck_api"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Skipped checks do not fail the report; only explicit failures do.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    if config.has_bot_token() {
        DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Pass,
            details: "bot token present; format validated by config contract".to_string(),
        }
    } else {
        DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Fail,
            details: "slack.bot_token is empty (set SEAFOODTRUCK_SLACK_BOT_TOKEN or TOKEN)"
                .to_string(),
        }
    }
}

fn check_broadcast(config: &AppConfig) -> DoctorCheck {
    if config.broadcast_ready() {
        return DoctorCheck {
            name: "broadcast_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "posting {} location(s) to {} at {:02}:{:02}",
                config.broadcast.location_ids.len(),
                config.broadcast.channel.as_deref().unwrap_or_default(),
                config.broadcast.hour,
                config.broadcast.minute
            ),
        };
    }
    DoctorCheck {
        name: "broadcast_readiness",
        status: CheckStatus::Skipped,
        details: "daily broadcast disabled (needs bot token, channel and location ids)"
            .to_string(),
    }
}

fn check_food_truck_api(config: &AppConfig) -> DoctorCheck {
    let Some(location_id) = config.broadcast.location_ids.first() else {
        return DoctorCheck {
            name: "food_truck_api",
            status: CheckStatus::Skipped,
            details: "no location ids configured to probe".to_string(),
        };
    };

    let client = match SeattleFoodTruckClient::new(&config.food_truck_api) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "food_truck_api",
                status: CheckStatus::Fail,
                details: error.to_string(),
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "food_truck_api",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    match runtime.block_on(client.get_events(location_id, DayToken::Today)) {
        Ok(events) => DoctorCheck {
            name: "food_truck_api",
            status: CheckStatus::Pass,
            details: format!(
                "{} answered with {} event(s) today for location {location_id}",
                config.food_truck_api.base_url(),
                events.len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "food_truck_api",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
