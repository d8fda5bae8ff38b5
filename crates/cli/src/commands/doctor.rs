use serde::Serialize;
use tutur_core::config::{AppConfig, LlmProvider, LoadOptions};
use tutur_db::repositories::{ActivityRepository, SqlActivityRepository};
use tutur_db::{connect_with_settings, migrations, ping};

use crate::commands::CommandResult;

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

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
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
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
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
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_provider(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_provider", "database_connectivity", "activity_catalog"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    // Skipped checks do not fail the report on their own.
    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_provider(config: &AppConfig) -> DoctorCheck {
    let details = match config.llm.provider {
        LlmProvider::OpenAi => format!(
            "openai-compatible provider, model `{}`, api key present",
            config.llm.model
        ),
        LlmProvider::Ollama => format!(
            "ollama provider at `{}`, model `{}`",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            config.llm.model
        ),
    };
    DoctorCheck { name: "llm_provider", status: CheckStatus::Pass, details }
}

/// Connectivity first; the catalog check only runs against a reachable,
/// migrated database and never applies migrations itself.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("activity_catalog", "no async runtime is available"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck::skipped("activity_catalog", "the database is unreachable"),
                ];
            }
        };

        let mut checks = Vec::new();
        match ping(&pool).await {
            Ok(()) => checks.push(DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!("connected using `{}`", config.database.url),
            }),
            Err(error) => {
                checks.push(DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("database query failed: {error}"),
                });
                checks.push(DoctorCheck::skipped("activity_catalog", "the database is unreachable"));
                pool.close().await;
                return checks;
            }
        }

        let applied = migrations::applied_versions(&pool).await.unwrap_or(0);
        let expected = migrations::known_versions();
        if applied < expected {
            checks.push(DoctorCheck {
                name: "activity_catalog",
                status: CheckStatus::Fail,
                details: format!(
                    "{applied} of {expected} migrations applied; run `tutur migrate` first"
                ),
            });
        } else {
            let repository = SqlActivityRepository::new(pool.clone());
            checks.push(match repository.country_codes().await {
                Ok(codes) => DoctorCheck {
                    name: "activity_catalog",
                    status: CheckStatus::Pass,
                    details: format!("catalog covers {} country codes", codes.len()),
                },
                Err(error) => DoctorCheck {
                    name: "activity_catalog",
                    status: CheckStatus::Fail,
                    details: format!("catalog query failed: {error}"),
                },
            });
        }

        pool.close().await;
        checks
    })
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
