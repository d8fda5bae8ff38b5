use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tutur_cli::commands::{doctor, import, migrate};

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());
    with_env(&[("TUTUR_DATABASE_URL", url.as_str())], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload["message"].as_str().unwrap_or_default().contains("2 versions"));
    });
}

#[test]
fn migrate_returns_config_failure_for_keyless_openai() {
    with_env(&[("TUTUR_LLM_PROVIDER", "openai")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn import_activities_loads_catalog_and_is_repeatable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[
            {"principalId":"lim-1","destinationId":"d-lim","city":"Lima","countryCode":"PE","name":"Huaca Pucllana","totalScore":4.6},
            {"principalId":"bog-1","destinationId":"d-bog","city":"Bogota","countryCode":"CO","name":"Gold Museum"}
        ]"#,
    )
    .expect("write catalog");

    let url = database_url(dir.path());
    with_env(&[("TUTUR_DATABASE_URL", url.as_str())], || {
        let first = import::run(&catalog);
        assert_eq!(first.exit_code, 0, "expected import success: {}", first.output);
        let payload = parse_payload(&first.output);
        assert_eq!(payload["command"], "import-activities");
        assert_eq!(payload["message"], "imported 2 activities");

        let second = import::run(&catalog);
        assert_eq!(second.exit_code, 0, "re-import should upsert: {}", second.output);

        let report = doctor::run(true);
        assert_eq!(report.exit_code, 0, "doctor should pass: {}", report.output);
        let report = parse_payload(&report.output);
        let catalog_check = find_check(&report, "activity_catalog");
        assert_eq!(catalog_check["status"], "pass");
        assert!(catalog_check["details"].as_str().unwrap_or_default().contains("2 country codes"));
    });
}

#[test]
fn import_activities_rejects_malformed_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = dir.path().join("broken.json");
    fs::write(&catalog, "[{\"principalId\": ").expect("write catalog");

    let url = database_url(dir.path());
    with_env(&[("TUTUR_DATABASE_URL", url.as_str())], || {
        let result = import::run(&catalog);
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn doctor_flags_unmigrated_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(dir.path());
    with_env(&[("TUTUR_DATABASE_URL", url.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(find_check(&report, "database_connectivity")["status"], "pass");
        let catalog_check = find_check(&report, "activity_catalog");
        assert_eq!(catalog_check["status"], "fail");
        assert!(catalog_check["details"].as_str().unwrap_or_default().contains("tutur migrate"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("TUTUR_LLM_PROVIDER", "openai")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] database_connectivity"));
    });
}

fn database_url(dir: &Path) -> String {
    format!("sqlite://{}", dir.join("tutur.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn find_check<'a>(report: &'a Value, name: &str) -> &'a Value {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .unwrap_or_else(|| panic!("missing `{name}` check in {report}"))
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TUTUR_DATABASE_URL",
        "TUTUR_DATABASE_MAX_CONNECTIONS",
        "TUTUR_DATABASE_TIMEOUT_SECS",
        "TUTUR_LLM_PROVIDER",
        "TUTUR_LLM_API_KEY",
        "TUTUR_LLM_BASE_URL",
        "TUTUR_LLM_MODEL",
        "TUTUR_LLM_TIMEOUT_SECS",
        "TUTUR_LLM_MAX_RETRIES",
        "TUTUR_RETRIEVAL_MAX_DOCUMENTS",
        "TUTUR_SERVER_BIND_ADDRESS",
        "TUTUR_SERVER_PORT",
        "TUTUR_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "TUTUR_PERSISTENCE_WORKERS",
        "TUTUR_PERSISTENCE_QUEUE_CAPACITY",
        "TUTUR_LOGGING_LEVEL",
        "TUTUR_LOGGING_FORMAT",
        "TUTUR_LOG_LEVEL",
        "TUTUR_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
