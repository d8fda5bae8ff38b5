use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use tutur_core::config::{AppConfig, LoadOptions};

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field::new("database.url", &config.database.url, &["TUTUR_DATABASE_URL"]),
        Field::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["TUTUR_DATABASE_MAX_CONNECTIONS"],
        ),
        Field::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["TUTUR_DATABASE_TIMEOUT_SECS"],
        ),
        Field::new("llm.provider", format!("{:?}", config.llm.provider), &["TUTUR_LLM_PROVIDER"]),
        Field::new("llm.model", &config.llm.model, &["TUTUR_LLM_MODEL"]),
        Field::new(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            &["TUTUR_LLM_BASE_URL"],
        ),
        Field::new(
            "llm.api_key",
            config
                .llm
                .api_key
                .as_ref()
                .map(|key| redact_key(key.expose_secret()))
                .unwrap_or_else(|| "<unset>".to_string()),
            &["TUTUR_LLM_API_KEY"],
        ),
        Field::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["TUTUR_LLM_TIMEOUT_SECS"],
        ),
        Field::new("llm.max_retries", config.llm.max_retries.to_string(), &["TUTUR_LLM_MAX_RETRIES"]),
        Field::new(
            "retrieval.max_documents",
            config.retrieval.max_documents.to_string(),
            &["TUTUR_RETRIEVAL_MAX_DOCUMENTS"],
        ),
        Field::new("server.bind_address", &config.server.bind_address, &["TUTUR_SERVER_BIND_ADDRESS"]),
        Field::new("server.port", config.server.port.to_string(), &["TUTUR_SERVER_PORT"]),
        Field::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["TUTUR_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        Field::new(
            "persistence.workers",
            config.persistence.workers.to_string(),
            &["TUTUR_PERSISTENCE_WORKERS"],
        ),
        Field::new(
            "persistence.queue_capacity",
            config.persistence.queue_capacity.to_string(),
            &["TUTUR_PERSISTENCE_QUEUE_CAPACITY"],
        ),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["TUTUR_LOGGING_LEVEL", "TUTUR_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["TUTUR_LOGGING_FORMAT", "TUTUR_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["tutur.toml", "config/tutur.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a short prefix such as `sk-` so operators can tell keys apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) if prefix.len() <= 8 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_key};

    #[test]
    fn redaction_keeps_only_the_key_prefix() {
        assert_eq!(redact_key("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_key("opaquetoken"), "<redacted>");
        assert_eq!(redact_key("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: Value = "[llm]\nmodel = \"llama3.1\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
