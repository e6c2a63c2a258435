use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use eatba_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::SecretString;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<(&str, String, &[&str])> = vec![
        (
            "catalog.data_dir",
            config.catalog.data_dir.display().to_string(),
            &["EATBA_CATALOG_DATA_DIR"][..],
        ),
        ("session.ttl_secs", config.session.ttl_secs.to_string(), &["EATBA_SESSION_TTL_SECS"][..]),
        (
            "session.max_entries",
            config.session.max_entries.to_string(),
            &["EATBA_SESSION_MAX_ENTRIES"][..],
        ),
        (
            "session.sweep_interval_secs",
            config.session.sweep_interval_secs.to_string(),
            &["EATBA_SESSION_SWEEP_INTERVAL_SECS"][..],
        ),
        (
            "sampler.max_items",
            config.sampler.max_items.to_string(),
            &["EATBA_SAMPLER_MAX_ITEMS"][..],
        ),
        (
            "sampler.seed",
            config.sampler.seed.map_or_else(|| "<unset>".to_string(), |seed| seed.to_string()),
            &["EATBA_SAMPLER_SEED"][..],
        ),
        (
            "line.channel_secret",
            redact_secret(config.line.channel_secret.as_ref()),
            &["EATBA_LINE_CHANNEL_SECRET"][..],
        ),
        (
            "line.access_token",
            redact_secret(config.line.access_token.as_ref()),
            &["EATBA_LINE_ACCESS_TOKEN"][..],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["EATBA_SERVER_BIND_ADDRESS"][..],
        ),
        ("server.port", config.server.port.to_string(), &["EATBA_SERVER_PORT"][..]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["EATBA_SERVER_GRACEFUL_SHUTDOWN_SECS"][..],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["EATBA_LOGGING_LEVEL", "EATBA_LOG_LEVEL"][..],
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["EATBA_LOGGING_FORMAT", "EATBA_LOG_FORMAT"][..],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    if secret.is_some() { "<redacted>" } else { "<unset>" }.to_string()
}
