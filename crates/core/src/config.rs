use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampler::{Sampler, DEFAULT_MAX_ITEMS};
use crate::session::SessionSettings;

pub const DEFAULT_CONFIG_FILE: &str = "eatba.toml";
pub const MAX_SAMPLE_ITEMS: usize = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
    pub sampler: SamplerConfig,
    pub line: LineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub data_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SamplerConfig {
    pub max_items: usize,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LineConfig {
    pub channel_secret: Option<SecretString>,
    pub access_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub port: Option<u16>,
    pub sampler_max_items: Option<usize>,
    pub sampler_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { data_dir: PathBuf::from("data") },
            session: SessionConfig {
                ttl_secs: 1_800,
                max_entries: 10_000,
                sweep_interval_secs: 60,
            },
            sampler: SamplerConfig { max_items: DEFAULT_MAX_ITEMS, seed: None },
            line: LineConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings { ttl: Duration::from_secs(self.ttl_secs), max_entries: self.max_entries }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl SamplerConfig {
    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.max_items)
    }
}

impl LineConfig {
    pub fn is_configured(&self) -> bool {
        self.channel_secret.is_some() && self.access_token.is_some()
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(data_dir) = catalog.data_dir {
                self.catalog.data_dir = data_dir;
            }
        }

        if let Some(session) = patch.session {
            if let Some(ttl_secs) = session.ttl_secs {
                self.session.ttl_secs = ttl_secs;
            }
            if let Some(max_entries) = session.max_entries {
                self.session.max_entries = max_entries;
            }
            if let Some(sweep_interval_secs) = session.sweep_interval_secs {
                self.session.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(sampler) = patch.sampler {
            if let Some(max_items) = sampler.max_items {
                self.sampler.max_items = max_items;
            }
            if let Some(seed) = sampler.seed {
                self.sampler.seed = Some(seed);
            }
        }

        if let Some(line) = patch.line {
            if let Some(channel_secret) = line.channel_secret {
                self.line.channel_secret = Some(secret_value(channel_secret));
            }
            if let Some(access_token) = line.access_token {
                self.line.access_token = Some(secret_value(access_token));
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("EATBA_CATALOG_DATA_DIR") {
            self.catalog.data_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("EATBA_SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_u64("EATBA_SESSION_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("EATBA_SESSION_MAX_ENTRIES") {
            self.session.max_entries = parse_usize("EATBA_SESSION_MAX_ENTRIES", &value)?;
        }
        if let Some(value) = read_env("EATBA_SESSION_SWEEP_INTERVAL_SECS") {
            self.session.sweep_interval_secs =
                parse_u64("EATBA_SESSION_SWEEP_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("EATBA_SAMPLER_MAX_ITEMS") {
            self.sampler.max_items = parse_usize("EATBA_SAMPLER_MAX_ITEMS", &value)?;
        }
        if let Some(value) = read_env("EATBA_SAMPLER_SEED") {
            self.sampler.seed = Some(parse_u64("EATBA_SAMPLER_SEED", &value)?);
        }

        if let Some(value) = read_env("EATBA_LINE_CHANNEL_SECRET") {
            self.line.channel_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("EATBA_LINE_ACCESS_TOKEN") {
            self.line.access_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("EATBA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("EATBA_SERVER_PORT") {
            self.server.port = parse_u16("EATBA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("EATBA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("EATBA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("EATBA_LOGGING_LEVEL").or_else(|| read_env("EATBA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("EATBA_LOGGING_FORMAT").or_else(|| read_env("EATBA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.catalog.data_dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(max_items) = overrides.sampler_max_items {
            self.sampler.max_items = max_items;
        }
        if let Some(seed) = overrides.sampler_seed {
            self.sampler.seed = Some(seed);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_session(&self.session)?;
        validate_sampler(&self.sampler)?;
        validate_line(&self.line)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.data_dir must not be empty".to_string()));
    }
    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session.ttl_secs must be greater than zero".to_string(),
        ));
    }

    if session.max_entries == 0 {
        return Err(ConfigError::Validation(
            "session.max_entries must be greater than zero".to_string(),
        ));
    }

    if session.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "session.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_sampler(sampler: &SamplerConfig) -> Result<(), ConfigError> {
    if sampler.max_items == 0 || sampler.max_items > MAX_SAMPLE_ITEMS {
        return Err(ConfigError::Validation(format!(
            "sampler.max_items must be in range 1..={MAX_SAMPLE_ITEMS} (carousel column limit)"
        )));
    }
    Ok(())
}

fn validate_line(line: &LineConfig) -> Result<(), ConfigError> {
    if is_blank(line.channel_secret.as_ref()) || is_blank(line.access_token.as_ref()) {
        return Err(ConfigError::Validation(
            "line.channel_secret and line.access_token must not be blank".to_string(),
        ));
    }

    if line.channel_secret.is_some() != line.access_token.is_some() {
        return Err(ConfigError::Validation(
            "line.channel_secret and line.access_token must be configured together. \
             Both are listed under LINE Developers console > Messaging API"
                .to_string(),
        ));
    }

    Ok(())
}

fn is_blank(secret: Option<&SecretString>) -> bool {
    secret.is_some_and(|secret| secret.expose_secret().trim().is_empty())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    session: Option<SessionPatch>,
    sampler: Option<SamplerPatch>,
    line: Option<LinePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
    max_entries: Option<usize>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SamplerPatch {
    max_items: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LinePatch {
    channel_secret: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
