//! Multi-tier configuration for mcp-relay.
//!
//! The remote endpoint URL is resolved with precedence:
//! `MCP_REMOTE_URL` env var > positional CLI argument > settings file > default.
//!
//! Other settings use: CLI flags > settings file > defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use relay_core::{ErrorChannel, OutputOrder, RelayOptions};
use relay_types::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_REMOTE_URL: &str = "https://person-app-gamma.vercel.app/api/mcp";

/// Environment variable naming the remote endpoint.
pub const REMOTE_URL_ENV: &str = "MCP_REMOTE_URL";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "MCP_RELAY_CONFIG_DIR";

/// Where the endpoint URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Env,
    Arg,
    File,
    Default,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointSource::Env => REMOTE_URL_ENV,
            EndpointSource::Arg => "command line",
            EndpointSource::File => "config file",
            EndpointSource::Default => "built-in default",
        };
        f.write_str(name)
    }
}

/// A validated endpoint URL and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: Url,
    pub source: EndpointSource,
}

impl ResolvedEndpoint {
    pub fn is_default(&self) -> bool {
        self.source == EndpointSource::Default
    }
}

/// Resolved configuration for a relay process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: ResolvedEndpoint,
    pub options: RelayOptions,
    pub timeout_ms: Option<u64>,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub relay: RelaySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelaySettings {
    pub url: Option<String>,
    pub ordering: Option<OutputOrder>,
    pub error_channel: Option<ErrorChannel>,
    pub timeout_ms: Option<u64>,
}

/// CLI overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub ordered: bool,
    pub errors_to_stdout: bool,
    pub timeout_ms: Option<u64>,
}

impl RelayConfig {
    /// Load configuration from the environment, the settings file, and CLI overrides.
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        let env_url = std::env::var(REMOTE_URL_ENV).ok();
        Self::resolve(overrides, settings, env_url, config_dir)
    }

    /// Combine already-gathered sources. Split out from [`RelayConfig::load`]
    /// so precedence can be checked without touching the process environment.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        env_url: Option<String>,
        config_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let endpoint = resolve_endpoint(env_url, overrides.url, settings.relay.url)?;

        let order = if overrides.ordered {
            OutputOrder::Arrival
        } else {
            settings.relay.ordering.unwrap_or_default()
        };

        let error_channel = if overrides.errors_to_stdout {
            ErrorChannel::Stdout
        } else {
            settings.relay.error_channel.unwrap_or_default()
        };

        let timeout_ms = overrides.timeout_ms.or(settings.relay.timeout_ms);
        if timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".into(),
                message: "must be greater than zero".into(),
            });
        }

        Ok(RelayConfig {
            endpoint,
            options: RelayOptions {
                order,
                error_channel,
            },
            timeout_ms,
            config_dir,
        })
    }
}

/// Pick the endpoint URL: env > CLI argument > settings file > default.
///
/// Empty or whitespace-only values count as unset.
pub fn resolve_endpoint(
    env: Option<String>,
    arg: Option<String>,
    file: Option<String>,
) -> Result<ResolvedEndpoint, ConfigError> {
    let candidates = [
        (env, EndpointSource::Env),
        (arg, EndpointSource::Arg),
        (file, EndpointSource::File),
    ];

    let (raw, source) = candidates
        .into_iter()
        .find_map(|(value, source)| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (v, source))
        })
        .unwrap_or_else(|| (DEFAULT_REMOTE_URL.to_string(), EndpointSource::Default));

    let url = parse_endpoint_url(&raw).map_err(|message| ConfigError::InvalidValue {
        key: format!("url (from {source})"),
        message,
    })?;

    Ok(ResolvedEndpoint { url, source })
}

fn parse_endpoint_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}' (expected http or https)")),
    }
    if url.host_str().is_none() {
        return Err(format!("'{raw}' has no host"));
    }
    Ok(url)
}

/// Get the relay config directory path (~/.mcp-relay/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcp-relay")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            SettingsFile::default()
        }
    }
}
