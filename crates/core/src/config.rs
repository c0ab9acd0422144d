use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: i64,
    #[serde(default = "default_reset_token_expiry")]
    pub reset_token_expiry_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Tracing filter directives; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_filter: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_name: default_from_name(),
            from_email: default_from_email(),
        }
    }
}

/// Startup data. Nothing is seeded when every field is absent.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    /// Directory holding `bootcamps.json`, `courses.json`, `reviews.json`, `users.json`.
    pub data_dir: Option<PathBuf>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn default_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_reset_token_expiry() -> i64 {
    600 // 10 minutes
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_from_name() -> String {
    "DevCamper".to_string()
}

fn default_from_email() -> String {
    "noreply@devcamper.io".to_string()
}

/// Environment variables checked for the override report.
const ENV_KEYS: [(&str, &str); 11] = [
    ("DEVCAMPER_AUTH__JWT_SECRET", "auth.jwt_secret"),
    ("DEVCAMPER_AUTH__TOKEN_EXPIRY_SECONDS", "auth.token_expiry_seconds"),
    ("DEVCAMPER_AUTH__RESET_TOKEN_EXPIRY_SECONDS", "auth.reset_token_expiry_seconds"),
    ("DEVCAMPER_SERVER__HOST", "server.host"),
    ("DEVCAMPER_SERVER__PORT", "server.port"),
    ("DEVCAMPER_SERVER__LOG_FILTER", "server.log_filter"),
    ("DEVCAMPER_MAIL__FROM_NAME", "mail.from_name"),
    ("DEVCAMPER_MAIL__FROM_EMAIL", "mail.from_email"),
    ("DEVCAMPER_SEED__DATA_DIR", "seed.data_dir"),
    ("DEVCAMPER_SEED__ADMIN_EMAIL", "seed.admin_email"),
    ("DEVCAMPER_SEED__ADMIN_PASSWORD", "seed.admin_password"),
];

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

        config.try_deserialize()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load configuration from devcamper.toml in the current directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file("devcamper.toml")
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with DEVCAMPER_ and use `__` between
    /// section and key.
    /// Example: DEVCAMPER_SERVER__PORT, DEVCAMPER_AUTH__JWT_SECRET
    ///
    /// Returns the config and a list of environment variable overrides
    pub fn load_with_env() -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("devcamper").required(false))
            .add_source(
                config::Environment::with_prefix("DEVCAMPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let overrides = ENV_KEYS
            .iter()
            .filter(|(env_var, _)| std::env::var(env_var).is_ok())
            .map(|(_, config_key)| config_key.to_string())
            .collect();

        let app_config = config.try_deserialize()?;
        Ok((app_config, overrides))
    }
}
