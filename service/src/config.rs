use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::prelude::deserialize_vec_from_string_or_vec;

/// Environment variable prefix; nested keys are separated by `__`
/// (`SC_DATABASE__USER`, `SC_SOUND__API_KEY`, ...).
pub const ENV_PREFIX: &str = "SC_";

/// Service configuration.
///
/// Sources, lowest priority first:
/// 1. Struct defaults
/// 2. `config.yaml` (optional)
/// 3. `SC_`-prefixed environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub sound: SoundConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub security_headers: SecurityHeadersConfig,
    #[serde(default)]
    pub graphql: GraphQLConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// Required, no compiled-in default.
    #[serde(default)]
    pub user: String,

    /// Required, no compiled-in default.
    #[serde(default)]
    pub password: String,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Overrides the migrations shipped with the crate.
    pub migrations_dir: Option<String>,
}

impl DatabaseConfig {
    /// `PostgreSQL` connection URL assembled from the individual fields.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `soundcards_api=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Sound library used to turn a card's `sound_id` into a playable link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundConfig {
    #[serde(default = "default_sound_base_url")]
    pub base_url: String,

    /// Freesound API token (required).
    #[serde(default)]
    pub api_key: String,
}

/// Rules of the guessing game.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GameConfig {
    /// Cards placed into a new deck's pool.
    #[serde(default = "default_deck_size")]
    pub deck_size: u32,

    /// `soundCardsByCategory` result size when `limit` is omitted.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Hard cap on `soundCardsByCategory` result size.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_size: default_deck_size(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins, as a list or a comma-separated string.
    /// `"*"` allows any origin.
    #[serde(
        default = "default_allowed_origins",
        deserialize_with = "deserialize_origins"
    )]
    pub allowed_origins: Vec<String>,
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let origins: Vec<String> = deserialize_vec_from_string_or_vec(deserializer)?;
    Ok(origins.into_iter().filter(|s| !s.is_empty()).collect())
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityHeadersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Only enable behind HTTPS.
    #[serde(default)]
    pub hsts_enabled: bool,

    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,

    #[serde(default = "default_true")]
    pub hsts_include_subdomains: bool,

    /// `DENY` or `SAMEORIGIN`.
    #[serde(default = "default_frame_options")]
    pub frame_options: String,

    #[serde(default = "default_csp")]
    pub content_security_policy: String,

    #[serde(default = "default_referrer_policy")]
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            hsts_enabled: false,
            hsts_max_age: default_hsts_max_age(),
            hsts_include_subdomains: default_true(),
            frame_options: default_frame_options(),
            content_security_policy: default_csp(),
            referrer_policy: default_referrer_policy(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphQLConfig {
    /// Serve the GraphQL Playground on `GET /graphql`. Off by default.
    #[serde(default)]
    pub playground_enabled: bool,
}

// serde takes defaults as function pointers, so these cannot be const
#[allow(clippy::missing_const_for_fn)]
fn default_max_connections() -> u32 {
    10
}

#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "soundcards".to_string()
}

fn default_sound_base_url() -> String {
    "https://freesound.org/apiv2".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_deck_size() -> u32 {
    8
}

#[allow(clippy::missing_const_for_fn)]
fn default_limit() -> u32 {
    8
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_limit() -> u32 {
    24
}

#[allow(clippy::missing_const_for_fn)]
fn default_allowed_origins() -> Vec<String> {
    vec![]
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_hsts_max_age() -> u64 {
    31_536_000
}

fn default_frame_options() -> String {
    "DENY".to_string()
}

fn default_csp() -> String {
    "default-src 'self'".to_string()
}

fn default_referrer_policy() -> String {
    "strict-origin-when-cross-origin".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: default_db_host(),
                port: default_db_port(),
                name: default_db_name(),
                user: String::new(),
                password: String::new(),
                max_connections: default_max_connections(),
                migrations_dir: None,
            },
            server: ServerConfig {
                port: default_port(),
                host: default_host(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
            sound: SoundConfig {
                base_url: default_sound_base_url(),
                api_key: String::new(),
            },
            game: GameConfig::default(),
            cors: CorsConfig::default(),
            security_headers: SecurityHeadersConfig::default(),
            graphql: GraphQLConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load from defaults, `config.yaml` and the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Like [`Config::load`] with an explicit YAML path.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(yaml_path))
    }

    /// The layered provider stack, exposed so tests can inspect or extend it.
    #[must_use]
    pub fn figment(yaml_path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a config from an arbitrary provider stack.
    ///
    /// # Errors
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.user.is_empty() {
            return Err(ConfigError::Validation(
                "database.user is required. Set SC_DATABASE__USER or configure it in config.yaml."
                    .into(),
            ));
        }
        if self.database.password.is_empty() {
            return Err(ConfigError::Validation(
                "database.password is required. Set SC_DATABASE__PASSWORD or configure it in config.yaml."
                    .into(),
            ));
        }
        if self.database.port == 0 {
            return Err(ConfigError::Validation("database.port cannot be 0".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections cannot be 0".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".into()));
        }

        if self.sound.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "sound.api_key is required. Set SC_SOUND__API_KEY or configure it in config.yaml."
                    .into(),
            ));
        }
        if !is_http_url(&self.sound.base_url) {
            return Err(ConfigError::Validation(format!(
                "sound.base_url must start with http:// or https://, got: '{}'",
                self.sound.base_url
            )));
        }

        if self.game.deck_size == 0 {
            return Err(ConfigError::Validation("game.deck_size cannot be 0".into()));
        }
        if self.game.default_limit > self.game.max_limit {
            return Err(ConfigError::Validation(format!(
                "game.default_limit ({}) cannot exceed game.max_limit ({})",
                self.game.default_limit, self.game.max_limit
            )));
        }

        for origin in &self.cors.allowed_origins {
            if origin != "*" && !is_http_url(origin) {
                return Err(ConfigError::Validation(format!(
                    "cors.allowed_origins contains invalid origin '{origin}'. Must be '*' or start with http:// or https://"
                )));
            }
        }

        let frame_opts = self.security_headers.frame_options.to_uppercase();
        if frame_opts != "DENY" && frame_opts != "SAMEORIGIN" {
            return Err(ConfigError::Validation(format!(
                "security_headers.frame_options must be 'DENY' or 'SAMEORIGIN', got: '{}'",
                self.security_headers.frame_options
            )));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
