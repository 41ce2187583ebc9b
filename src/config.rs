use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Secret used when none is configured. Refused in production.
pub const DEV_JWT_SECRET: &str = "cinevault-development-secret-change-me";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub catalog: CatalogConfig,

    pub payments: PaymentsConfig,

    pub google: GoogleConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `"production"` hides upstream error details and enforces a real
    /// JWT secret.
    pub environment: String,

    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database_path: "sqlite:data/cinevault.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4002,
            cors_allowed_origins: vec!["http://localhost:49925".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for session tokens. Overridden by `JWT_SECRET`.
    pub jwt_secret: String,

    /// Session token lifetime in hours (default: 7 days)
    pub token_ttl_hours: i64,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24 * 7,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub page_size: u64,

    /// Paginate listings filtered by `category` too. Off by default: clients
    /// expect a category listing to return every match.
    pub paginate_category_filters: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            paginate_category_filters: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub stripe_api_base: String,

    /// Overridden by `STRIPE_SECRET_KEY`.
    pub stripe_secret_key: String,

    /// Overridden by `STRIPE_WEBHOOK_SECRET`.
    pub webhook_secret: String,

    /// Accepted clock skew for webhook signatures, in seconds.
    pub webhook_tolerance_secs: i64,

    /// Price used when a subscription request names none.
    pub default_price_id: Option<String>,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            stripe_api_base: "https://api.stripe.com".to_string(),
            stripe_secret_key: String::new(),
            webhook_secret: String::new(),
            webhook_tolerance_secs: 300,
            default_price_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client id tokens must be issued for. Overridden by
    /// `GOOGLE_CLIENT_ID`. Empty disables Google sign-in.
    pub client_id: String,

    pub tokeninfo_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "cinevault".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads the first config file found (or defaults), then applies
    /// environment overrides. A `.env` file is read first if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Replaces secrets and the database location with values from `lookup`
    /// (normally the process environment). Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = get("STRIPE_SECRET_KEY") {
            self.payments.stripe_secret_key = v;
        }
        if let Some(v) = get("STRIPE_WEBHOOK_SECRET") {
            self.payments.webhook_secret = v;
        }
        if let Some(v) = get("GOOGLE_CLIENT_ID") {
            self.google.client_id = v;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.general.database_path = v;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cinevault").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinevault").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.page_size == 0 {
            anyhow::bail!("catalog.page_size must be > 0");
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("security.token_ttl_hours must be > 0");
        }

        if self.security.jwt_secret.len() < 16 {
            anyhow::bail!("security.jwt_secret must be at least 16 characters");
        }

        if self.general.is_production() {
            if self.security.jwt_secret == DEV_JWT_SECRET {
                anyhow::bail!("Set JWT_SECRET (or security.jwt_secret) before running in production");
            }
            if self.payments.webhook_secret.is_empty() {
                anyhow::bail!("Set STRIPE_WEBHOOK_SECRET before running in production");
            }
        }

        if self.payments.webhook_tolerance_secs <= 0 {
            anyhow::bail!("payments.webhook_tolerance_secs must be > 0");
        }

        Ok(())
    }
}
