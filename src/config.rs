use crate::error::{AppError, AppResult};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Cron expressions use the six-field form (with seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_generate_orders")]
    pub generate_orders: String,
    #[serde(default = "default_reconcile_pauses")]
    pub reconcile_pauses: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_writes")]
    pub max_writes: usize,
    #[serde(default = "default_subscribers_per_chunk")]
    pub subscribers_per_chunk: usize,
}

fn default_max_connections() -> u32 {
    10
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_generate_orders() -> String {
    "0 0 0 * * *".to_string()
}

fn default_reconcile_pauses() -> String {
    "0 0 22 * * *".to_string()
}

fn default_max_writes() -> usize {
    500
}

fn default_subscribers_per_chunk() -> usize {
    100
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            generate_orders: default_generate_orders(),
            reconcile_pauses: default_reconcile_pauses(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_writes: default_max_writes(),
            subscribers_per_chunk: default_subscribers_per_chunk(),
        }
    }
}

impl ScheduleConfig {
    pub fn tz(&self) -> AppResult<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| AppError::ConfigError(format!("Invalid time zone {}: {e}", self.time_zone)))
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：数据库 URL 必须由环境变量提供
                let database_url = env::var("DATABASE_URL")
                    .map_err(|_| "DATABASE_URL is not set and config.toml was not found")?;
                Config {
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: default_max_connections(),
                    },
                    schedule: ScheduleConfig::default(),
                    batch: BatchConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    /// Environment variables win over file values.
    pub fn apply_env_overrides(&mut self, get_env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get_env("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("SCHEDULE_TIME_ZONE") {
            self.schedule.time_zone = v;
        }
        if let Some(v) = get_env("SCHEDULE_GENERATE_ORDERS") {
            self.schedule.generate_orders = v;
        }
        if let Some(v) = get_env("SCHEDULE_RECONCILE_PAUSES") {
            self.schedule.reconcile_pauses = v;
        }
        if let Some(v) = get_env("BATCH_MAX_WRITES")
            && let Ok(n) = v.parse()
        {
            self.batch.max_writes = n;
        }
        if let Some(v) = get_env("BATCH_SUBSCRIBERS_PER_CHUNK")
            && let Ok(n) = v.parse()
        {
            self.batch.subscribers_per_chunk = n;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.schedule.tz()?;
        if self.batch.max_writes == 0 {
            return Err(AppError::ConfigError("batch.max_writes must be positive".into()));
        }
        if self.batch.subscribers_per_chunk == 0 {
            return Err(AppError::ConfigError(
                "batch.subscribers_per_chunk must be positive".into(),
            ));
        }
        if self.batch.subscribers_per_chunk * 2 > self.batch.max_writes {
            log::warn!(
                "batch.subscribers_per_chunk={} may exceed batch.max_writes={} for order generation",
                self.batch.subscribers_per_chunk,
                self.batch.max_writes
            );
        }
        Ok(())
    }
}
