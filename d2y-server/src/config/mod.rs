//! Configuration module for d2y-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Bearer tokens are reduced to digests here.

pub mod file;

use crate::config::file::{CredentialConfig, DatabaseConfig, FileConfig, SeedConfig, SeedSlot};
use crate::credentials::Credentials;
use d2y_core::entities::catalog::{Merchant, Product};
use d2y_core::entities::slot::Slot;
use d2y_core::identity::{Caller, StaffRole};
use d2y_core::lifecycle::OrderSettings;
use d2y_core::store::Seed;
use d2y_sdk::objects::Role;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use time::macros::format_description;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub database: DatabaseLimits,
    pub orders: OrderSettings,
    pub credentials: Credentials,
    pub seed: Seed,
}

/// Storage bounds, as durations.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseLimits {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

impl From<&DatabaseConfig> for DatabaseLimits {
    fn from(db: &DatabaseConfig) -> Self {
        Self {
            max_connections: db.max_connections,
            acquire_timeout: Duration::from_secs(db.acquire_timeout_secs),
            statement_timeout: Duration::from_secs(db.statement_timeout_secs),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        parse(&config_content, self.listen_override)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

/// Parse, validate and build a configuration from TOML text.
pub fn parse(
    content: &str,
    listen_override: Option<SocketAddr>,
) -> Result<LoadedConfig, ConfigError> {
    let mut file_config: FileConfig = toml::from_str(content)?;

    if let Some(listen) = listen_override {
        file_config.server.listen = listen;
    }

    validate(&file_config)?;
    build_loaded_config(file_config)
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let orders = &config.orders;
    if orders.currency.trim().is_empty() {
        return Err(invalid("orders.currency must not be empty"));
    }
    if orders.delivery_fee_cents < 0 {
        return Err(invalid("orders.delivery_fee_cents must not be negative"));
    }
    if orders.order_code_attempts == 0 {
        return Err(invalid("orders.order_code_attempts must be at least 1"));
    }
    if orders.list_limit < 1 {
        return Err(invalid("orders.list_limit must be at least 1"));
    }
    if config.database.max_connections == 0 {
        return Err(invalid("database.max_connections must be at least 1"));
    }

    for cred in &config.credentials {
        if cred.token.trim().is_empty() {
            return Err(invalid(format!("credential for {} has an empty token", cred.user_id)));
        }
        match (cred.role, &cred.merchant_id) {
            (Role::Merchant, None) => {
                return Err(invalid(format!(
                    "merchant credential for {} needs merchant_id",
                    cred.user_id
                )));
            }
            (Role::Consumer | Role::Admin | Role::Support, Some(_)) => {
                return Err(invalid(format!(
                    "merchant_id is only allowed on merchant credentials ({})",
                    cred.user_id
                )));
            }
            _ => {}
        }
    }

    for slot in &config.seed.slots {
        if slot.capacity < 0 {
            return Err(invalid(format!("slot {} has negative capacity", slot.id)));
        }
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let mut credentials = Credentials::default();
    for cred in &file_config.credentials {
        if credentials.insert(&cred.token, to_caller(cred)?).is_some() {
            return Err(invalid(format!(
                "duplicate token (second use by {})",
                cred.user_id
            )));
        }
    }

    let orders = file_config.orders;
    Ok(LoadedConfig {
        listen: file_config.server.listen,
        database: DatabaseLimits::from(&file_config.database),
        orders: OrderSettings {
            currency: orders.currency,
            delivery_fee_cents: orders.delivery_fee_cents,
            order_code_attempts: orders.order_code_attempts,
            list_limit: orders.list_limit,
        },
        credentials,
        seed: convert_seed(file_config.seed)?,
    })
}

fn to_caller(cred: &CredentialConfig) -> Result<Caller, ConfigError> {
    let user_id = cred.user_id.clone();
    match (cred.role, cred.merchant_id.clone()) {
        (Role::Consumer, None) => Ok(Caller::consumer(user_id)),
        (Role::Merchant, Some(merchant_id)) => Ok(Caller::merchant(user_id, merchant_id)),
        (Role::Admin, None) => Ok(Caller::staff(user_id, StaffRole::Admin)),
        (Role::Support, None) => Ok(Caller::staff(user_id, StaffRole::Support)),
        (Role::Merchant, None) => Err(invalid(format!(
            "merchant credential for {user_id} needs merchant_id"
        ))),
        (Role::Consumer | Role::Admin | Role::Support, Some(_)) => Err(invalid(format!(
            "merchant_id is only allowed on merchant credentials ({user_id})"
        ))),
    }
}

fn convert_seed(seed: SeedConfig) -> Result<Seed, ConfigError> {
    let slots = seed
        .slots
        .into_iter()
        .map(convert_slot)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Seed {
        merchants: seed
            .merchants
            .into_iter()
            .map(|m| Merchant {
                id: m.id,
                name: m.name,
                active: m.active,
            })
            .collect(),
        products: seed
            .products
            .into_iter()
            .map(|p| Product {
                id: p.id,
                merchant_id: p.merchant_id,
                name: p.name,
                price_cents: p.price_cents,
                in_stock: p.in_stock,
            })
            .collect(),
        slots,
    })
}

fn convert_slot(slot: SeedSlot) -> Result<Slot, ConfigError> {
    let bad = |field: &str| invalid(format!("slot {}: malformed {field}", slot.id));
    let date = time::Date::parse(&slot.date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| bad("date"))?;
    let hh_mm = format_description!("[hour]:[minute]");
    let start_time = time::Time::parse(&slot.start_time, hh_mm).map_err(|_| bad("start_time"))?;
    let end_time = time::Time::parse(&slot.end_time, hh_mm).map_err(|_| bad("end_time"))?;
    if end_time <= start_time {
        return Err(bad("time range"));
    }
    Ok(Slot {
        id: slot.id,
        date,
        slot_type: slot.slot_type.into(),
        start_time,
        end_time,
        capacity: slot.capacity,
        remaining: slot.capacity,
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
