//! TOML file configuration structures.
//!
//! These structs directly map to the `d2y-config.toml` file format.

use d2y_sdk::objects::{Role, SlotType};
use serde::Deserialize;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
    /// Catalog fixtures for `--memory` runs. Ignored against PostgreSQL.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Connection pool and storage time bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Applied as the PostgreSQL `statement_timeout` of every connection,
    /// and as the lock wait bound of the in-memory store.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_statement_timeout_secs() -> u64 {
    10
}

/// Order engine tunables. Reloaded on SIGHUP.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub delivery_fee_cents: i64,
    #[serde(default = "default_order_code_attempts")]
    pub order_code_attempts: u32,
    #[serde(default = "default_list_limit")]
    pub list_limit: i64,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            delivery_fee_cents: 0,
            order_code_attempts: default_order_code_attempts(),
            list_limit: default_list_limit(),
        }
    }
}

fn default_currency() -> String {
    "EUR".to_owned()
}

fn default_order_code_attempts() -> u32 {
    5
}

fn default_list_limit() -> i64 {
    50
}

/// One bearer token and the identity it stands for.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    /// Required for `MERCHANT`, rejected otherwise.
    #[serde(default)]
    pub merchant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub merchants: Vec<SeedMerchant>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub slots: Vec<SeedSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMerchant {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

/// Dates and times are quoted strings: `"2026-02-06"`, `"10:00"`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSlot {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
}

fn default_true() -> bool {
    true
}
