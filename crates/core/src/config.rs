//! Configuration types shared across crates.

use crate::error::{Error, Result};
use crate::price::{DEFAULT_OVERHEAD_BYTES, DEFAULT_QUOTE_SIZE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address including the listening port (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Public base URL advertised by service discovery.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Also accept uploads and quotes on `/` in addition to `/upload`.
    #[serde(default = "default_true")]
    pub upload_on_root: bool,
    /// Report a token's prepaid balance in quote responses.
    #[serde(default = "default_true")]
    pub expose_balance: bool,
    /// Enable the /metrics endpoint for Prometheus scraping.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    /// Largest object accepted, in bytes. Unlimited when unset.
    #[serde(default)]
    pub max_object_size: Option<u64>,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: default_public_url(),
            upload_on_root: true,
            expose_balance: true,
            metrics_enabled: true,
            max_object_size: None,
        }
    }
}

impl ServerConfig {
    /// Absolute URL clients should POST objects to.
    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.public_url.trim_end_matches('/'))
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Data root; objects live at `<path>/<shard>/<digest>`.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            StorageConfig::Filesystem { path } if path.as_os_str().is_empty() => {
                Err("filesystem storage requires a non-empty path".to_string())
            }
            StorageConfig::Filesystem { .. } => Ok(()),
        }
    }
}

/// Rates used to turn object sizes into prices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Storage cost in USD per gigabyte-month.
    #[serde(default = "default_usd_per_gb_month")]
    pub usd_per_gb_month: Decimal,
    /// USD value of one unit of the settlement currency (e.g. one XRP).
    #[serde(default = "default_usd_per_currency")]
    pub usd_per_currency: Decimal,
    /// Settlement units per currency unit (e.g. 1,000,000 drops per XRP).
    #[serde(default = "default_units_per_currency")]
    pub units_per_currency: u64,
    /// Fixed overhead charged per object, in bytes.
    #[serde(default = "default_overhead_bytes")]
    pub overhead_bytes: u64,
    /// Size quoted when the client does not declare one, in bytes.
    #[serde(default = "default_quote_size")]
    pub default_quote_size: u64,
}

fn default_usd_per_gb_month() -> Decimal {
    Decimal::new(23, 3)
}

fn default_usd_per_currency() -> Decimal {
    Decimal::new(25, 2)
}

fn default_units_per_currency() -> u64 {
    1_000_000
}

fn default_overhead_bytes() -> u64 {
    DEFAULT_OVERHEAD_BYTES
}

fn default_quote_size() -> u64 {
    DEFAULT_QUOTE_SIZE
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            usd_per_gb_month: default_usd_per_gb_month(),
            usd_per_currency: default_usd_per_currency(),
            units_per_currency: default_units_per_currency(),
            overhead_bytes: default_overhead_bytes(),
            default_quote_size: default_quote_size(),
        }
    }
}

impl PricingConfig {
    /// Validate that the rates describe a usable price.
    pub fn validate(&self) -> Result<()> {
        if self.usd_per_gb_month.is_sign_negative() {
            return Err(Error::InvalidPricing(format!(
                "usd_per_gb_month must not be negative, got {}",
                self.usd_per_gb_month
            )));
        }
        if self.usd_per_currency <= Decimal::ZERO {
            return Err(Error::InvalidPricing(format!(
                "usd_per_currency must be positive, got {}",
                self.usd_per_currency
            )));
        }
        if self.units_per_currency == 0 {
            return Err(Error::InvalidPricing(
                "units_per_currency must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payment plugin selection and credentials.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "lowercase")]
pub enum PaymentConfig {
    /// Uploads are free; quotes are still computed.
    #[default]
    None,
    /// Prepaid balances addressed through pre-shared-key payment channels.
    Psk {
        /// Destination account prefix; a token is appended to address a channel.
        account: String,
        /// Receiver secret used to derive per-token shared secrets.
        /// WARNING: Prefer the UNHASH_PAYMENT__SECRET env var over config files.
        secret: String,
    },
}

impl PaymentConfig {
    /// Validate payment configuration invariants.
    pub fn validate(&self) -> Result<()> {
        match self {
            PaymentConfig::None => Ok(()),
            PaymentConfig::Psk { account, secret } => {
                if account.is_empty() {
                    return Err(Error::InvalidConfig(
                        "psk payment requires an account".to_string(),
                    ));
                }
                if secret.len() < 16 {
                    return Err(Error::InvalidConfig(
                        "psk payment secret must be at least 16 characters".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Pricing configuration.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Payment configuration.
    #[serde(default)]
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.storage.validate().map_err(Error::InvalidConfig)?;
        self.pricing.validate()?;
        self.payment.validate()
    }

    /// Create a test configuration rooted at `data_root`.
    ///
    /// **For testing only.** Payments are disabled.
    pub fn for_testing(data_root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::Filesystem {
                path: data_root.into(),
            },
            ..Self::default()
        }
    }
}
