//! Payment collaborators.
//!
//! Settlement happens outside this service. The server only needs two
//! things from it: a [`PaymentGate`] that decides whether an upload of a
//! given price may proceed, and a [`ChannelAddressProvider`] that tells a
//! client where to send money for a token. Reference implementations are
//! selected from [`PaymentConfig`].

pub mod ledger;
pub mod middleware;
pub mod psk;

pub use ledger::{FreeGate, PrepaidLedger};
pub use middleware::{PaidUpload, require_payment};
pub use psk::PskChannel;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use unhash_core::PaymentConfig;
use uuid::Uuid;

/// Payment errors that are not rejections of a specific charge.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid pay token: {0}")]
    InvalidToken(String),

    #[error("payment configuration error: {0}")]
    Config(String),
}

/// Why the gate refused to let an upload proceed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PaymentRejection {
    #[error("a pay token is required to pay {price}")]
    MissingToken { price: u64 },

    #[error("insufficient balance: price {price}, balance {balance}")]
    InsufficientBalance { price: u64, balance: u64 },
}

/// Opaque client token identifying a prepaid balance and its payment channel.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PayToken(String);

impl PayToken {
    /// Longest accepted token.
    pub const MAX_LEN: usize = 128;

    /// Parse a token, accepting 1 to 128 characters of `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        if s.is_empty() || s.len() > Self::MAX_LEN {
            return Err(PaymentError::InvalidToken(format!(
                "expected 1-{} characters, got {}",
                Self::MAX_LEN,
                s.len()
            )));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(PaymentError::InvalidToken(
                "only [A-Za-z0-9_-] are allowed".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PayToken {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for PayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "PayToken({prefix}...)")
    }
}

/// Decides whether a priced request may proceed.
#[async_trait]
pub trait PaymentGate: Send + Sync + 'static {
    /// Charge `price` to `token`, or reject.
    async fn authorize(&self, token: Option<&PayToken>, price: u64)
    -> Result<(), PaymentRejection>;

    /// Remaining prepaid balance for `token`, if the gate tracks one.
    async fn balance(&self, token: &PayToken) -> Option<u64>;

    /// Return a charge that bought nothing.
    async fn refund(&self, token: &PayToken, amount: u64);

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Where a client sends payment for a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelAddress {
    /// Destination account.
    pub destination: String,
    /// Shared secret for the pre-shared-key transport.
    pub shared_secret: String,
}

/// Yields payment-channel addressing for quotes.
pub trait ChannelAddressProvider: Send + Sync + 'static {
    fn channel_for(&self, token: &PayToken) -> ChannelAddress;
}

/// Build the gate and channel provider selected by configuration.
pub fn from_config(
    config: &PaymentConfig,
) -> Result<(Arc<dyn PaymentGate>, Option<Arc<dyn ChannelAddressProvider>>), PaymentError> {
    match config {
        PaymentConfig::None => Ok((Arc::new(FreeGate), None)),
        PaymentConfig::Psk { account, secret } => {
            let channel = PskChannel::new(account, secret)?;
            Ok((Arc::new(PrepaidLedger::new()), Some(Arc::new(channel))))
        }
    }
}
