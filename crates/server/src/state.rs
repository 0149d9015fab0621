//! Application state shared across handlers.

use crate::payment::{self, ChannelAddressProvider, PaymentError, PaymentGate};
use std::sync::Arc;
use unhash_core::{AppConfig, PriceCalculator};
use unhash_storage::ObjectStore;

/// Failure to assemble application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid configuration: {0}")]
    Config(#[from] unhash_core::Error),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Application state shared across handlers.
///
/// Everything here is built once at startup and never mutated; handlers
/// clone the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Price calculator derived from the pricing configuration.
    pub pricing: Arc<PriceCalculator>,
    /// Gate that authorizes paid uploads.
    pub payments: Arc<dyn PaymentGate>,
    /// Payment-channel addressing for quotes, when a payment plugin provides it.
    pub channel: Option<Arc<dyn ChannelAddressProvider>>,
}

impl AppState {
    /// Create application state, building pricing and payment collaborators
    /// from the configuration.
    pub fn new(config: AppConfig, storage: Arc<dyn ObjectStore>) -> Result<Self, StateError> {
        config.validate()?;
        let pricing = PriceCalculator::new(&config.pricing)?;
        let (payments, channel) = payment::from_config(&config.payment)?;
        Ok(Self::from_parts(config, storage, pricing, payments, channel))
    }

    /// Assemble state from already built collaborators.
    pub fn from_parts(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        pricing: PriceCalculator,
        payments: Arc<dyn PaymentGate>,
        channel: Option<Arc<dyn ChannelAddressProvider>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            pricing: Arc::new(pricing),
            payments,
            channel,
        }
    }
}
