//! Storage pricing.
//!
//! Converts an object size into the amount, in the settlement currency's
//! smallest unit, that a client must pay before the upload is accepted. All
//! arithmetic is done in `Decimal` because the payment layer enforces the
//! result exactly.

use crate::config::PricingConfig;
use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Bytes in a (decimal) gigabyte.
pub const BYTES_PER_GB: u64 = 1_000_000_000;

/// Fixed per-object overhead charged on top of the object size.
pub const DEFAULT_OVERHEAD_BYTES: u64 = 1024;

/// Size priced when the client does not declare one (1 GB).
pub const DEFAULT_QUOTE_SIZE: u64 = BYTES_PER_GB;

/// A price for a given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Size the price was computed for.
    pub size: u64,
    /// Required amount in settlement units.
    pub price: u64,
    /// True when `size` is the configured worst case rather than a declared size.
    pub defaulted: bool,
}

/// Maps object sizes to prices.
#[derive(Clone, Debug)]
pub struct PriceCalculator {
    cost_per_byte: Decimal,
    overhead_bytes: u64,
    default_quote_size: u64,
}

impl PriceCalculator {
    /// Build a calculator from the configured rates.
    ///
    /// `cost_per_byte = usd_per_gb_month / usd_per_currency * units_per_currency / BYTES_PER_GB`
    pub fn new(config: &PricingConfig) -> Result<Self> {
        config.validate()?;

        let cost_per_byte = config
            .usd_per_gb_month
            .checked_div(config.usd_per_currency)
            .and_then(|per_gb| per_gb.checked_mul(Decimal::from(config.units_per_currency)))
            .and_then(|per_gb| per_gb.checked_div(Decimal::from(BYTES_PER_GB)))
            .ok_or_else(|| Error::InvalidPricing("cost per byte overflows".to_string()))?;

        Ok(Self {
            cost_per_byte,
            overhead_bytes: config.overhead_bytes,
            default_quote_size: config.default_quote_size,
        })
    }

    /// Build a calculator from an already derived per-byte cost.
    pub fn with_cost_per_byte(cost_per_byte: Decimal, overhead_bytes: u64) -> Self {
        Self {
            cost_per_byte,
            overhead_bytes,
            default_quote_size: DEFAULT_QUOTE_SIZE,
        }
    }

    /// Cost of one byte in settlement units.
    pub fn cost_per_byte(&self) -> Decimal {
        self.cost_per_byte
    }

    /// Size used when a quote has no declared size.
    pub fn default_quote_size(&self) -> u64 {
        self.default_quote_size
    }

    /// Price of storing `size` bytes, rounded half-up to a whole unit.
    ///
    /// Saturates at `u64::MAX`.
    pub fn price(&self, size: u64) -> u64 {
        let billable = Decimal::from(self.overhead_bytes) + Decimal::from(size);
        billable
            .checked_mul(self.cost_per_byte)
            .map(|amount| amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|amount| amount.to_u64())
            .unwrap_or(u64::MAX)
    }

    /// Quote a declared size, or the worst-case default when none was given.
    pub fn quote(&self, declared: Option<u64>) -> Quote {
        let (size, defaulted) = match declared {
            Some(size) => (size, false),
            None => (self.default_quote_size, true),
        };
        Quote {
            size,
            price: self.price(size),
            defaulted,
        }
    }
}
