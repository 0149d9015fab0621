//! Payment gates.

use super::{PayToken, PaymentGate, PaymentRejection};
use async_trait::async_trait;
use dashmap::DashMap;

/// Lets every upload through. Used when payments are disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreeGate;

#[async_trait]
impl PaymentGate for FreeGate {
    async fn authorize(
        &self,
        _token: Option<&PayToken>,
        _price: u64,
    ) -> Result<(), PaymentRejection> {
        Ok(())
    }

    async fn balance(&self, _token: &PayToken) -> Option<u64> {
        None
    }

    async fn refund(&self, _token: &PayToken, _amount: u64) {}

    fn name(&self) -> &'static str {
        "free"
    }
}

/// In-memory prepaid balances keyed by pay token.
///
/// Settled payments are added with [`PrepaidLedger::credit`]; uploads debit
/// the quoted price. A debit only happens when the whole price is covered.
#[derive(Debug, Default)]
pub struct PrepaidLedger {
    balances: DashMap<PayToken, u64>,
}

impl PrepaidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the balance of `token` and return the new balance.
    pub fn credit(&self, token: &PayToken, amount: u64) -> u64 {
        let mut balance = self.balances.entry(token.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }
}

#[async_trait]
impl PaymentGate for PrepaidLedger {
    async fn authorize(
        &self,
        token: Option<&PayToken>,
        price: u64,
    ) -> Result<(), PaymentRejection> {
        if price == 0 {
            return Ok(());
        }
        let token = token.ok_or(PaymentRejection::MissingToken { price })?;

        // The shard lock is held from the check through the debit.
        let Some(mut balance) = self.balances.get_mut(token) else {
            return Err(PaymentRejection::InsufficientBalance { price, balance: 0 });
        };
        if *balance < price {
            return Err(PaymentRejection::InsufficientBalance {
                price,
                balance: *balance,
            });
        }
        *balance -= price;
        Ok(())
    }

    async fn balance(&self, token: &PayToken) -> Option<u64> {
        self.balances.get(token).map(|balance| *balance)
    }

    async fn refund(&self, token: &PayToken, amount: u64) {
        self.credit(token, amount);
    }

    fn name(&self) -> &'static str {
        "prepaid"
    }
}
