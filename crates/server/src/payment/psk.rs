//! Pre-shared-key payment channel addressing.
//!
//! Each pay token gets its own destination under the receiver's account and
//! a shared secret derived from the receiver secret, so the receiver can
//! recompute the secret for any incoming payment without storing it.

use super::{ChannelAddress, ChannelAddressProvider, PayToken, PaymentError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derives per-token destinations and shared secrets.
#[derive(Clone)]
pub struct PskChannel {
    account: String,
    mac: HmacSha256,
}

impl PskChannel {
    pub fn new(account: &str, secret: &str) -> Result<Self, PaymentError> {
        if account.is_empty() {
            return Err(PaymentError::Config("account must not be empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::Config(format!("invalid psk secret: {e}")))?;
        Ok(Self {
            account: account.to_string(),
            mac,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

impl std::fmt::Debug for PskChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PskChannel")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl ChannelAddressProvider for PskChannel {
    fn channel_for(&self, token: &PayToken) -> ChannelAddress {
        let mut mac = self.mac.clone();
        mac.update(token.as_str().as_bytes());
        let shared_secret = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        ChannelAddress {
            destination: format!("{}.{}", self.account, token),
            shared_secret,
        }
    }
}
