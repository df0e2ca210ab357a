//! Wallet address resolution.

use ethers::signers::{LocalWallet, Signer};
use ethers::utils::to_checksum;

/// Public address watched when no usable key is configured.
pub const FALLBACK_ADDRESS: &str = "0x845E03a741372F5b10626354898C124237c44917";

/// Source of the watched wallet address. Implementations never fail.
pub trait AddressResolver: Send + Sync {
    fn resolve_address(&self) -> String;
}

/// Derives the address from an optional private key.
pub struct KeyWalletResolver {
    private_key: Option<String>,
}

impl KeyWalletResolver {
    pub fn new(private_key: Option<String>) -> Self {
        Self { private_key }
    }

    fn derive(raw: &str) -> Option<String> {
        let cleaned = raw.trim().replace(['\'', '"'], "");
        let hex = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
            .unwrap_or(&cleaned);

        match hex.parse::<LocalWallet>() {
            Ok(wallet) => Some(to_checksum(&wallet.address(), None)),
            Err(e) => {
                tracing::warn!("Configured private key is invalid ({}); using fallback address", e);
                None
            }
        }
    }
}

impl AddressResolver for KeyWalletResolver {
    fn resolve_address(&self) -> String {
        match self.private_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                Self::derive(key).unwrap_or_else(|| FALLBACK_ADDRESS.to_string())
            }
            _ => {
                tracing::debug!("No private key configured; watching fallback address");
                FALLBACK_ADDRESS.to_string()
            }
        }
    }
}

/// Resolver that always returns the same address.
pub struct FixedAddress(pub String);

impl AddressResolver for FixedAddress {
    fn resolve_address(&self) -> String {
        self.0.clone()
    }
}
