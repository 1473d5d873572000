//! Signing credential.
//!
//! # Security
//! - The secret is loaded ONLY from an environment variable, once, at startup
//! - Keys are never logged or serialized
//! - `Debug` shows the public key only

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable holding the secret key as a JSON byte array.
pub const PRIVATE_KEY_ENV_VAR: &str = "WALLET_PRIVATE_KEY";

/// Fee payer and mint authority for the whole run.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Build a wallet from a JSON array of secret key bytes, e.g. `[12,34,...]`.
    pub fn from_json_array(secret: &str) -> BlockchainResult<Self> {
        let bytes: Vec<u8> = serde_json::from_str(secret.trim()).map_err(|e| {
            BlockchainError::Wallet(format!("Failed to parse private key array: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Build a wallet from the 64-byte secret key (secret scalar followed by public key).
    pub fn from_bytes(bytes: &[u8]) -> BlockchainResult<Self> {
        let keypair = Keypair::from_bytes(bytes)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key: {}", e)))?;
        Ok(Self { keypair })
    }

    /// Load the wallet from `WALLET_PRIVATE_KEY`, looked up through `env`.
    ///
    /// An unset or blank variable is an error.
    pub fn from_env<F>(env: F) -> BlockchainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = env(PRIVATE_KEY_ENV_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                BlockchainError::Wallet(format!(
                    "Environment variable {} not set",
                    PRIVATE_KEY_ENV_VAR
                ))
            })?;

        Self::from_json_array(&secret)
    }

    /// Get the wallet's address.
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// The keypair, for signing transactions.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl From<Keypair> for Wallet {
    fn from(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_secret(keypair: &Keypair) -> String {
        serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_wallet_from_json_array() {
        let keypair = Keypair::new();
        let wallet = Wallet::from_json_array(&json_secret(&keypair)).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_wallet_tolerates_whitespace() {
        let keypair = Keypair::new();
        let padded = format!("  {}\n", json_secret(&keypair));
        let wallet = Wallet::from_json_array(&padded).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_malformed_array() {
        let result = Wallet::from_json_array("not json");
        assert!(result.unwrap_err().to_string().contains("Failed to parse private key array"));

        let result = Wallet::from_json_array("[1, 2, 3]");
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));

        let result = Wallet::from_json_array("[1, 2, 300]");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env_reads_secret() {
        let keypair = Keypair::new();
        let secret = json_secret(&keypair);
        let wallet = Wallet::from_env(|var| (var == PRIVATE_KEY_ENV_VAR).then(|| secret.clone())).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_from_env_missing_or_blank() {
        for value in [None, Some(""), Some("   ")] {
            let err = Wallet::from_env(|_| value.map(str::to_string)).unwrap_err();
            assert!(matches!(err, BlockchainError::Wallet(_)));
            assert!(err.to_string().contains("WALLET_PRIVATE_KEY not set"), "{}", err);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = Keypair::new();
        let wallet = Wallet::from(keypair.insecure_clone());
        let shown = format!("{:?}", wallet);
        assert!(shown.contains(&keypair.pubkey().to_string()));
        assert!(!shown.contains(&format!("{:?}", keypair.to_bytes())));
    }
}
