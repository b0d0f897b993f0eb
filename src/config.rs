//! Engine configuration from environment variables
//!
//! Controls the Bitcoin network, the default script type for new
//! wallets, and the address gap limit used during sync. Defaults to
//! testnet so nothing touches mainnet without an explicit opt-in.

use std::env;

use bitcoin::Network;

use crate::descriptor;
use crate::wallet::WalletType;

/// How far past the cursor a sync scans for used addresses.
pub const DEFAULT_GAP_LIMIT: u32 = 20;

#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Bitcoin network for key derivation and addresses
    pub network: Network,
    /// Script type used when a restore cannot infer one
    pub default_wallet_type: WalletType,
    /// Unused-address scan window
    pub gap_limit: u32,
}

impl CoreConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WALLET_NETWORK`: "testnet" (default), "mainnet", "signet" or "regtest"
    /// - `WALLET_TYPE`: default script type for new wallets ("p2wpkh" default)
    /// - `GAP_LIMIT`: unused-address scan window (default 20)
    pub fn from_env() -> Self {
        let network_str = env::var("WALLET_NETWORK")
            .unwrap_or_else(|_| "testnet".to_string())
            .to_lowercase();

        let network = match network_str.as_str() {
            "mainnet" | "bitcoin" => Network::Bitcoin,
            "signet" => Network::Signet,
            "regtest" => Network::Regtest,
            "testnet" | "" => Network::Testnet,
            other => {
                log::warn!("Unknown network '{}', defaulting to testnet", other);
                Network::Testnet
            }
        };
        log::info!("Using {} network", network);

        let type_str = env::var("WALLET_TYPE")
            .unwrap_or_else(|_| "p2wpkh".to_string())
            .to_lowercase();

        let default_wallet_type = match type_str.as_str() {
            "p2pkh" => WalletType::P2pkh,
            "p2sh-p2wpkh" => WalletType::ShP2wpkh,
            "p2tr" => WalletType::P2tr,
            "unified" => WalletType::Unified,
            "p2wpkh" | "" => WalletType::P2wpkh,
            other => {
                log::warn!("Unknown wallet type '{}', defaulting to p2wpkh", other);
                WalletType::P2wpkh
            }
        };

        let gap_limit = env::var("GAP_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_GAP_LIMIT);

        Self {
            network,
            default_wallet_type,
            gap_limit,
        }
    }

    /// BIP44 coin type for this network: 0 on mainnet, 1 everywhere else.
    pub fn coin_type(&self) -> u32 {
        match self.network {
            Network::Bitcoin => 0,
            _ => 1,
        }
    }

    /// Account derivation path for the default wallet type.
    pub fn account_path(&self) -> &'static str {
        descriptor::account_path_for(self.default_wallet_type.script_type(), self.network)
    }
}

impl Default for CoreConfig {
    /// Default configuration (testnet, BIP84)
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            default_wallet_type: WalletType::P2wpkh,
            gap_limit: DEFAULT_GAP_LIMIT,
        }
    }
}
