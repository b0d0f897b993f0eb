//! Wallet backend abstraction
//!
//! The backend owns descriptor-level chain scanning and PSBT
//! construction. Callers hand it a descriptor pair, get back an opaque
//! handle, and drive sync and queries through that handle.

use async_trait::async_trait;
use bitcoin::{Amount, Network, ScriptBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::wallet::{policy, Wallet};

/// Opaque identifier for a wallet loaded on a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHandle {
    pub wallet_id: String,
}

/// Descriptor pair a backend needs to load a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub descriptor: String,
    pub change_descriptor: String,
    pub network: Network,
}

impl CreateWalletRequest {
    /// Watch-only request from the wallet's public descriptor pair.
    pub fn watch(wallet: &Wallet) -> Self {
        CreateWalletRequest {
            descriptor: wallet.external_descriptor.clone(),
            change_descriptor: wallet.internal_descriptor.clone(),
            network: wallet.network,
        }
    }

    /// Signing request from the wallet's private descriptor pair.
    pub fn signing(wallet: &Wallet) -> Result<Self, WalletError> {
        let (descriptor, change_descriptor) = policy::private_descriptor_pair(wallet)?;
        Ok(CreateWalletRequest {
            descriptor,
            change_descriptor,
            network: wallet.network,
        })
    }
}

/// A transaction as the backend reports it after a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedTransaction {
    pub txid: String,
    /// Stable payment identity when the backend tracks one.
    pub payment_id: Option<String>,
    pub block_height: Option<u32>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Fee in satoshis.
    pub fee: u64,
    /// Satoshis leaving the wallet in this transaction.
    pub sent: u64,
    /// Satoshis arriving at the wallet in this transaction.
    pub received: u64,
    /// Virtual size in vbytes.
    pub vsize: u64,
}

/// Scan results partitioned by confirmation status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFetch {
    pub confirmed: Vec<FetchedTransaction>,
    pub pending: Vec<FetchedTransaction>,
}

impl TransactionFetch {
    pub fn len(&self) -> usize {
        self.confirmed.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.pending.is_empty()
    }
}

/// An unspent output as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendUtxo {
    pub txid: String,
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    pub address: Option<String>,
}

/// Outcome of a backend fee-bump build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeBumpResponse {
    pub broadcasted: bool,
    pub new_txid: Option<String>,
    pub psbt: Option<String>,
    /// Backend failure detail; `TransactionConfirmed...` means the target
    /// transaction was mined while the bump was in flight.
    pub error_message: Option<String>,
}

/// Chain-scanning and transaction-building backend.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Load a wallet from its descriptor pair.
    async fn create_wallet(
        &self,
        request: CreateWalletRequest,
    ) -> Result<BackendHandle, WalletError>;

    /// Scan the chain for activity under the wallet's descriptors.
    async fn sync(&self, handle: &BackendHandle) -> Result<(), WalletError>;

    /// Confirmed on-chain balance.
    async fn get_balance(&self, handle: &BackendHandle) -> Result<Amount, WalletError>;

    /// Every transaction touching the wallet, partitioned by
    /// confirmation status.
    async fn get_transactions(
        &self,
        handle: &BackendHandle,
    ) -> Result<TransactionFetch, WalletError>;

    /// Current unspent outputs.
    async fn list_unspent(&self, handle: &BackendHandle) -> Result<Vec<BackendUtxo>, WalletError>;

    /// Whether an output script belongs to the wallet's descriptors.
    async fn is_mine(&self, handle: &BackendHandle, script: &ScriptBuf)
        -> Result<bool, WalletError>;

    /// Build, sign and broadcast an RBF replacement for `txid` at
    /// `fee_rate` sat/vB. Requires a signing handle.
    async fn build_fee_bump(
        &self,
        handle: &BackendHandle,
        txid: &str,
        fee_rate: f64,
    ) -> Result<FeeBumpResponse, WalletError>;
}
