//! Chain data provider abstraction
//!
//! Read-only queries against an Esplora-compatible indexer plus a
//! mempool.space-style fee oracle. Response types match the Esplora API
//! format so implementations can deserialize responses directly.

use async_trait::async_trait;
use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Transaction response from /tx/{txid}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    pub version: i32,
    pub locktime: u32,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
    pub size: usize,
    pub weight: usize,
    pub fee: u64,
    pub status: TxStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxStatus {
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub txid: String,
    pub vout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevout: Option<TxOutput>,
    pub is_coinbase: bool,
    pub sequence: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub scriptpubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

/// Address response from /address/{address}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub chain_stats: AddressStats,
    pub mempool_stats: AddressStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressStats {
    pub funded_txo_count: u64,
    pub funded_txo_sum: u64,
    pub spent_txo_count: u64,
    pub spent_txo_sum: u64,
    pub tx_count: u64,
}

impl AddressInfo {
    /// Whether the address has ever appeared on-chain or in the mempool.
    pub fn is_used(&self) -> bool {
        self.chain_stats.tx_count > 0 || self.mempool_stats.tx_count > 0
    }
}

/// Fee recommendations in the mempool.space wire format, sat/vB.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFees {
    pub fastest_fee: f64,
    pub half_hour_fee: f64,
    pub hour_fee: f64,
    pub economy_fee: f64,
    pub minimum_fee: f64,
}

/// Read-only chain queries the sync cycle needs beyond the backend.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Full transaction detail, including input prevouts.
    async fn get_transaction(
        &self,
        txid: &str,
        network: Network,
    ) -> Result<RawTransaction, WalletError>;

    /// Usage statistics for one address.
    async fn get_address_info(
        &self,
        address: &str,
        network: Network,
    ) -> Result<AddressInfo, WalletError>;

    /// Current fee recommendations.
    async fn get_recommended_fees(&self, network: Network)
        -> Result<RecommendedFees, WalletError>;
}
