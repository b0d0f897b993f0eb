//! Wallet state models
//!
//! One record type covers every wallet flavor; the `wallet_type` tag
//! drives script-type dispatch and the optional key-material fields
//! distinguish full wallets from watch-only imports. All models are
//! serde-serializable so a wallet snapshot round-trips losslessly.

use bitcoin::{Amount, Network};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::address::AddressRecord;
use crate::error::WalletError;
use crate::keys::{codec, ScriptType};

/// Script-type tag for a wallet record.
///
/// `Unified` wallets combine an on-chain taproot wallet with a lightning
/// balance under a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletType {
    P2pkh,
    P2wpkh,
    #[serde(rename = "p2sh-p2wpkh")]
    ShP2wpkh,
    P2tr,
    Unified,
}

impl WalletType {
    /// The script type used for address derivation.
    pub fn script_type(&self) -> ScriptType {
        match self {
            WalletType::P2pkh => ScriptType::P2pkh,
            WalletType::P2wpkh => ScriptType::P2wpkh,
            WalletType::ShP2wpkh => ScriptType::ShP2wpkh,
            WalletType::P2tr | WalletType::Unified => ScriptType::P2tr,
        }
    }
}

impl From<ScriptType> for WalletType {
    fn from(script_type: ScriptType) -> Self {
        match script_type {
            ScriptType::P2pkh => WalletType::P2pkh,
            ScriptType::P2wpkh => WalletType::P2wpkh,
            ScriptType::ShP2wpkh => WalletType::ShP2wpkh,
            ScriptType::P2tr => WalletType::P2tr,
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalletType::P2pkh => "p2pkh",
            WalletType::P2wpkh => "p2wpkh",
            WalletType::ShP2wpkh => "p2sh-p2wpkh",
            WalletType::P2tr => "p2tr",
            WalletType::Unified => "unified",
        };
        write!(f, "{}", name)
    }
}

/// On-chain and lightning balances, tracked in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub onchain: Amount,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub lightning: Amount,
}

impl Balance {
    pub fn total(&self) -> Amount {
        self.onchain + self.lightning
    }
}

impl Default for Balance {
    fn default() -> Self {
        Balance {
            onchain: Amount::ZERO,
            lightning: Amount::ZERO,
        }
    }
}

/// Net direction of a transaction relative to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A transaction as the wallet remembers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    /// Stable payment identity when one exists (e.g. a lightning payment
    /// settled on-chain); falls back to the txid for deduplication.
    pub payment_id: Option<String>,
    pub confirmed: bool,
    pub block_height: Option<u32>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub fee: Amount,
    /// Net value in satoshis; negative for outbound transactions.
    pub value: i64,
    pub direction: Direction,
    /// The wallet address this transaction touched, when known.
    pub address: Option<String>,
    pub network: Network,
    /// Virtual size in vbytes, used for fee-rate computation.
    pub vsize: u64,
}

impl TransactionRecord {
    /// The deduplication identity: payment id when present, txid otherwise.
    pub fn identity(&self) -> String {
        self.payment_id
            .clone()
            .unwrap_or_else(|| self.txid.clone())
    }
}

/// An unspent output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
    pub address: String,
    /// Reserved outputs that spending operations must leave alone.
    pub flagged: bool,
}

/// The single wallet record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub name: String,
    pub wallet_type: WalletType,
    pub network: Network,
    /// BIP39 phrase, present only for wallets created or restored from one.
    pub mnemonic: Option<String>,
    /// Account-level private key, absent for watch-only imports.
    pub xprv: Option<String>,
    pub xpub: Option<String>,
    pub external_descriptor: String,
    pub internal_descriptor: String,
    /// Signing descriptor pair source, kept separate so the public
    /// descriptors stay safe to display.
    pub private_descriptor: Option<String>,
    pub fingerprint: String,
    pub current_address: AddressRecord,
    /// Next unused index on the external chain.
    pub address_index: u32,
    pub balance: Balance,
    pub transactions: Vec<TransactionRecord>,
    pub utxos: Vec<Utxo>,
    /// Fixed at creation time; not recomputed when a snapshot is loaded.
    pub watch_only: bool,
    pub backed_up: bool,
    pub birthday: DateTime<Utc>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Whether the wallet can sign: requires a secret phrase, a private
    /// key, or a private key embedded in the external descriptor.
    pub fn computed_watch_only(&self) -> bool {
        if self.mnemonic.is_some() || self.xprv.is_some() {
            return false;
        }
        match codec::find_extended_key(&self.external_descriptor) {
            Some(key) => &key[1..4] != "prv",
            None => true,
        }
    }

    /// Override the watch-only flag, or recompute it from key material.
    pub fn set_watch_only(&mut self, watch_only: Option<bool>) {
        self.watch_only = watch_only.unwrap_or_else(|| self.computed_watch_only());
    }

    pub fn update_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    pub fn update_transactions(&mut self, transactions: Vec<TransactionRecord>) {
        self.transactions = transactions;
    }

    pub fn update_utxos(&mut self, utxos: Vec<Utxo>) {
        self.utxos = utxos;
    }

    /// Mark an output as reserved (or release it). Returns false when the
    /// wallet holds no such output.
    pub fn flag_utxo(&mut self, txid: &str, vout: u32, flagged: bool) -> bool {
        match self
            .utxos
            .iter_mut()
            .find(|u| u.txid == txid && u.vout == vout)
        {
            Some(utxo) => {
                utxo.flagged = flagged;
                true
            }
            None => false,
        }
    }

    /// Replace the descriptor pair and refresh the watch-only flag.
    pub fn set_descriptors(&mut self, external: String, internal: String) {
        self.external_descriptor = external;
        self.internal_descriptor = internal;
        self.set_watch_only(None);
    }

    pub fn set_fingerprint(&mut self, fingerprint: String) {
        self.fingerprint = fingerprint;
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn mark_backed_up(&mut self) {
        self.backed_up = true;
    }

    /// Serialize the full wallet state to a JSON snapshot.
    pub fn to_snapshot(&self) -> Result<String, WalletError> {
        serde_json::to_string_pretty(self).map_err(|e| WalletError::Snapshot(e.to_string()))
    }

    /// Restore a wallet from a JSON snapshot.
    pub fn from_snapshot(snapshot: &str) -> Result<Wallet, WalletError> {
        serde_json::from_str(snapshot).map_err(|e| WalletError::Snapshot(e.to_string()))
    }
}

/// Merge fetched transactions into the stored list.
///
/// Incoming records win for a matching identity, so a fresh confirmation
/// replaces its stale pending counterpart. Stored records the backend no
/// longer reports (e.g. settled lightning payments) are kept.
pub fn unique_transactions(
    existing: &[TransactionRecord],
    incoming: Vec<TransactionRecord>,
) -> Vec<TransactionRecord> {
    let mut merged = incoming;
    let seen: HashSet<String> = merged.iter().map(|tx| tx.identity()).collect();

    for tx in existing {
        if !seen.contains(&tx.identity()) {
            merged.push(tx.clone());
        }
    }

    merged
}
