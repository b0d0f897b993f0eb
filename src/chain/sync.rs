//! Chain synchronization
//!
//! One-shot sync cycle: load the wallet on the backend, scan, fetch
//! balance, transactions and unspent outputs, then reconcile wallet
//! state. Every network await completes before the first wallet
//! mutation, so a cancelled or failed cycle leaves the wallet exactly
//! as it was.

use bitcoin::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::backend::{CreateWalletRequest, FetchedTransaction, WalletBackend};
use super::provider::{ChainDataProvider, RawTransaction};
use crate::config::CoreConfig;
use crate::error::WalletError;
use crate::wallet::model::unique_transactions;
use crate::wallet::{address, policy, Balance, Direction, TransactionRecord, Utxo, Wallet};

/// Observable stages of a sync cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Idle,
    CreatingBackend,
    Syncing,
    FetchingBalance,
    FetchingTransactions,
    ReconcilingAddresses,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Idle => "idle",
            SyncStage::CreatingBackend => "creating_backend",
            SyncStage::Syncing => "syncing",
            SyncStage::FetchingBalance => "fetching_balance",
            SyncStage::FetchingTransactions => "fetching_transactions",
            SyncStage::ReconcilingAddresses => "reconciling_addresses",
        };
        write!(f, "{}", name)
    }
}

/// What a completed sync cycle changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the on-chain balance moved since the last cycle.
    pub updated: bool,
    /// Transactions this cycle added to the wallet.
    pub new_transactions: usize,
    pub synced_at: DateTime<Utc>,
}

/// Drives sync cycles against a backend and a chain data provider.
pub struct SyncCoordinator<B, P> {
    backend: B,
    provider: P,
    gap_limit: u32,
}

impl<B: WalletBackend, P: ChainDataProvider> SyncCoordinator<B, P> {
    pub fn new(backend: B, provider: P, config: &CoreConfig) -> Self {
        SyncCoordinator {
            backend,
            provider,
            gap_limit: config.gap_limit,
        }
    }

    /// Run one sync cycle and reconcile the wallet.
    ///
    /// Fails fast: the first stage error aborts the whole cycle.
    pub async fn sync_cycle(&self, wallet: &mut Wallet) -> Result<SyncOutcome, WalletError> {
        log::info!("Sync cycle started for wallet {}", wallet.id);

        log::debug!("Sync stage: {}", SyncStage::CreatingBackend);
        let handle = self
            .backend
            .create_wallet(CreateWalletRequest::watch(wallet))
            .await?;

        log::debug!("Sync stage: {}", SyncStage::Syncing);
        self.backend.sync(&handle).await?;

        log::debug!("Sync stage: {}", SyncStage::FetchingBalance);
        let onchain = self.backend.get_balance(&handle).await?;
        let balance_changed = onchain != wallet.balance.onchain;

        log::debug!("Sync stage: {}", SyncStage::FetchingTransactions);
        let fetch = self.backend.get_transactions(&handle).await?;
        let unspent = self.backend.list_unspent(&handle).await?;

        // Address reconciliation is the expensive part; skip it when the
        // balance did not move.
        let mut resolved: HashMap<String, String> = HashMap::new();
        let mut used: HashSet<String> = HashSet::new();
        if balance_changed {
            log::debug!("Sync stage: {}", SyncStage::ReconcilingAddresses);
            let owned = self.owned_addresses(wallet)?;
            for tx in fetch.confirmed.iter().chain(fetch.pending.iter()) {
                let raw = self.provider.get_transaction(&tx.txid, wallet.network).await?;
                if let Some(matched) = match_owned_address(&raw, &owned) {
                    used.insert(matched.clone());
                    resolved.insert(tx.txid.clone(), matched);
                }
            }
        }

        // Every await is behind us; apply the wallet mutations in one pass.
        let incoming: Vec<TransactionRecord> = fetch
            .confirmed
            .iter()
            .map(|tx| to_record(tx, true, resolved.get(&tx.txid).cloned(), wallet))
            .chain(
                fetch
                    .pending
                    .iter()
                    .map(|tx| to_record(tx, false, resolved.get(&tx.txid).cloned(), wallet)),
            )
            .collect();

        let known: HashSet<String> = wallet.transactions.iter().map(|tx| tx.identity()).collect();
        let new_transactions = incoming
            .iter()
            .filter(|tx| !known.contains(&tx.identity()))
            .count();

        let lightning = wallet.balance.lightning;
        wallet.update_balance(Balance { onchain, lightning });

        let merged = unique_transactions(&wallet.transactions, incoming);
        wallet.update_transactions(merged);

        let keep_flagged: HashSet<(String, u32)> = wallet
            .utxos
            .iter()
            .filter(|u| u.flagged)
            .map(|u| (u.txid.clone(), u.vout))
            .collect();
        let utxos = unspent
            .into_iter()
            .map(|u| {
                let flagged = keep_flagged.contains(&(u.txid.clone(), u.vout));
                Utxo {
                    txid: u.txid,
                    vout: u.vout,
                    value: Amount::from_sat(u.value),
                    address: u.address.unwrap_or_default(),
                    flagged,
                }
            })
            .collect();
        wallet.update_utxos(utxos);

        let mut advanced = 0;
        while used.contains(&wallet.current_address.address) && advanced < self.gap_limit {
            address::next_receive_address(wallet)?;
            advanced += 1;
        }
        if advanced > 0 {
            log::info!(
                "Receive cursor for wallet {} advanced {} step(s) to index {}",
                wallet.id,
                advanced,
                wallet.address_index
            );
        }

        let synced_at = Utc::now();
        wallet.last_synced = Some(synced_at);

        log::info!(
            "Sync cycle finished for wallet {}: balance {} sat, {} new transaction(s)",
            wallet.id,
            wallet.balance.onchain.to_sat(),
            new_transactions
        );
        log::debug!("Sync stage: {}", SyncStage::Idle);

        Ok(SyncOutcome {
            updated: balance_changed,
            new_transactions,
            synced_at,
        })
    }

    /// External-chain addresses the wallet owns, from index zero up to
    /// the cursor plus the gap limit.
    fn owned_addresses(&self, wallet: &Wallet) -> Result<HashSet<String>, WalletError> {
        let horizon = wallet.address_index + self.gap_limit;
        let mut owned = HashSet::new();
        for index in 0..horizon {
            owned.insert(policy::derive_receive_address(wallet, index)?.address);
        }
        Ok(owned)
    }
}

/// The wallet address a transaction touched: outputs first for inbound
/// funds, then input prevouts for outbound spends.
fn match_owned_address(raw: &RawTransaction, owned: &HashSet<String>) -> Option<String> {
    for output in &raw.vout {
        if let Some(candidate) = &output.scriptpubkey_address {
            if owned.contains(candidate) {
                return Some(candidate.clone());
            }
        }
    }

    for input in &raw.vin {
        if let Some(prevout) = &input.prevout {
            if let Some(candidate) = &prevout.scriptpubkey_address {
                if owned.contains(candidate) {
                    return Some(candidate.clone());
                }
            }
        }
    }

    None
}

fn to_record(
    tx: &FetchedTransaction,
    confirmed: bool,
    address: Option<String>,
    wallet: &Wallet,
) -> TransactionRecord {
    // Keep a previously resolved address when this cycle skipped
    // reconciliation.
    let address = address.or_else(|| {
        wallet
            .transactions
            .iter()
            .find(|prior| prior.txid == tx.txid)
            .and_then(|prior| prior.address.clone())
    });

    let value = tx.received as i64 - tx.sent as i64;
    let direction = if value >= 0 {
        Direction::Inbound
    } else {
        Direction::Outbound
    };

    TransactionRecord {
        txid: tx.txid.clone(),
        payment_id: tx.payment_id.clone(),
        confirmed,
        block_height: tx.block_height,
        timestamp: tx.timestamp,
        fee: Amount::from_sat(tx.fee),
        value,
        direction,
        address,
        network: wallet.network,
        vsize: tx.vsize,
    }
}

/// Whether an address has on-chain or mempool history, per the chain
/// data provider.
pub async fn address_used<P: ChainDataProvider>(
    provider: &P,
    address: &str,
    network: bitcoin::Network,
) -> Result<bool, WalletError> {
    let info = provider.get_address_info(address, network).await?;
    Ok(info.is_used())
}
