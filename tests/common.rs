//! Shared test doubles and fixtures for the integration tests
//!
//! `MockBackend` and `MockProvider` implement the chain traits with
//! scripted responses and a call log, so full sync and fee-bump cycles
//! run without touching a network.

use async_trait::async_trait;
use bitcoin::{Amount, Network, ScriptBuf};
use std::collections::HashMap;
use std::sync::Mutex;

use wallet_core::chain::backend::{
    BackendHandle, BackendUtxo, CreateWalletRequest, FeeBumpResponse, FetchedTransaction,
    TransactionFetch, WalletBackend,
};
use wallet_core::chain::provider::{
    AddressInfo, AddressStats, ChainDataProvider, RawTransaction, RecommendedFees, TxInput,
    TxOutput, TxStatus,
};
use wallet_core::error::WalletError;
use wallet_core::{create_wallet, CoreConfig, Wallet, WalletType};

/// BIP39 reference phrase used across the derivation vectors.
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

pub fn test_config() -> CoreConfig {
    CoreConfig::default()
}

/// A fresh BIP84 testnet wallet from the reference phrase.
pub fn test_wallet() -> Wallet {
    create_wallet(
        &test_config(),
        "test-wallet",
        WalletType::P2wpkh,
        Some(TEST_MNEMONIC),
    )
    .expect("wallet from reference phrase")
}

/// Backend double with scripted responses and a call log.
pub struct MockBackend {
    pub balance: Mutex<Amount>,
    pub fetch: Mutex<TransactionFetch>,
    pub unspent: Mutex<Vec<BackendUtxo>>,
    pub mine_scripts: Mutex<Vec<ScriptBuf>>,
    pub bump_response: Mutex<FeeBumpResponse>,
    /// Name of the stage scripted to fail, if any.
    pub fail_stage: Mutex<Option<&'static str>>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend {
            balance: Mutex::new(Amount::ZERO),
            fetch: Mutex::new(TransactionFetch::default()),
            unspent: Mutex::new(Vec::new()),
            mine_scripts: Mutex::new(Vec::new()),
            bump_response: Mutex::new(FeeBumpResponse {
                broadcasted: true,
                new_txid: Some("replacement-txid".to_string()),
                psbt: None,
                error_message: None,
            }),
            fail_stage: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub fn with_balance(sats: u64) -> Self {
        let backend = MockBackend::default();
        *backend.balance.lock().unwrap() = Amount::from_sat(sats);
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn gate(&self, stage: &'static str) -> Result<(), WalletError> {
        if *self.fail_stage.lock().unwrap() == Some(stage) {
            return Err(WalletError::NetworkUnavailable(format!(
                "{} is scripted to fail",
                stage
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletBackend for MockBackend {
    async fn create_wallet(
        &self,
        request: CreateWalletRequest,
    ) -> Result<BackendHandle, WalletError> {
        let mode = if request.descriptor.contains("prv") {
            "signing"
        } else {
            "watch"
        };
        self.record(&format!("create_wallet {}", mode));
        self.gate("create_wallet")?;
        Ok(BackendHandle {
            wallet_id: format!("mock-{}", request.network),
        })
    }

    async fn sync(&self, _handle: &BackendHandle) -> Result<(), WalletError> {
        self.record("sync");
        self.gate("sync")
    }

    async fn get_balance(&self, _handle: &BackendHandle) -> Result<Amount, WalletError> {
        self.record("get_balance");
        self.gate("get_balance")?;
        Ok(*self.balance.lock().unwrap())
    }

    async fn get_transactions(
        &self,
        _handle: &BackendHandle,
    ) -> Result<TransactionFetch, WalletError> {
        self.record("get_transactions");
        self.gate("get_transactions")?;
        Ok(self.fetch.lock().unwrap().clone())
    }

    async fn list_unspent(&self, _handle: &BackendHandle) -> Result<Vec<BackendUtxo>, WalletError> {
        self.record("list_unspent");
        self.gate("list_unspent")?;
        Ok(self.unspent.lock().unwrap().clone())
    }

    async fn is_mine(
        &self,
        _handle: &BackendHandle,
        script: &ScriptBuf,
    ) -> Result<bool, WalletError> {
        self.record("is_mine");
        Ok(self.mine_scripts.lock().unwrap().contains(script))
    }

    async fn build_fee_bump(
        &self,
        _handle: &BackendHandle,
        txid: &str,
        fee_rate: f64,
    ) -> Result<FeeBumpResponse, WalletError> {
        self.record(&format!("build_fee_bump {} at {}", txid, fee_rate));
        self.gate("build_fee_bump")?;
        Ok(self.bump_response.lock().unwrap().clone())
    }
}

/// Chain data double keyed by txid.
pub struct MockProvider {
    pub transactions: Mutex<HashMap<String, RawTransaction>>,
    pub used_addresses: Mutex<Vec<String>>,
    pub fees: RecommendedFees,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        MockProvider {
            transactions: Mutex::new(HashMap::new()),
            used_addresses: Mutex::new(Vec::new()),
            fees: RecommendedFees {
                fastest_fee: 25.0,
                half_hour_fee: 15.0,
                hour_fee: 10.0,
                economy_fee: 5.0,
                minimum_fee: 1.0,
            },
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockProvider {
    pub fn insert_transaction(&self, raw: RawTransaction) {
        self.transactions
            .lock()
            .unwrap()
            .insert(raw.txid.clone(), raw);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainDataProvider for MockProvider {
    async fn get_transaction(
        &self,
        txid: &str,
        _network: Network,
    ) -> Result<RawTransaction, WalletError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("get_transaction {}", txid));
        self.transactions
            .lock()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| WalletError::Backend(format!("transaction {} not found", txid)))
    }

    async fn get_address_info(
        &self,
        address: &str,
        _network: Network,
    ) -> Result<AddressInfo, WalletError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("get_address_info {}", address));

        let used = self
            .used_addresses
            .lock()
            .unwrap()
            .iter()
            .any(|a| a == address);
        let mut chain_stats = AddressStats::default();
        if used {
            chain_stats.tx_count = 1;
            chain_stats.funded_txo_count = 1;
        }

        Ok(AddressInfo {
            address: address.to_string(),
            chain_stats,
            mempool_stats: AddressStats::default(),
        })
    }

    async fn get_recommended_fees(
        &self,
        _network: Network,
    ) -> Result<RecommendedFees, WalletError> {
        self.calls
            .lock()
            .unwrap()
            .push("get_recommended_fees".to_string());
        Ok(self.fees)
    }
}

/// Scan-result fixture.
pub fn fetched_tx(
    txid: &str,
    received: u64,
    sent: u64,
    height: Option<u32>,
) -> FetchedTransaction {
    FetchedTransaction {
        txid: txid.to_string(),
        payment_id: None,
        block_height: height,
        timestamp: None,
        fee: 141,
        sent,
        received,
        vsize: 141,
    }
}

/// Raw transaction paying `value` sats to `address`.
pub fn raw_tx_paying(txid: &str, address: &str, value: u64) -> RawTransaction {
    RawTransaction {
        txid: txid.to_string(),
        version: 2,
        locktime: 0,
        vin: vec![TxInput {
            txid: format!("{}-funding", txid),
            vout: 0,
            prevout: None,
            is_coinbase: false,
            sequence: 0xfffffffd,
        }],
        vout: vec![TxOutput {
            scriptpubkey: String::new(),
            scriptpubkey_address: Some(address.to_string()),
            value,
        }],
        size: 222,
        weight: 561,
        fee: 141,
        status: TxStatus {
            confirmed: true,
            block_height: Some(100),
            block_hash: None,
            block_time: None,
        },
    }
}

/// Raw transaction spending `value` sats out of `address`.
pub fn raw_tx_spending(txid: &str, address: &str, value: u64) -> RawTransaction {
    RawTransaction {
        txid: txid.to_string(),
        version: 2,
        locktime: 0,
        vin: vec![TxInput {
            txid: format!("{}-funding", txid),
            vout: 0,
            prevout: Some(TxOutput {
                scriptpubkey: String::new(),
                scriptpubkey_address: Some(address.to_string()),
                value,
            }),
            is_coinbase: false,
            sequence: 0xfffffffd,
        }],
        vout: vec![TxOutput {
            scriptpubkey: String::new(),
            scriptpubkey_address: Some("tb1qexternal".to_string()),
            value: value - 141,
        }],
        size: 222,
        weight: 561,
        fee: 141,
        status: TxStatus {
            confirmed: true,
            block_height: Some(100),
            block_hash: None,
            block_time: None,
        },
    }
}
