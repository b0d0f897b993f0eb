//! Wallet domain
//!
//! A single wallet record covers every wallet flavor, with per-type
//! behavior dispatched on the `wallet_type` tag:
//!
//! - `model.rs` - Wallet record, balances, transactions, UTXOs
//! - `lifecycle.rs` - Create and restore flows
//! - `address.rs` - Child derivation and address rendering
//! - `policy.rs` - Per-wallet-type dispatch

pub mod address;
pub mod lifecycle;
pub mod model;
pub mod policy;

pub use address::AddressRecord;
pub use lifecycle::{create_wallet, restore_wallet};
pub use model::{Balance, Direction, TransactionRecord, Utxo, Wallet, WalletType};
