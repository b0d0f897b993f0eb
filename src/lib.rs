//! Deterministic Bitcoin wallet engine
//!
//! This crate provides the core wallet machinery an application embeds:
//! extended-key parsing and conversion, output-descriptor handling,
//! deterministic address derivation, wallet state with per-type policy,
//! chain synchronization and RBF fee bumping. Signing backends and
//! chain indexers stay behind traits so the engine itself never opens a
//! socket.
//!
//! # Architecture
//!
//! - **Keys**: SLIP-132 aware extended-key codec plus BIP32 derivation
//! - **Descriptors**: single-key expression parsing and construction
//! - **Wallet**: one record per wallet, behavior dispatched on its type tag
//! - **Chain**: backend and provider traits, the staged sync cycle, fee bumps
//!
//! # Example
//!
//! ```ignore
//! use wallet_core::{create_wallet, CoreConfig, WalletType};
//!
//! let config = CoreConfig::from_env();
//! let mut wallet = create_wallet(&config, "savings", WalletType::P2wpkh, None)?;
//!
//! let record = wallet_core::wallet::address::next_receive_address(&mut wallet)?;
//! println!("receive at {} ({})", record.address, record.path);
//! ```

// Public modules
pub mod chain;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod keys;
pub mod wallet;

// Re-exports for convenience
pub use chain::{
    bump_transaction, BumpOutcome, ChainDataProvider, SyncCoordinator, SyncOutcome, SyncStage,
    WalletBackend,
};
pub use config::CoreConfig;
pub use descriptor::{DescriptorParts, DescriptorSet};
pub use error::WalletError;
pub use keys::{KeyInfo, KeyVersion, ScriptType};
pub use wallet::{
    create_wallet, restore_wallet, AddressRecord, Balance, Direction, TransactionRecord, Utxo,
    Wallet, WalletType,
};

// Common result type
pub type Result<T> = std::result::Result<T, WalletError>;
