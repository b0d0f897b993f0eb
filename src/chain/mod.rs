//! Chain integration
//!
//! Everything that talks to the network lives behind two traits so the
//! sync and fee-bump flows stay testable without one:
//!
//! - `backend.rs` - Descriptor wallet backend (scan, balance, PSBTs)
//! - `provider.rs` - Esplora-style chain data and fee oracle
//! - `sync.rs` - The staged sync cycle and wallet reconciliation
//! - `fee_bump.rs` - RBF replacement of pending transactions

pub mod backend;
pub mod fee_bump;
pub mod provider;
pub mod sync;

pub use backend::{
    BackendHandle, BackendUtxo, CreateWalletRequest, FeeBumpResponse, FetchedTransaction,
    TransactionFetch, WalletBackend,
};
pub use fee_bump::{bump_transaction, suggest_bump_rate, BumpOutcome};
pub use provider::{ChainDataProvider, RawTransaction, RecommendedFees};
pub use sync::{address_used, SyncCoordinator, SyncOutcome, SyncStage};
