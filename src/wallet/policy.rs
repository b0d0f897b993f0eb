//! Per-wallet-type policy
//!
//! Dispatches address derivation, descriptor construction and balance
//! summarization on the wallet's type tag instead of branching at every
//! call site.

use bitcoin::{Amount, Network};

use super::address::{self, AddressRecord};
use super::model::{Wallet, WalletType};
use crate::descriptor::{self, DescriptorSet};
use crate::error::WalletError;
use crate::keys::derive;

/// Derive the external-chain address at `index` for the wallet's type.
pub fn derive_receive_address(wallet: &Wallet, index: u32) -> Result<AddressRecord, WalletError> {
    address::receive_address_at(wallet, index)
}

/// Build the descriptor pair for an account-level key under the wallet
/// type's script template.
pub fn build_descriptors(
    wallet_type: WalletType,
    account_key: &str,
    fingerprint: &str,
    network: Network,
) -> Result<DescriptorSet, WalletError> {
    descriptor::build_from_account_key(
        account_key,
        fingerprint,
        wallet_type.script_type(),
        network,
    )
}

/// The spendable balance a wallet reports: unified wallets add their
/// lightning share, plain on-chain wallets report chain funds only.
pub fn summarize_balance(wallet: &Wallet) -> Amount {
    match wallet.wallet_type {
        WalletType::Unified => wallet.balance.total(),
        _ => wallet.balance.onchain,
    }
}

/// Resolve the signing descriptor pair for spends and fee bumps.
///
/// Prefers the stored private descriptor and otherwise rebuilds the pair
/// from the wallet's own key material. Watch-only wallets have neither.
pub fn private_descriptor_pair(wallet: &Wallet) -> Result<(String, String), WalletError> {
    if let Some(private) = &wallet.private_descriptor {
        let internal = descriptor::internal_variant(private);
        return Ok((private.clone(), internal));
    }

    let account = signing_key(wallet)?;
    let set = build_descriptors(wallet.wallet_type, &account, &wallet.fingerprint, wallet.network)?;
    let private = set.private.ok_or_else(|| {
        WalletError::InvalidDerivation("descriptor build produced no signing pair".to_string())
    })?;
    let internal = descriptor::internal_variant(&private);

    Ok((private, internal))
}

fn signing_key(wallet: &Wallet) -> Result<String, WalletError> {
    if let Some(xprv) = &wallet.xprv {
        return Ok(xprv.clone());
    }

    if let Some(phrase) = &wallet.mnemonic {
        let mnemonic = derive::parse_mnemonic(phrase)?;
        let master = derive::master_from_mnemonic(&mnemonic, wallet.network)?;
        let account_path = descriptor::account_path_for(
            wallet.wallet_type.script_type(),
            wallet.network,
        );
        let path = derive::parse_derivation_path(account_path)?;
        let account = derive::account_xprv(&master, &path)?;
        return Ok(account.to_string());
    }

    Err(WalletError::InvalidDerivation(
        "watch-only wallet has no signing key".to_string(),
    ))
}
