//! Address derivation and rendering
//!
//! Derives child keys at `(chain, index)` and renders the output script
//! address for each supported script type. Given identical key material,
//! path, network and script type the rendered address is deterministic.

use bitcoin::bip32::Xpub;
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Network, PublicKey};
use serde::{Deserialize, Serialize};

use super::model::Wallet;
use crate::descriptor::{self, DescriptorParts};
use crate::error::WalletError;
use crate::keys::{codec, derive, ScriptType};

/// A derived address owned by a wallet's address cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    /// Full derivation path, e.g. `m/84'/1'/0'/0/5`.
    pub path: String,
    pub index: u32,
    /// Internal (change) chain flag.
    pub change: bool,
    pub memo: Option<String>,
}

/// Render the output script address for a derived public key.
pub fn render_address(
    pubkey: &PublicKey,
    network: Network,
    script_type: ScriptType,
) -> Result<Address, WalletError> {
    match script_type {
        ScriptType::P2pkh => Ok(Address::p2pkh(pubkey, network)),
        ScriptType::P2wpkh => {
            let compressed = CompressedPublicKey::try_from(*pubkey)
                .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;
            Ok(Address::p2wpkh(&compressed, network))
        }
        ScriptType::ShP2wpkh => {
            let compressed = CompressedPublicKey::try_from(*pubkey)
                .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;
            Ok(Address::p2shwpkh(&compressed, network))
        }
        ScriptType::P2tr => {
            // Key-path-only spend: x-only internal key, empty script tree.
            let secp = Secp256k1::new();
            let (xonly, _parity) = pubkey.inner.x_only_public_key();
            Ok(Address::p2tr(&secp, xonly, None, network))
        }
    }
}

/// Derive the address at `(chain, index)` below an extended key.
///
/// The key may be public or private and may carry an exotic SLIP-132
/// version prefix.
pub fn derive_address(
    xkey: &str,
    chain: u32,
    index: u32,
    network: Network,
    script_type: ScriptType,
) -> Result<Address, WalletError> {
    let info = codec::classify(xkey)?;

    let pubkey = if info.is_private {
        let xprv = derive::parse_xprv(xkey)?;
        let child = derive::derive_child_priv(&xprv, chain, index)?;
        let secp = Secp256k1::new();
        PublicKey::new(Xpub::from_priv(&secp, &child).public_key)
    } else {
        let xpub = derive::parse_xpub(xkey)?;
        let child = derive::derive_child_pub(&xpub, chain, index)?;
        PublicKey::new(child.public_key)
    };

    render_address(&pubkey, network, script_type)
}

/// Resolve the account-level key for a parsed descriptor.
///
/// Origin-form descriptors embed the account key directly. The private
/// form embeds the depth-0 master, which is walked down to the account
/// path first; a public master cannot take that hardened walk.
fn account_level_key(parts: &DescriptorParts) -> Result<String, WalletError> {
    let payload = codec::decode_checked(&parts.key)?;
    if payload[4] > 0 {
        return Ok(parts.key.clone());
    }

    if parts.key_is_private {
        let master = derive::parse_xprv(&parts.key)?;
        let path = derive::parse_derivation_path(&parts.path)?;
        let account = derive::account_xprv(&master, &path)?;
        Ok(account.to_string())
    } else {
        Err(WalletError::InvalidDerivation(
            "cannot derive a hardened account path from a public master key".to_string(),
        ))
    }
}

/// Derive the external-chain address at a fixed index without touching the
/// wallet's cursor.
pub fn receive_address_at(wallet: &Wallet, index: u32) -> Result<AddressRecord, WalletError> {
    let parts = descriptor::parse(&wallet.external_descriptor)?;
    let key = account_level_key(&parts)?;
    let script_type = wallet.wallet_type.script_type();

    let address = derive_address(&key, 0, index, wallet.network, script_type)?;

    Ok(AddressRecord {
        address: address.to_string(),
        path: format!("{}/0/{}", parts.path, index),
        index,
        change: false,
        memo: None,
    })
}

/// Derive the wallet's next receive address and advance the cursor.
///
/// Read index, derive, increment is one unit; callers must serialize
/// operations against a wallet id so two tasks cannot mint the same index.
pub fn next_receive_address(wallet: &mut Wallet) -> Result<AddressRecord, WalletError> {
    let record = receive_address_at(wallet, wallet.address_index)?;

    wallet.current_address = record.clone();
    wallet.address_index += 1;

    log::debug!(
        "Wallet {} receive address advanced to index {}",
        wallet.id,
        wallet.address_index
    );

    Ok(record)
}
