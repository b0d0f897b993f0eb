//! BIP32 derivation helpers
//!
//! Wraps the `bitcoin` crate's bip32 types with the crate's error taxonomy.
//! A hardened step requested from public-only material is surfaced as
//! `InvalidDerivation`; nothing here panics on caller input.

use std::str::FromStr;

use bip39::Mnemonic;
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv, Xpub};
use bitcoin::key::rand;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;

use super::codec;
use crate::error::WalletError;

/// Generate a fresh 12-word mnemonic from 16 bytes of system entropy.
pub fn generate_mnemonic() -> Result<Mnemonic, WalletError> {
    let entropy = rand::random::<[u8; 16]>();

    Mnemonic::from_entropy(&entropy).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, WalletError> {
    Mnemonic::parse(words).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Derive the depth-0 master key from a mnemonic (empty passphrase).
pub fn master_from_mnemonic(mnemonic: &Mnemonic, network: Network) -> Result<Xpriv, WalletError> {
    let seed = mnemonic.to_seed("");

    Xpriv::new_master(network, &seed).map_err(|e| WalletError::InvalidDerivation(e.to_string()))
}

/// Parse an extended private key, accepting exotic SLIP-132 prefixes.
pub fn parse_xprv(key: &str) -> Result<Xpriv, WalletError> {
    let normalized = codec::normalize(key)?;

    Xpriv::from_str(&normalized).map_err(|e| WalletError::MalformedKey(e.to_string()))
}

/// Parse an extended public key, accepting exotic SLIP-132 prefixes.
pub fn parse_xpub(key: &str) -> Result<Xpub, WalletError> {
    let normalized = codec::normalize(key)?;

    Xpub::from_str(&normalized).map_err(|e| WalletError::MalformedKey(e.to_string()))
}

/// Derive the account-level private key at the given hardened path.
pub fn account_xprv(master: &Xpriv, path: &DerivationPath) -> Result<Xpriv, WalletError> {
    let secp = Secp256k1::new();

    master
        .derive_priv(&secp, path)
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))
}

/// Neuter a private key to its public counterpart at the same depth.
pub fn xpub_from_xprv(xprv: &Xpriv) -> Xpub {
    let secp = Secp256k1::new();
    Xpub::from_priv(&secp, xprv)
}

/// Derive a non-hardened child at `(chain, index)` from public material.
pub fn derive_child_pub(xpub: &Xpub, chain: u32, index: u32) -> Result<Xpub, WalletError> {
    let secp = Secp256k1::new();

    let chain_child = ChildNumber::from_normal_idx(chain)
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;
    let index_child = ChildNumber::from_normal_idx(index)
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;

    xpub.derive_pub(&secp, &[chain_child, index_child])
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))
}

/// Derive a non-hardened child at `(chain, index)` from private material.
pub fn derive_child_priv(xprv: &Xpriv, chain: u32, index: u32) -> Result<Xpriv, WalletError> {
    let secp = Secp256k1::new();

    let chain_child = ChildNumber::from_normal_idx(chain)
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;
    let index_child = ChildNumber::from_normal_idx(index)
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))?;

    xprv.derive_priv(&secp, &[chain_child, index_child])
        .map_err(|e| WalletError::InvalidDerivation(e.to_string()))
}

/// General path derivation from public material.
///
/// Hardened components fail here: an xpub cannot derive hardened children.
pub fn derive_path_pub(xpub: &Xpub, path: &DerivationPath) -> Result<Xpub, WalletError> {
    let secp = Secp256k1::new();

    xpub.derive_pub(&secp, path).map_err(|e| match e {
        bitcoin::bip32::Error::CannotDeriveFromHardenedKey => WalletError::InvalidDerivation(
            "hardened derivation requires private key material".to_string(),
        ),
        other => WalletError::InvalidDerivation(other.to_string()),
    })
}

pub fn parse_derivation_path(path: &str) -> Result<DerivationPath, WalletError> {
    // Accept both h and ' hardened markers.
    let canonical = path.replace('h', "'");

    DerivationPath::from_str(&canonical).map_err(|e| WalletError::InvalidDerivation(e.to_string()))
}
