//! Wallet creation and restore
//!
//! Builds the single wallet record from fresh entropy or from imported
//! material. Restore classifies the material itself: a phrase with
//! whitespace is a mnemonic, an expression with a script template is a
//! descriptor, anything else must validate as an extended key.

use bip39::Mnemonic;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use chrono::Utc;
use uuid::Uuid;

use super::address::{self, AddressRecord};
use super::model::{Balance, Wallet, WalletType};
use super::policy;
use crate::config::CoreConfig;
use crate::descriptor;
use crate::error::WalletError;
use crate::keys::{codec, derive};

/// Create a wallet from a fresh or supplied BIP39 phrase.
pub fn create_wallet(
    config: &CoreConfig,
    name: &str,
    wallet_type: WalletType,
    mnemonic: Option<&str>,
) -> Result<Wallet, WalletError> {
    let mnemonic = match mnemonic {
        Some(phrase) => derive::parse_mnemonic(phrase)?,
        None => derive::generate_mnemonic()?,
    };

    build_from_mnemonic(config, name, &mnemonic, wallet_type)
}

/// Restore a wallet from a mnemonic, an extended key, or a descriptor.
///
/// `wallet_type` overrides the script type for key-material restores;
/// descriptors carry their own script template and ignore it.
pub fn restore_wallet(
    config: &CoreConfig,
    name: &str,
    material: &str,
    wallet_type: Option<WalletType>,
) -> Result<Wallet, WalletError> {
    let material = material.trim();

    if material.contains('(') {
        return restore_from_descriptor(config, name, material);
    }

    if material.contains(char::is_whitespace) {
        let mnemonic = derive::parse_mnemonic(material)?;
        let wallet_type = wallet_type.unwrap_or(config.default_wallet_type);
        return build_from_mnemonic(config, name, &mnemonic, wallet_type);
    }

    codec::validate(material)?;
    restore_from_key(config, name, material, wallet_type)
}

fn build_from_mnemonic(
    config: &CoreConfig,
    name: &str,
    mnemonic: &Mnemonic,
    wallet_type: WalletType,
) -> Result<Wallet, WalletError> {
    let secp = Secp256k1::new();
    let network = config.network;

    let master = derive::master_from_mnemonic(mnemonic, network)?;
    let fingerprint = master.fingerprint(&secp).to_string();

    let account_path = descriptor::account_path_for(wallet_type.script_type(), network);
    let path = derive::parse_derivation_path(account_path)?;
    let account = derive::account_xprv(&master, &path)?;
    let account_pub = derive::xpub_from_xprv(&account);

    let set = policy::build_descriptors(wallet_type, &account.to_string(), &fingerprint, network)?;

    let mut wallet = base_record(name, wallet_type, network);
    wallet.mnemonic = Some(mnemonic.to_string());
    wallet.xprv = Some(account.to_string());
    wallet.xpub = Some(account_pub.to_string());
    wallet.external_descriptor = set.external;
    wallet.internal_descriptor = set.internal;
    wallet.private_descriptor = set.private;
    wallet.fingerprint = fingerprint;

    log::info!(
        "Created {} wallet '{}' on {}",
        wallet.wallet_type,
        wallet.name,
        wallet.network
    );

    finish_wallet(wallet)
}

fn restore_from_key(
    config: &CoreConfig,
    name: &str,
    key: &str,
    requested: Option<WalletType>,
) -> Result<Wallet, WalletError> {
    let info = codec::classify(key)?;
    let payload = codec::decode_checked(key)?;
    let depth = payload[4];

    // A SLIP-132 prefix carries a script-type hint; the base xpub/tpub
    // class does not, so those fall back to the configured default.
    let hint = if info.version == info.version.base() {
        None
    } else {
        Some(WalletType::from(info.script_type))
    };
    let wallet_type = requested.or(hint).unwrap_or(config.default_wallet_type);

    let network = info.network;
    if network != config.network {
        log::warn!(
            "Restoring a {} key under a {} configuration",
            network,
            config.network
        );
    }

    let fingerprint = codec::fingerprint(key)?;
    let mut wallet = base_record(name, wallet_type, network);

    if info.is_private {
        let account = match depth {
            0 => {
                let master = derive::parse_xprv(key)?;
                let account_path =
                    descriptor::account_path_for(wallet_type.script_type(), network);
                let path = derive::parse_derivation_path(account_path)?;
                derive::account_xprv(&master, &path)?
            }
            3 => derive::parse_xprv(key)?,
            _ => {
                return Err(WalletError::InvalidDerivation(format!(
                    "expected a master or account-level private key, got depth {}",
                    depth
                )))
            }
        };

        let set =
            policy::build_descriptors(wallet_type, &account.to_string(), &fingerprint, network)?;
        wallet.xprv = Some(account.to_string());
        wallet.xpub = Some(derive::xpub_from_xprv(&account).to_string());
        wallet.external_descriptor = set.external;
        wallet.internal_descriptor = set.internal;
        wallet.private_descriptor = set.private;
    } else {
        if depth == 0 {
            return Err(WalletError::InvalidDerivation(
                "a public master key cannot reach a hardened account path; provide an account-level key"
                    .to_string(),
            ));
        }

        let account = derive::parse_xpub(key)?;
        let set =
            policy::build_descriptors(wallet_type, &account.to_string(), &fingerprint, network)?;
        wallet.xpub = Some(account.to_string());
        wallet.external_descriptor = set.external;
        wallet.internal_descriptor = set.internal;
    }

    wallet.fingerprint = fingerprint;

    log::info!(
        "Restored {} wallet '{}' from an extended key",
        wallet.wallet_type,
        wallet.name
    );

    finish_wallet(wallet)
}

fn restore_from_descriptor(
    config: &CoreConfig,
    name: &str,
    expression: &str,
) -> Result<Wallet, WalletError> {
    let parts = descriptor::parse(expression)?;
    let wallet_type = WalletType::from(parts.script_type);

    if parts.network != config.network {
        log::warn!(
            "Restoring a {} descriptor under a {} configuration",
            parts.network,
            config.network
        );
    }

    // A keyed expression is stored verbatim; a bare-key expression gains
    // the ranged external form first, since both stored chains must be
    // ranged. The internal variant drops the checksum once it no longer
    // matches the rewritten body.
    let external = if parts.key_path.is_none() {
        descriptor::with_account_level_key_path(&parts)
    } else {
        parts.reconstruct()
    };
    let internal = descriptor::internal_variant(&external);

    let mut wallet = base_record(name, wallet_type, parts.network);
    if parts.key_is_private {
        let account = derive::parse_xprv(&parts.key)?;
        wallet.xprv = Some(account.to_string());
        wallet.xpub = Some(derive::xpub_from_xprv(&account).to_string());
        wallet.private_descriptor = Some(external.clone());
    } else {
        wallet.xpub = Some(derive::parse_xpub(&parts.key)?.to_string());
    }
    wallet.external_descriptor = external;
    wallet.internal_descriptor = internal;
    wallet.fingerprint = parts.fingerprint.clone();

    log::info!(
        "Restored {} wallet '{}' from a descriptor",
        wallet.wallet_type,
        wallet.name
    );

    finish_wallet(wallet)
}

fn base_record(name: &str, wallet_type: WalletType, network: Network) -> Wallet {
    Wallet {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        wallet_type,
        network,
        mnemonic: None,
        xprv: None,
        xpub: None,
        external_descriptor: String::new(),
        internal_descriptor: String::new(),
        private_descriptor: None,
        fingerprint: String::new(),
        current_address: AddressRecord {
            address: String::new(),
            path: String::new(),
            index: 0,
            change: false,
            memo: None,
        },
        address_index: 0,
        balance: Balance::default(),
        transactions: Vec::new(),
        utxos: Vec::new(),
        watch_only: false,
        backed_up: false,
        birthday: Utc::now(),
        last_synced: None,
    }
}

/// Derive the initial receive address and fix the watch-only flag.
fn finish_wallet(mut wallet: Wallet) -> Result<Wallet, WalletError> {
    address::next_receive_address(&mut wallet)?;
    wallet.set_watch_only(None);
    Ok(wallet)
}
