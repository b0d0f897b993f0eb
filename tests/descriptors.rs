use bitcoin::Network;

use wallet_core::config::CoreConfig;
use wallet_core::descriptor;
use wallet_core::error::WalletError;
use wallet_core::keys::{derive, ScriptType};
use wallet_core::wallet::{create_wallet, restore_wallet, WalletType};

mod common;

const MASTER_TPUB: &str =
    "tpubD6NzVbkrYhZ4XopgwuDUxX9FnNeZUfidCDusmRfUkzLaVKY2zNNYtqj1frtBbqTSBcHKxsbtUjD4WSDGBwiMn7mLuuWEf5WzvJKMamGNGgG";

const ACCOUNT_XPUB: &str =
    "xpub6CmNYqKyLZdq1BsTyixhuNkKoa3Dt6J9pgUXjA742t7b44xAwjXZak6GvYBPda15ZqKkWippbVkCHYvHMQGuuhVsu2ohkgaVioYcNxZmEvH";

// abandon-about BIP84 testnet account key and its first receive address.
const ACCOUNT_TPUB: &str =
    "tpubDC8msFGeGuwnKG9Upg7DM2b4DaRqg3CUZa5g8v2SRQ6K4NSkxUgd7HsL2XVWbVm39yBA4LAxysQAm397zwQSQoQgewGiYZqrA9DsP4zbQ1M";
const FIRST_RECEIVE: &str = "tb1q6rz28mcfaxtmd6v789l9rrlrusdprr9pqcpvkl";

fn master_tprv() -> String {
    let mnemonic = derive::parse_mnemonic(common::TEST_MNEMONIC).expect("test mnemonic parses");
    derive::master_from_mnemonic(&mnemonic, Network::Testnet)
        .expect("master key derives")
        .to_string()
}

#[test]
fn parses_origin_form_with_hardened_h_markers() {
    common::init_logging();

    let expression = format!("wpkh([188ed79c/84h/1h/0h]{}/0/*)", MASTER_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.script_type, ScriptType::P2wpkh);
    assert_eq!(parts.network, Network::Testnet);
    assert_eq!(parts.fingerprint, "188ed79c");
    assert_eq!(parts.path, "m/84h/1h/0h");
    assert_eq!(parts.key, MASTER_TPUB);
    assert_eq!(parts.key_path.as_deref(), Some("/0/*"));
    assert!(parts.is_public());
    assert_eq!(parts.checksum, None);
    assert_eq!(parts.reconstruct(), expression);
}

#[test]
fn preserves_checksum_tag_verbatim() {
    let expression = format!("wpkh([c65d79d8/84'/0'/0']{}/0/*)#ur90lsda", ACCOUNT_XPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.network, Network::Bitcoin);
    assert_eq!(parts.fingerprint, "c65d79d8");
    assert_eq!(parts.path, "m/84'/0'/0'");
    assert_eq!(parts.checksum.as_deref(), Some("ur90lsda"));
    assert_eq!(parts.reconstruct(), expression);
}

#[test]
fn sh_wpkh_template_is_recognized() {
    let expression = format!("sh(wpkh([188ed79c/49'/1'/0']{}/0/*))", MASTER_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.script_type, ScriptType::ShP2wpkh);
    assert_eq!(parts.prefix, "sh(wpkh(");
    assert_eq!(parts.suffix, "))");
    assert_eq!(parts.reconstruct(), expression);
}

#[test]
fn master_key_without_origin_defaults_to_the_account_path() {
    let expression = format!("wpkh({}/0/*)", MASTER_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.origin, None);
    assert_eq!(parts.path, "m/84'/1'/0'");
    assert_eq!(parts.fingerprint, "188ed79c");
    assert_eq!(parts.key_path.as_deref(), Some("/0/*"));
}

#[test]
fn bare_fingerprint_origin_is_a_master_import() {
    let expression = format!("wpkh([188ed79c]{}/0/*)", MASTER_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.origin.as_deref(), Some("188ed79c"));
    assert_eq!(parts.fingerprint, "188ed79c");
    assert_eq!(parts.path, "m/84'/1'/0'");
}

#[test]
fn origin_deeper_than_the_account_classifies_by_prefix() {
    let expression = format!("wpkh([73c5da0a/84'/1'/0'/0]{}/0/*)", ACCOUNT_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(parts.script_type, ScriptType::P2wpkh);
    assert_eq!(parts.path, "m/84'/1'/0'");
    assert_eq!(parts.origin.as_deref(), Some("73c5da0a/84'/1'/0'/0"));
    assert_eq!(parts.key_path.as_deref(), Some("/0/*"));
    assert_eq!(parts.reconstruct(), expression);
}

#[test]
fn private_form_reads_the_path_after_the_key() {
    let tprv = master_tprv();
    let expression = format!("wpkh({}/84'/1'/0'/0/*)", tprv);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert!(parts.key_is_private);
    assert_eq!(parts.origin, None);
    assert_eq!(parts.path, "m/84'/1'/0'");
    assert_eq!(parts.key_path.as_deref(), Some("/0/*"));
    assert_eq!(parts.fingerprint, "73c5da0a");
    assert_eq!(parts.reconstruct(), expression);
}

#[test]
fn canonical_receive_form_adds_origin_and_chain() {
    let expression = format!("wpkh([188ed79c]{})", MASTER_TPUB);
    let parts = descriptor::parse(&expression).expect("descriptor parses");

    assert_eq!(
        descriptor::with_account_level_key_path(&parts),
        format!("wpkh([188ed79c/84'/1'/0']{}/0/*)", MASTER_TPUB)
    );
}

#[test]
fn non_master_key_requires_an_origin() {
    let expression = format!("wpkh({}/0/*)", ACCOUNT_TPUB);
    let err = descriptor::parse(&expression).unwrap_err();

    assert!(matches!(err, WalletError::MalformedDescriptor(_)));
    assert!(err.to_string().contains("missing key origin"));
}

#[test]
fn rejects_malformed_expressions() {
    let cases = [
        ("".to_string(), "empty descriptor"),
        ("wpkh(notakey/0/*)".to_string(), "no extended key"),
        (
            format!("wpkh([188ed79c]{}/0/*,{}/0/*)", MASTER_TPUB, ACCOUNT_XPUB),
            "single-key",
        ),
        (
            format!("wpkh([188ed79c]{}/0/*", MASTER_TPUB),
            "unbalanced",
        ),
        (
            format!("wpkh([188ed79c]{}/0/*)#abc", MASTER_TPUB),
            "incomplete descriptor checksum",
        ),
        (
            format!("wpkh([188ed79c]{}/0/*)#ur90lsda9", MASTER_TPUB),
            "too long",
        ),
        (
            format!("wpkh([zzzzzzzz]{}/0/*)", MASTER_TPUB),
            "invalid fingerprint",
        ),
        // A multibyte character straddling the fingerprint boundary.
        (
            format!("wpkh([1234567é]{}/0/*)", MASTER_TPUB),
            "invalid fingerprint",
        ),
    ];

    for (expression, needle) in cases {
        let err = descriptor::parse(&expression).unwrap_err();
        assert!(
            err.to_string().contains(needle),
            "{:?} should mention {:?}",
            err,
            needle
        );
    }
}

#[test]
fn rejects_unknown_script_template() {
    let expression = format!("foo([188ed79c]{}/0/*)", MASTER_TPUB);
    let err = descriptor::parse(&expression).unwrap_err();
    assert!(matches!(err, WalletError::UnsupportedScriptType(_)));
}

#[test]
fn rejects_network_mismatch_between_key_and_path() {
    // Testnet key under a mainnet account path.
    let expression = format!("wpkh([188ed79c/84'/0'/0']{}/0/*)", MASTER_TPUB);
    let err = descriptor::parse(&expression).unwrap_err();

    assert!(matches!(err, WalletError::MalformedDescriptor(_)));
    assert!(err.to_string().contains("network mismatch"));
}

#[test]
fn rejects_template_that_contradicts_the_path() {
    let expression = format!("tr([188ed79c/84'/1'/0']{}/0/*)", MASTER_TPUB);
    let err = descriptor::parse(&expression).unwrap_err();
    assert!(matches!(err, WalletError::UnsupportedScriptType(_)));
}

#[test]
fn builds_descriptor_set_from_a_public_account_key() {
    let set = descriptor::build_from_account_key(
        ACCOUNT_XPUB,
        "c65d79d8",
        ScriptType::P2wpkh,
        Network::Bitcoin,
    )
    .expect("descriptor set builds");

    assert_eq!(
        set.external,
        format!("wpkh([c65d79d8/84'/0'/0']{}/0/*)", ACCOUNT_XPUB)
    );
    assert_eq!(
        set.internal,
        format!("wpkh([c65d79d8/84'/0'/0']{}/1/*)", ACCOUNT_XPUB)
    );
    assert_eq!(set.private, None);
}

#[test]
fn internal_variant_swaps_chain_and_drops_checksum() {
    let external = format!("wpkh([c65d79d8/84'/0'/0']{}/0/*)#ur90lsda", ACCOUNT_XPUB);
    assert_eq!(
        descriptor::internal_variant(&external),
        format!("wpkh([c65d79d8/84'/0'/0']{}/1/*)", ACCOUNT_XPUB)
    );

    // Nothing to swap, nothing changed.
    let fixed = format!("wpkh([c65d79d8/84'/0'/0']{}/1/1)", ACCOUNT_XPUB);
    assert_eq!(descriptor::internal_variant(&fixed), fixed);
}

#[test]
fn created_wallet_carries_account_level_descriptors() {
    common::init_logging();
    log::info!("=== Starting Wallet Descriptor Test ===");

    let wallet = common::test_wallet();

    assert_eq!(
        wallet.external_descriptor,
        format!("wpkh([73c5da0a/84'/1'/0']{}/0/*)", ACCOUNT_TPUB)
    );
    assert_eq!(
        wallet.internal_descriptor,
        format!("wpkh([73c5da0a/84'/1'/0']{}/1/*)", ACCOUNT_TPUB)
    );
    assert_eq!(wallet.fingerprint, "73c5da0a");
    assert_eq!(wallet.xpub.as_deref(), Some(ACCOUNT_TPUB));

    let private = wallet.private_descriptor.as_deref().expect("signing descriptor");
    assert!(private.starts_with("wpkh([73c5da0a/84'/1'/0']tprv"));
    assert!(private.ends_with("/0/*)"));
    assert!(!wallet.watch_only);
}

#[test]
fn restores_wallet_from_a_private_descriptor() -> anyhow::Result<()> {
    common::init_logging();

    let config = common::test_config();
    let tprv = master_tprv();
    let expression = format!("wpkh({}/84'/1'/0'/0/*)", tprv);
    let wallet = restore_wallet(&config, "imported", &expression, None)?;

    assert_eq!(wallet.wallet_type, WalletType::P2wpkh);
    assert_eq!(wallet.fingerprint, "73c5da0a");
    assert_eq!(wallet.external_descriptor, expression);
    assert_eq!(wallet.private_descriptor.as_deref(), Some(expression.as_str()));
    assert_eq!(wallet.xprv.as_deref(), Some(tprv.as_str()));
    let xpub = derive::xpub_from_xprv(&derive::parse_xprv(&tprv)?).to_string();
    assert_eq!(wallet.xpub.as_deref(), Some(xpub.as_str()));
    assert!(!wallet.watch_only);

    assert_eq!(wallet.current_address.address, FIRST_RECEIVE);
    assert_eq!(wallet.current_address.index, 0);
    assert_eq!(wallet.current_address.path, "m/84'/1'/0'/0/0");
    assert_eq!(wallet.address_index, 1);

    Ok(())
}

#[test]
fn restores_watch_only_wallet_from_a_public_descriptor() {
    let config = common::test_config();
    let expression = format!("wpkh([73c5da0a/84'/1'/0']{}/0/*)", ACCOUNT_TPUB);
    let wallet =
        restore_wallet(&config, "watcher", &expression, None).expect("descriptor restores");

    assert!(wallet.watch_only);
    assert_eq!(wallet.external_descriptor, expression);
    assert_eq!(
        wallet.internal_descriptor,
        format!("wpkh([73c5da0a/84'/1'/0']{}/1/*)", ACCOUNT_TPUB)
    );
    assert_eq!(wallet.private_descriptor, None);
    assert_eq!(wallet.current_address.address, FIRST_RECEIVE);
}

#[test]
fn restores_bare_key_descriptor_with_ranged_chains() {
    common::init_logging();

    // No path after the key, so the stored pair must gain one.
    let config = common::test_config();
    let expression = format!("wpkh([73c5da0a/84'/1'/0']{})", ACCOUNT_TPUB);
    let wallet =
        restore_wallet(&config, "bare-key", &expression, None).expect("descriptor restores");

    assert_eq!(
        wallet.external_descriptor,
        format!("wpkh([73c5da0a/84'/1'/0']{}/0/*)", ACCOUNT_TPUB)
    );
    assert_eq!(
        wallet.internal_descriptor,
        format!("wpkh([73c5da0a/84'/1'/0']{}/1/*)", ACCOUNT_TPUB)
    );
    assert_eq!(wallet.xpub.as_deref(), Some(ACCOUNT_TPUB));
    assert!(wallet.watch_only);
    assert_eq!(wallet.current_address.address, FIRST_RECEIVE);
}

#[test]
fn master_public_descriptor_cannot_reach_the_account() {
    // The hardened account path is unreachable from a public master key,
    // so the initial address derivation must fail.
    let config = common::test_config();
    let expression = format!("wpkh([188ed79c/84'/1'/0']{}/0/*)", MASTER_TPUB);
    let err = restore_wallet(&config, "stuck", &expression, None).unwrap_err();

    assert!(matches!(err, WalletError::InvalidDerivation(_)));
}

#[test]
fn wallet_type_restores_follow_config() {
    let config = CoreConfig {
        default_wallet_type: WalletType::P2tr,
        ..CoreConfig::default()
    };
    let wallet = restore_wallet(&config, "from-phrase", common::TEST_MNEMONIC, None)
        .expect("mnemonic restores");

    assert_eq!(wallet.wallet_type, WalletType::P2tr);
    assert!(wallet.external_descriptor.starts_with("tr(["));

    let explicit = create_wallet(
        &config,
        "explicit",
        WalletType::P2pkh,
        Some(common::TEST_MNEMONIC),
    )
    .expect("wallet creates");
    assert!(explicit.external_descriptor.starts_with("pkh(["));
}
