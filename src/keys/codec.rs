//! Extended key codec
//!
//! Base58Check decoding with explicit checksum verification, SLIP-132
//! version classification, cross-version conversion (`zpub` -> `xpub` and
//! friends), and fingerprint extraction. Everything here is pure and
//! synchronous; malformed input surfaces as a typed error, never a panic.

use std::str::FromStr;
use std::sync::OnceLock;

use bitcoin::base58;
use bitcoin::bip32::{Xpriv, Xpub};
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::Network;
use regex::Regex;

use super::version::{KeyVersion, ScriptType};
use crate::error::WalletError;

/// Serialized length of a BIP32 extended key payload (version through key
/// material, checksum excluded).
pub const PAYLOAD_LEN: usize = 78;

/// Text length of every Base58Check extended key this core accepts.
pub const ENCODED_LEN: usize = 111;

static EXTENDED_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn extended_key_re() -> &'static Regex {
    EXTENDED_KEY_RE.get_or_init(|| {
        Regex::new(r"[xyztuv](pub|prv)[1-9A-HJ-NP-Za-km-z]{79,108}").expect("valid pattern")
    })
}

/// Classification of an extended key derived from its version prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub version: KeyVersion,
    pub network: Network,
    pub script_type: ScriptType,
    pub is_private: bool,
}

/// Base58Check-decode an extended key and verify its checksum.
///
/// The checksum is the first 4 bytes of double-SHA256 over the 78-byte
/// payload; a mismatch is reported as [`WalletError::InvalidChecksum`]
/// rather than a generic decode failure.
pub fn decode_checked(key: &str) -> Result<[u8; PAYLOAD_LEN], WalletError> {
    let raw = base58::decode(key).map_err(|e| WalletError::MalformedKey(e.to_string()))?;

    if raw.len() != PAYLOAD_LEN + 4 {
        return Err(WalletError::MalformedKey(format!(
            "decoded to {} bytes, expected {}",
            raw.len(),
            PAYLOAD_LEN + 4
        )));
    }

    let (payload, checksum) = raw.split_at(PAYLOAD_LEN);
    let expected = sha256d::Hash::hash(payload);
    if checksum != &expected.to_byte_array()[..4] {
        return Err(WalletError::InvalidChecksum(format!(
            "{}...",
            &key[..8.min(key.len())]
        )));
    }

    let mut out = [0u8; PAYLOAD_LEN];
    out.copy_from_slice(payload);
    Ok(out)
}

/// Re-encode a 78-byte payload with a freshly computed checksum.
pub fn encode_checked(payload: &[u8; PAYLOAD_LEN]) -> String {
    base58::encode_check(payload)
}

/// Inspect the 4-byte version prefix against the fixed 12-entry table.
pub fn classify(key: &str) -> Result<KeyInfo, WalletError> {
    let payload = decode_checked(key)?;
    let version = KeyVersion::from_bytes([payload[0], payload[1], payload[2], payload[3]])?;

    Ok(KeyInfo {
        version,
        network: version.network(),
        script_type: version.script_type(),
        is_private: version.is_private(),
    })
}

/// Re-serialize an extended key under a different version prefix.
///
/// Only same-class conversions are allowed: splicing private version bytes
/// onto public key material (or the reverse) fails with
/// [`WalletError::InvalidKeyVersion`]. Depth, fingerprint, chain code and
/// key material are untouched.
pub fn convert(key: &str, target: KeyVersion) -> Result<String, WalletError> {
    let mut payload = decode_checked(key)?;
    let current = KeyVersion::from_bytes([payload[0], payload[1], payload[2], payload[3]])?;

    if current.is_private() != target.is_private() {
        return Err(WalletError::InvalidKeyVersion(format!(
            "cannot convert {} to {}",
            current.prefix(),
            target.prefix()
        )));
    }

    payload[..4].copy_from_slice(&target.bytes());
    Ok(encode_checked(&payload))
}

/// Convert an exotic-version key to the x/t class of the same network and
/// visibility, so BIP32 tooling and the signing backend accept it.
///
/// Keys already in the base class pass through unchanged.
pub fn normalize(key: &str) -> Result<String, WalletError> {
    let info = classify(key)?;
    let base = info.version.base();

    if info.version == base {
        return Ok(key.to_string());
    }

    log::debug!(
        "Normalizing {} to {}",
        info.version.prefix(),
        base.prefix()
    );
    convert(key, base)
}

/// Validate length and shape without decoding.
///
/// Accepted form: exactly 111 characters, `[xyztuv](pub|prv)` prefix, the
/// rest Base58 alphabet.
pub fn validate(key: &str) -> Result<(), WalletError> {
    if key.len() != ENCODED_LEN {
        return Err(WalletError::MalformedKey(format!(
            "expected {} characters, got {}",
            ENCODED_LEN,
            key.len()
        )));
    }

    let re = extended_key_re();
    match re.find(key) {
        Some(m) if m.start() == 0 && m.end() == key.len() => Ok(()),
        _ => Err(WalletError::MalformedKey(
            "not a recognized extended key form".to_string(),
        )),
    }
}

pub fn is_valid_extended_key(key: &str) -> bool {
    validate(key).is_ok()
}

/// Find the first embedded extended key in a larger expression, such as a
/// descriptor body.
pub fn find_extended_key(text: &str) -> Option<&str> {
    extended_key_re().find(text).map(|m| m.as_str())
}

/// Count embedded extended keys in an expression.
pub fn count_extended_keys(text: &str) -> usize {
    extended_key_re().find_iter(text).count()
}

/// The fingerprint used for descriptor display, as 8 lowercase hex chars.
///
/// For depth-0 keys this is HASH160 of the key's own public key. For any
/// deeper key it is the parent fingerprint embedded at payload bytes 5..9,
/// read verbatim and never recomputed from the child.
pub fn fingerprint(key: &str) -> Result<String, WalletError> {
    let payload = decode_checked(key)?;
    let depth = payload[4];

    if depth > 0 {
        return Ok(hex::encode(&payload[5..9]));
    }

    let info = classify(key)?;
    let normalized = normalize(key)?;

    let fp = if info.is_private {
        let xprv = Xpriv::from_str(&normalized)
            .map_err(|e| WalletError::MalformedKey(e.to_string()))?;
        let secp = bitcoin::secp256k1::Secp256k1::new();
        xprv.fingerprint(&secp)
    } else {
        let xpub = Xpub::from_str(&normalized)
            .map_err(|e| WalletError::MalformedKey(e.to_string()))?;
        xpub.fingerprint()
    };

    Ok(fp.to_string())
}
