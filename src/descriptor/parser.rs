//! Descriptor parsing and construction
//!
//! Two key-expression shapes are accepted: the origin form
//! `wpkh([fingerprint/path]key/0/*)` and the private form
//! `wpkh(xprv/84'/1'/0'/0/*)` where the account path follows the key.
//! Generated descriptors always use the origin form with the key at
//! account depth, matching what the signing backend expects.

use bitcoin::Network;

use super::{account_path_for, script_type_for_path, DescriptorParts, DescriptorSet};
use crate::error::WalletError;
use crate::keys::{codec, derive, ScriptType};

fn template_for(script_type: ScriptType) -> (&'static str, &'static str) {
    match script_type {
        ScriptType::P2pkh => ("pkh(", ")"),
        ScriptType::P2wpkh => ("wpkh(", ")"),
        ScriptType::ShP2wpkh => ("sh(wpkh(", "))"),
        ScriptType::P2tr => ("tr(", ")"),
    }
}

fn script_type_from_prefix(
    before: &str,
) -> Result<(ScriptType, &'static str, &'static str), WalletError> {
    for script_type in [
        ScriptType::ShP2wpkh,
        ScriptType::P2wpkh,
        ScriptType::P2tr,
        ScriptType::P2pkh,
    ] {
        let (prefix, suffix) = template_for(script_type);
        if before.starts_with(prefix) {
            return Ok((script_type, prefix, suffix));
        }
    }

    let tag = match before.find('(') {
        Some(i) => &before[..i],
        None => before,
    };
    Err(WalletError::UnsupportedScriptType(tag.to_string()))
}

fn split_origin(origin: &str) -> Result<(String, String), WalletError> {
    if origin.len() < 8 {
        return Err(WalletError::MalformedDescriptor(
            "key origin is too short".to_string(),
        ));
    }

    // Byte 8 can sit inside a multibyte character; direct slicing would
    // panic there.
    let (fp, rest) = match (origin.get(..8), origin.get(8..)) {
        (Some(fp), Some(rest)) => (fp, rest),
        _ => {
            return Err(WalletError::MalformedDescriptor(
                "invalid fingerprint in key origin".to_string(),
            ))
        }
    };
    if !fp.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::MalformedDescriptor(
            "invalid fingerprint in key origin".to_string(),
        ));
    }
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(WalletError::MalformedDescriptor(
            "malformed key origin path".to_string(),
        ));
    }

    Ok((fp.to_ascii_lowercase(), rest.to_string()))
}

/// Parse a single-key descriptor into structured parts.
pub fn parse(expression: &str) -> Result<DescriptorParts, WalletError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(WalletError::MalformedDescriptor(
            "empty descriptor".to_string(),
        ));
    }

    // The checksum tag is carried verbatim; recomputing it belongs to the
    // signing backend.
    let (body, checksum) = match expression.rfind('#') {
        Some(i) => {
            let tag = &expression[i + 1..];
            if tag.len() < 8 {
                return Err(WalletError::MalformedDescriptor(
                    "incomplete descriptor checksum".to_string(),
                ));
            }
            if tag.len() > 8 {
                return Err(WalletError::MalformedDescriptor(
                    "descriptor checksum is too long".to_string(),
                ));
            }
            (&expression[..i], Some(tag.to_string()))
        }
        None => (expression, None),
    };

    let key = match codec::find_extended_key(body) {
        Some(k) => k.to_string(),
        None => {
            return Err(WalletError::MalformedDescriptor(
                "no extended key in expression".to_string(),
            ))
        }
    };
    if codec::count_extended_keys(body) > 1 {
        return Err(WalletError::MalformedDescriptor(
            "only single-key expressions are supported".to_string(),
        ));
    }

    let key_info = codec::classify(&key)?;

    let key_start = body.find(key.as_str()).ok_or_else(|| {
        WalletError::MalformedDescriptor("no extended key in expression".to_string())
    })?;
    let before = &body[..key_start];
    let after = &body[key_start + key.len()..];

    let (tag_type, prefix, suffix) = script_type_from_prefix(before)?;

    let rest = &before[prefix.len()..];
    let origin = if rest.is_empty() {
        None
    } else if rest.starts_with('[') && rest.ends_with(']') {
        Some(rest[1..rest.len() - 1].to_string())
    } else {
        return Err(WalletError::MalformedDescriptor(
            "malformed key origin".to_string(),
        ));
    };

    if !after.ends_with(suffix) {
        return Err(WalletError::MalformedDescriptor(
            "unbalanced script template".to_string(),
        ));
    }
    let middle = &after[..after.len() - suffix.len()];
    if !middle.is_empty() && !middle.starts_with('/') {
        return Err(WalletError::MalformedDescriptor(
            "unexpected text after key".to_string(),
        ));
    }

    let (fingerprint, path, key_path) = match &origin {
        Some(origin_text) => {
            let (fp, origin_path) = split_origin(origin_text)?;
            let path = if origin_path.is_empty() {
                // A bare fingerprint means a depth-0 master key import.
                account_path_for(tag_type, key_info.network).to_string()
            } else {
                // An origin can run deeper than the account; only its
                // first three components pick the wallet type. The full
                // origin text stays verbatim in `origin`.
                let components: Vec<&str> = origin_path
                    .split('/')
                    .filter(|c| !c.is_empty())
                    .collect();
                let account = components.len().min(3);
                format!("m/{}", components[..account].join("/"))
            };
            let key_path = (!middle.is_empty()).then(|| middle.to_string());
            (fp, path, key_path)
        }
        None => {
            let components: Vec<&str> = middle
                .trim_start_matches('/')
                .split('/')
                .filter(|c| !c.is_empty())
                .collect();

            if components.len() >= 3 {
                // Private form: account path follows the key.
                let path = format!("m/{}", components[..3].join("/"));
                let key_path = (components.len() > 3)
                    .then(|| format!("/{}", components[3..].join("/")));
                (codec::fingerprint(&key)?, path, key_path)
            } else {
                let payload = codec::decode_checked(&key)?;
                if payload[4] != 0 {
                    return Err(WalletError::MalformedDescriptor(
                        "missing key origin for a non-master key".to_string(),
                    ));
                }
                let path = account_path_for(tag_type, key_info.network).to_string();
                let key_path = (!middle.is_empty()).then(|| middle.to_string());
                (codec::fingerprint(&key)?, path, key_path)
            }
        }
    };

    let (path_script, path_network) = script_type_for_path(&path)?;

    if path_network != key_info.network {
        return Err(WalletError::MalformedDescriptor(format!(
            "network mismatch: key is {}, account path {} is {}",
            key_info.network, path, path_network
        )));
    }
    if path_script != tag_type {
        return Err(WalletError::UnsupportedScriptType(format!(
            "{} template does not match account path {}",
            tag_type, path
        )));
    }

    Ok(DescriptorParts {
        script_type: tag_type,
        network: key_info.network,
        key,
        key_is_private: key_info.is_private,
        fingerprint,
        path,
        origin,
        key_path,
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
        checksum,
    })
}

/// Rebuild a canonical receive descriptor for the account-level external
/// chain, regardless of what key path the parsed expression carried.
pub fn with_account_level_key_path(parts: &DescriptorParts) -> String {
    let origin_path = parts.path.strip_prefix('m').unwrap_or(&parts.path);
    let checksum = parts
        .checksum
        .as_deref()
        .map(|c| format!("#{}", c))
        .unwrap_or_default();

    format!(
        "{}[{}{}]{}/0/*{}{}",
        parts.prefix, parts.fingerprint, origin_path, parts.key, parts.suffix, checksum
    )
}

/// Build the descriptor set for a wallet from an account-level key.
///
/// The key must already sit at account depth; callers holding a master key
/// derive the account key first. Generated descriptors carry no checksum.
pub fn build_from_account_key(
    account_key: &str,
    fingerprint: &str,
    script_type: ScriptType,
    network: Network,
) -> Result<DescriptorSet, WalletError> {
    let info = codec::classify(account_key)?;
    let (prefix, suffix) = template_for(script_type);
    let path = account_path_for(script_type, network);
    let origin_path = path.strip_prefix('m').unwrap_or(path);

    let (public_key, private_key) = if info.is_private {
        let xprv = derive::parse_xprv(account_key)?;
        let xpub = derive::xpub_from_xprv(&xprv);
        (xpub.to_string(), Some(xprv.to_string()))
    } else {
        (codec::normalize(account_key)?, None)
    };

    let external = format!(
        "{}[{}{}]{}/0/*{}",
        prefix, fingerprint, origin_path, public_key, suffix
    );
    let internal = format!(
        "{}[{}{}]{}/1/*{}",
        prefix, fingerprint, origin_path, public_key, suffix
    );
    let private = private_key.map(|xprv| {
        format!(
            "{}[{}{}]{}/0/*{}",
            prefix, fingerprint, origin_path, xprv, suffix
        )
    });

    Ok(DescriptorSet {
        external,
        internal,
        private,
    })
}

/// Derive the internal-chain variant of a descriptor by swapping the
/// external chain marker. Any checksum is dropped since it no longer
/// matches the modified expression.
pub fn internal_variant(descriptor: &str) -> String {
    let base = match descriptor.rfind('#') {
        Some(i) if descriptor.len() - i == 9 => &descriptor[..i],
        _ => descriptor,
    };

    match base.rfind("/0/*") {
        Some(i) => format!("{}/1/*{}", &base[..i], &base[i + 4..]),
        None => base.to_string(),
    }
}
