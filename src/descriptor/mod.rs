//! Output descriptor handling
//!
//! Single-key descriptors only: `pkh`, `wpkh`, `sh(wpkh)` and `tr`
//! templates around one extended key, with an optional key origin and an
//! optional verbatim checksum tag.

pub mod parser;

use bitcoin::Network;

use crate::error::WalletError;
use crate::keys::ScriptType;

pub use parser::{
    build_from_account_key, internal_variant, parse, with_account_level_key_path,
};

/// The fixed account-path table. Wallet accounts live at exactly one of
/// these paths; anything else is not a supported script type.
const ACCOUNT_PATHS: [(&str, ScriptType, Network); 8] = [
    ("m/86'/0'/0'", ScriptType::P2tr, Network::Bitcoin),
    ("m/86'/1'/0'", ScriptType::P2tr, Network::Testnet),
    ("m/84'/0'/0'", ScriptType::P2wpkh, Network::Bitcoin),
    ("m/84'/1'/0'", ScriptType::P2wpkh, Network::Testnet),
    ("m/49'/0'/0'", ScriptType::ShP2wpkh, Network::Bitcoin),
    ("m/49'/1'/0'", ScriptType::ShP2wpkh, Network::Testnet),
    ("m/44'/0'/0'", ScriptType::P2pkh, Network::Bitcoin),
    ("m/44'/1'/0'", ScriptType::P2pkh, Network::Testnet),
];

/// Normalize hardened markers for table lookup. Stored parts keep the
/// verbatim text; only comparisons go through this.
fn canonical_path(path: &str) -> String {
    path.replace(['h', 'H'], "'")
}

/// Look up the script type and network for an account path.
pub fn script_type_for_path(path: &str) -> Result<(ScriptType, Network), WalletError> {
    let canonical = canonical_path(path);

    ACCOUNT_PATHS
        .iter()
        .find(|(p, _, _)| *p == canonical)
        .map(|(_, script_type, network)| (*script_type, *network))
        .ok_or_else(|| {
            WalletError::UnsupportedScriptType(format!("no wallet type for path {}", path))
        })
}

/// The account path for a script type on a network. Every network other
/// than mainnet uses the testnet coin type.
pub fn account_path_for(script_type: ScriptType, network: Network) -> &'static str {
    let network = match network {
        Network::Bitcoin => Network::Bitcoin,
        _ => Network::Testnet,
    };

    ACCOUNT_PATHS
        .iter()
        .find(|(_, s, n)| *s == script_type && *n == network)
        .map(|(p, _, _)| *p)
        .unwrap_or("m/84'/1'/0'")
}

/// Structured parts of a parsed descriptor.
///
/// Text fields are verbatim slices of the input so that
/// [`DescriptorParts::reconstruct`] is byte-identical for round trips.
/// `origin` is `None` for the private form, where the account path follows
/// the key instead of sitting in a `[fingerprint/path]` prefix. A
/// defaulted path (master key, no origin) reconstructs canonically since
/// the input carried no path text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorParts {
    pub script_type: ScriptType,
    pub network: Network,
    /// The embedded extended key, verbatim.
    pub key: String,
    pub key_is_private: bool,
    /// 8 lowercase hex chars; from the origin when present, otherwise
    /// computed from the key.
    pub fingerprint: String,
    /// Account path with a leading `m`, hardened markers as written. An
    /// origin running deeper than the account contributes only its first
    /// three components here.
    pub path: String,
    /// Verbatim origin content (`fingerprint/path`) when bracketed.
    pub origin: Option<String>,
    /// Trailing key path such as `/0/*`, if present.
    pub key_path: Option<String>,
    /// Script template opening, e.g. `wpkh(` or `sh(wpkh(`.
    pub prefix: String,
    /// Matching closing parens.
    pub suffix: String,
    /// Verbatim checksum tag without the `#`, never recomputed here.
    pub checksum: Option<String>,
}

impl DescriptorParts {
    pub fn is_public(&self) -> bool {
        !self.key_is_private
    }

    /// Rebuild the exact input expression.
    pub fn reconstruct(&self) -> String {
        let key_path = self.key_path.as_deref().unwrap_or("");
        let checksum = self
            .checksum
            .as_deref()
            .map(|c| format!("#{}", c))
            .unwrap_or_default();

        match &self.origin {
            Some(origin) => format!(
                "{}[{}]{}{}{}{}",
                self.prefix, origin, self.key, key_path, self.suffix, checksum
            ),
            None => {
                let path = self.path.strip_prefix('m').unwrap_or(&self.path);
                format!(
                    "{}{}{}{}{}{}",
                    self.prefix, self.key, path, key_path, self.suffix, checksum
                )
            }
        }
    }
}

/// Descriptors generated for a wallet: public external/internal receive
/// chains plus, when private material was supplied, a signing descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSet {
    pub external: String,
    pub internal: String,
    pub private: Option<String>,
}
