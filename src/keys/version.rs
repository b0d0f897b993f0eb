use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Script types this core can derive addresses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptType {
    P2pkh,
    P2wpkh,
    #[serde(rename = "p2sh-p2wpkh")]
    ShP2wpkh,
    P2tr,
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::ShP2wpkh => "p2sh-p2wpkh",
            ScriptType::P2tr => "p2tr",
        };
        write!(f, "{}", s)
    }
}

/// SLIP-132 extended key version prefixes.
///
/// The 12 supported entries: mainnet x/y/z and testnet t/u/v, each in a
/// public and a private variant. Anything else is rejected by
/// [`KeyVersion::from_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyVersion {
    Xpub,
    Ypub,
    Zpub,
    Tpub,
    Upub,
    Vpub,
    Xprv,
    Yprv,
    Zprv,
    Tprv,
    Uprv,
    Vprv,
}

impl KeyVersion {
    pub const ALL: [KeyVersion; 12] = [
        KeyVersion::Xpub,
        KeyVersion::Ypub,
        KeyVersion::Zpub,
        KeyVersion::Tpub,
        KeyVersion::Upub,
        KeyVersion::Vpub,
        KeyVersion::Xprv,
        KeyVersion::Yprv,
        KeyVersion::Zprv,
        KeyVersion::Tprv,
        KeyVersion::Uprv,
        KeyVersion::Vprv,
    ];

    /// The 4-byte serialization prefix for this version.
    pub fn bytes(self) -> [u8; 4] {
        match self {
            KeyVersion::Xpub => [0x04, 0x88, 0xb2, 0x1e],
            KeyVersion::Ypub => [0x04, 0x9d, 0x7c, 0xb2],
            KeyVersion::Zpub => [0x04, 0xb2, 0x47, 0x46],
            KeyVersion::Tpub => [0x04, 0x35, 0x87, 0xcf],
            KeyVersion::Upub => [0x04, 0x4a, 0x52, 0x62],
            KeyVersion::Vpub => [0x04, 0x5f, 0x1c, 0xf6],
            KeyVersion::Xprv => [0x04, 0x88, 0xad, 0xe4],
            KeyVersion::Yprv => [0x04, 0x9d, 0x78, 0x78],
            KeyVersion::Zprv => [0x04, 0xb2, 0x43, 0x0c],
            KeyVersion::Tprv => [0x04, 0x35, 0x83, 0x94],
            KeyVersion::Uprv => [0x04, 0x4a, 0x4e, 0x28],
            KeyVersion::Vprv => [0x04, 0x5f, 0x18, 0xbc],
        }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self, WalletError> {
        Self::ALL
            .into_iter()
            .find(|v| v.bytes() == bytes)
            .ok_or_else(|| WalletError::UnsupportedKeyVersion(hex::encode(bytes)))
    }

    /// Parse a 4-character text prefix such as `"zpub"` or `"tprv"`.
    pub fn from_prefix(prefix: &str) -> Result<Self, WalletError> {
        Self::ALL
            .into_iter()
            .find(|v| v.prefix() == prefix)
            .ok_or_else(|| WalletError::UnsupportedKeyVersion(prefix.to_string()))
    }

    pub fn prefix(self) -> &'static str {
        match self {
            KeyVersion::Xpub => "xpub",
            KeyVersion::Ypub => "ypub",
            KeyVersion::Zpub => "zpub",
            KeyVersion::Tpub => "tpub",
            KeyVersion::Upub => "upub",
            KeyVersion::Vpub => "vpub",
            KeyVersion::Xprv => "xprv",
            KeyVersion::Yprv => "yprv",
            KeyVersion::Zprv => "zprv",
            KeyVersion::Tprv => "tprv",
            KeyVersion::Uprv => "uprv",
            KeyVersion::Vprv => "vprv",
        }
    }

    pub fn network(self) -> Network {
        match self {
            KeyVersion::Xpub
            | KeyVersion::Ypub
            | KeyVersion::Zpub
            | KeyVersion::Xprv
            | KeyVersion::Yprv
            | KeyVersion::Zprv => Network::Bitcoin,
            _ => Network::Testnet,
        }
    }

    /// The script type implied by this version prefix.
    pub fn script_type(self) -> ScriptType {
        match self {
            KeyVersion::Xpub | KeyVersion::Xprv | KeyVersion::Tpub | KeyVersion::Tprv => {
                ScriptType::P2pkh
            }
            KeyVersion::Ypub | KeyVersion::Yprv | KeyVersion::Upub | KeyVersion::Uprv => {
                ScriptType::ShP2wpkh
            }
            KeyVersion::Zpub | KeyVersion::Zprv | KeyVersion::Vpub | KeyVersion::Vprv => {
                ScriptType::P2wpkh
            }
        }
    }

    pub fn is_private(self) -> bool {
        matches!(
            self,
            KeyVersion::Xprv
                | KeyVersion::Yprv
                | KeyVersion::Zprv
                | KeyVersion::Tprv
                | KeyVersion::Uprv
                | KeyVersion::Vprv
        )
    }

    /// The x/t-class version with the same network and visibility.
    ///
    /// BIP32 tooling only accepts the base class; exotic prefixes must be
    /// converted down before derivation.
    pub fn base(self) -> KeyVersion {
        match (self.network(), self.is_private()) {
            (Network::Bitcoin, false) => KeyVersion::Xpub,
            (Network::Bitcoin, true) => KeyVersion::Xprv,
            (_, false) => KeyVersion::Tpub,
            (_, true) => KeyVersion::Tprv,
        }
    }
}
