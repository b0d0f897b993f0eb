//! Extended key handling
//!
//! - `version.rs` - the fixed SLIP-132 version table
//! - `codec.rs` - Base58Check codec, classification, conversion
//! - `derive.rs` - BIP32 derivation wrappers

pub mod codec;
pub mod derive;
pub mod version;

pub use codec::KeyInfo;
pub use version::{KeyVersion, ScriptType};
