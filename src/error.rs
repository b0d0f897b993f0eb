use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("Unsupported key version: {0}")]
    UnsupportedKeyVersion(String),

    #[error("Invalid key version: {0}")]
    InvalidKeyVersion(String),

    #[error("Malformed extended key: {0}")]
    MalformedKey(String),

    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),

    #[error("Invalid derivation: {0}")]
    InvalidDerivation(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Fee too low: {candidate} sat/vB does not exceed current rate of {current} sat/vB")]
    FeeTooLow { candidate: f64, current: f64 },

    #[error("Transaction already confirmed")]
    TransactionAlreadyConfirmed,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
