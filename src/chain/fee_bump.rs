//! RBF fee bumping
//!
//! Computes the effective fee rate of a pending transaction, validates a
//! replacement rate against it, and drives the backend through the
//! replace-by-fee build. The current rate is rounded to one significant
//! figure so the comparison tolerates estimator jitter.

use bitcoin::{Amount, Network};

use super::backend::{CreateWalletRequest, WalletBackend};
use super::provider::ChainDataProvider;
use crate::error::WalletError;
use crate::wallet::Wallet;

/// Result of a broadcast fee bump.
#[derive(Debug, Clone)]
pub struct BumpOutcome {
    pub broadcasted: bool,
    pub new_txid: Option<String>,
}

/// Effective fee rate of a transaction in sat/vB, rounded to one
/// significant figure.
pub fn current_fee_rate(fee: Amount, vsize: u64) -> Result<f64, WalletError> {
    if vsize == 0 {
        return Err(WalletError::Backend(
            "transaction virtual size is zero".to_string(),
        ));
    }

    Ok(round_to_one_sig_fig(fee.to_sat() as f64 / vsize as f64))
}

/// Round to one significant figure, halves away from zero: 25 becomes
/// 30, 0.14 becomes 0.1.
pub fn round_to_one_sig_fig(rate: f64) -> f64 {
    if rate == 0.0 || !rate.is_finite() {
        return rate;
    }

    let magnitude = rate.abs().log10().floor();
    let scale = 10f64.powf(magnitude);
    (rate / scale).round() * scale
}

/// Suggested replacement rate: the fee oracle's fastest-confirmation
/// tier.
pub async fn suggest_bump_rate<P: ChainDataProvider>(
    provider: &P,
    network: Network,
) -> Result<f64, WalletError> {
    let fees = provider.get_recommended_fees(network).await?;
    Ok(fees.fastest_fee)
}

/// A replacement rate must be a positive finite number strictly greater
/// than the current rate.
pub fn validate_new_rate(candidate: f64, current: f64) -> Result<(), WalletError> {
    if !candidate.is_finite() || candidate <= 0.0 {
        return Err(WalletError::FeeTooLow { candidate, current });
    }

    if candidate <= current {
        return Err(WalletError::FeeTooLow { candidate, current });
    }

    Ok(())
}

/// Replace a pending transaction with a higher-fee version.
///
/// The wallet must be able to sign: the backend is loaded with the
/// private descriptor pair so it can build and broadcast the
/// replacement.
pub async fn bump_transaction<B: WalletBackend>(
    backend: &B,
    wallet: &Wallet,
    txid: &str,
    new_rate: f64,
) -> Result<BumpOutcome, WalletError> {
    let record = wallet
        .transactions
        .iter()
        .find(|tx| tx.txid == txid)
        .ok_or_else(|| {
            WalletError::Backend(format!("transaction {} is not known to this wallet", txid))
        })?;

    if record.confirmed {
        return Err(WalletError::TransactionAlreadyConfirmed);
    }

    let current = current_fee_rate(record.fee, record.vsize)?;
    validate_new_rate(new_rate, current)?;

    log::info!(
        "Bumping transaction {} from {} to {} sat/vB",
        txid,
        current,
        new_rate
    );

    let request = CreateWalletRequest::signing(wallet)?;
    let handle = backend.create_wallet(request).await?;
    let response = backend.build_fee_bump(&handle, txid, new_rate).await?;

    if let Some(message) = &response.error_message {
        // The backend reports a race with confirmation as its own case.
        if message.starts_with("TransactionConfirmed") {
            return Err(WalletError::TransactionAlreadyConfirmed);
        }
        return Err(WalletError::Backend(message.clone()));
    }

    if !response.broadcasted {
        return Err(WalletError::Backend(
            "fee bump was not broadcast".to_string(),
        ));
    }

    log::info!(
        "Fee bump for {} broadcast as {}",
        txid,
        response.new_txid.as_deref().unwrap_or("<unknown>")
    );

    Ok(BumpOutcome {
        broadcasted: true,
        new_txid: response.new_txid,
    })
}
