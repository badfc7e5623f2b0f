//! Technical indicators over closing prices.
//!
//! Closes must be in ascending chronological order (oldest first).

use tracing::warn;

use crate::constants::indicators::RSI_NEUTRAL;
use crate::error::IndicatorError;

/// Rolling simple moving average. Index `i` holds the mean of
/// `closes[i + 1 - window..=i]`, or `None` while fewer than `window` closes
/// are available.
pub fn sma_series(closes: &[f64], window: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if window == 0 || closes.len() < window {
        return Err(IndicatorError::InsufficientData {
            count: closes.len(),
            required: window.max(1),
        });
    }

    let mut out = Vec::with_capacity(closes.len());
    let mut sum = 0.0;
    for (i, close) in closes.iter().enumerate() {
        sum += close;
        if i >= window {
            sum -= closes[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }
    Ok(out)
}

/// Most recent SMA value.
pub fn sma(closes: &[f64], window: usize) -> Result<f64, IndicatorError> {
    if window == 0 || closes.len() < window {
        return Err(IndicatorError::InsufficientData {
            count: closes.len(),
            required: window.max(1),
        });
    }
    let tail = &closes[closes.len() - window..];
    Ok(tail.iter().sum::<f64>() / window as f64)
}

/// Relative Strength Index of the last `period` price changes, simple-average
/// smoothing.
///
/// Never fails: an all-gain window saturates at 100, an all-loss window at 0,
/// and anything that cannot be computed (too few closes, non-finite input, a
/// perfectly flat window) falls back to the neutral 50.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        warn!(
            "⚠️ [RSI] Not enough data: have {}, need {} - using neutral {}",
            closes.len(),
            period + 1,
            RSI_NEUTRAL
        );
        return RSI_NEUTRAL;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        warn!("⚠️ [RSI] Non-finite prices in window - using neutral {}", RSI_NEUTRAL);
        return RSI_NEUTRAL;
    }

    match (avg_gain > 0.0, avg_loss > 0.0) {
        (false, false) => RSI_NEUTRAL,
        (true, false) => 100.0,
        (false, true) => 0.0,
        (true, true) => {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        }
    }
}

/// Percentage `from` would have to move to reach `to`, relative to `from`.
pub fn pct_change(from: f64, to: f64) -> f64 {
    (to - from) * 100.0 / from
}
