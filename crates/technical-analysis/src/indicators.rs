/// Simple Moving Average, aligned to the input.
///
/// Index `i` holds the mean of `data[i + 1 - period..=i]`; indices before
/// `period - 1` are `None`.
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; data.len()];
    }

    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        if i + 1 < period {
            result.push(None);
            continue;
        }
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(Some(sum / period as f64));
    }
    result
}

/// Close-to-close changes split into gain and loss magnitudes.
///
/// Both vectors have `data.len() - 1` entries; entry `j` is the change
/// from `data[j]` to `data[j + 1]`.
pub fn gains_and_losses(data: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = Vec::with_capacity(data.len().saturating_sub(1));
    let mut losses = Vec::with_capacity(data.len().saturating_sub(1));

    for w in data.windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    (gains, losses)
}

/// Relative Strength Index over a simple rolling mean of gains and losses,
/// aligned to the input.
///
/// Index `i` needs `period` deltas behind it, so the first `period` entries
/// are `None`. A window with no losses reads 100.
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    let (gains, losses) = gains_and_losses(data);

    for i in period..data.len() {
        // deltas ending at price index i are gains[i - period..i]
        let window = i - period..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        result[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
