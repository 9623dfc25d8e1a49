pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Weighted arithmetic mean over `(value, weight)` pairs.
/// Returns `None` when there is nothing to average or all weights are zero.
pub fn weighted_mean(data: &[(f64, f64)]) -> Option<f64> {
    let total_weight = data.iter().map(|(_, w)| *w).sum::<f64>();

    if data.is_empty() || total_weight <= 0.0 {
        return None;
    }

    let weighted_sum = data.iter().map(|(v, w)| v * w).sum::<f64>();
    Some(weighted_sum / total_weight)
}

/// Least-squares slope of `ys` against their index positions.
pub fn slope(ys: &[f64]) -> Option<f64> {
    if ys.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    let x_mean = mean(&xs)?;
    let y_mean = mean(ys)?;

    let (num, den) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(num, den), (x, y)| {
            let dx = x - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    Some(num / den)
}
