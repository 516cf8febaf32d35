/// Index and value of the largest element. Ties keep the lowest index.
pub(crate) fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values.iter().copied().enumerate().fold(None, |best, (i, v)| match best {
        Some((_, b)) if v <= b => best,
        _ => Some((i, v)),
    })
}

/// Probability as a percentage rounded half-to-even at two decimals.
///
/// The scaling happens in `f32` so that e.g. `0.7` reports `70.0` rather than `69.99999880790710`.
pub(crate) fn confidence_percent(probability: f32) -> f64 {
    let percent = f64::from(probability * 100.0);
    (percent * 100.0).round_ties_even() / 100.0
}
