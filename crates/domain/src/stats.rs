//! Numeric helpers shared by the window and rollup reductions.

/// Round to two decimal digits, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, `None` for an empty input.
#[must_use]
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    // Window and rollup sizes stay far below 2^52.
    #[allow(clippy::cast_precision_loss)]
    Some(sum / count as f64)
}
