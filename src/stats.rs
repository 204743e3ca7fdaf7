//! Font size statistics

use std::collections::HashMap;

/// Round to two decimal places, the precision sizes are compared at
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The unique most frequent value, or `None` if several values tie (or input is empty)
pub fn unique_mode(values: &[f64]) -> Option<f64> {
    // Group on hundredths so values equal after rounding share a bucket
    let mut counts: HashMap<i64, (usize, f64)> = HashMap::new();
    for &v in values {
        let entry = counts.entry((v * 100.0).round() as i64).or_insert((0, v));
        entry.0 += 1;
    }

    let top = counts.values().map(|(count, _)| *count).max()?;
    let mut modes = counts.values().filter(|(count, _)| *count == top);
    let (_, value) = modes.next()?;
    match modes.next() {
        Some(_) => None,
        None => Some(*value),
    }
}

/// Median; the mean of the two middle values for even-length input
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Infer the body text size: the unique mode, falling back to the median on ties
pub fn body_font_size(sizes: &[f64]) -> Option<f64> {
    unique_mode(sizes).or_else(|| median(sizes))
}
