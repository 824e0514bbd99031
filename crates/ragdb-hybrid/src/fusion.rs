//! Min-max normalization and weighted blending of score lists.

/// Rescale a score list into `[0, 1]` by `(v - min) / (max - min)`.
///
/// Degenerate lists (empty, singleton, all values equal) map to all
/// zeros. Returning 0.0 rather than 1.0 keeps a homogeneous candidate
/// pool from outranking genuinely differentiated scores, and it must not
/// change: downstream tie-breaking depends on it.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };
    let mut min = first;
    let mut max = first;
    for &value in scores {
        min = min.min(value);
        max = max.max(value);
    }
    let range = max - min;
    if range <= f32::EPSILON {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|&value| (value - min) / range).collect()
}

/// Elementwise `alpha * semantic + (1 - alpha) * lexical`, with `alpha`
/// clamped to `[0, 1]` first. At the endpoints the blend reproduces the
/// corresponding input exactly, not approximately.
pub fn blend(semantic: &[f32], lexical: &[f32], alpha: f32) -> Vec<f32> {
    debug_assert_eq!(semantic.len(), lexical.len());
    let alpha = alpha.clamp(0.0, 1.0);
    semantic
        .iter()
        .zip(lexical)
        .map(|(&s, &l)| alpha * s + (1.0 - alpha) * l)
        .collect()
}
