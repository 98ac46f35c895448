//! Dense vector math used by the index.
//!
//! Callers are expected to pass equal-length slices; the index checks
//! dimensions before it gets here.

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm, scaled by the largest component so that squaring
/// neither overflows nor underflows for finite input.
pub fn norm(v: &[f32]) -> f32 {
    let scale = max_abs(v);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale * scaled_sum_sq(v, scale).sqrt()
}

fn max_abs(v: &[f32]) -> f32 {
    let mut m = 0.0f32;
    for x in v {
        if x.is_nan() {
            return f32::NAN;
        }
        m = m.max(x.abs());
    }
    m
}

fn scaled_sum_sq(v: &[f32], scale: f32) -> f32 {
    v.iter().map(|x| (x / scale) * (x / scale)).sum()
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Unit-length copy of `v`, or `None` when the norm is zero or not finite.
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out).then_some(out)
}

/// Scale `v` to unit length. Returns `false` (leaving `v` untouched) when
/// the norm is zero or not finite.
pub fn normalize_in_place(v: &mut [f32]) -> bool {
    let scale = max_abs(v);
    if scale == 0.0 || !scale.is_finite() {
        return false;
    }
    let n = scaled_sum_sq(v, scale).sqrt();
    for x in v.iter_mut() {
        *x = (*x / scale) / n;
    }
    true
}

/// Cosine similarity, `None` if either vector is degenerate.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    Some(dot(&normalize(a)?, &normalize(b)?))
}
