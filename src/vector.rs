//! This is the vector math module
//! Provide squared Euclidean distance and in-place L2 normalization

/// Squared Euclidean Distance
/// dist = sum((a[i] - b[i])^2) for i = 0..min(a.len(), b.len())
/// Components past the shorter vector are ignored, so mismatched
/// dimensions degrade instead of panicking
pub fn squared_distance(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// In-place L2 Normalization
/// vec = vec / ||vec||
/// A zero vector is left untouched
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter()
        .map(|x| x * x)
        .sum::<f32>()
        .sqrt();

    if norm == 0.0 {
        return;
    }

    for x in vector.iter_mut() {
        *x /= norm;
    }
}
