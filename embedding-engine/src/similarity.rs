use givewise_core::Embedding;

pub fn magnitude(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Scale to unit length in place. A zero vector is left untouched.
pub fn l2_normalize(vector: &mut [f64]) {
    let norm = magnitude(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Cosine similarity in `[-1, 1]`.
///
/// Vectors of different length, zero vectors and non-finite input all score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Component-wise mean of equally sized vectors. `None` for an empty slice.
pub fn mean(vectors: &[Embedding]) -> Option<Embedding> {
    let first = vectors.first()?;
    let mut sum = vec![0.0; first.len()];
    for vector in vectors {
        for (total, value) in sum.iter_mut().zip(vector) {
            *total += value;
        }
    }

    let count = vectors.len() as f64;
    for total in sum.iter_mut() {
        *total /= count;
    }
    Some(sum)
}
