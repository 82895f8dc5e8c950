//! Deterministic bag-of-words embedding used when no provider is reachable.
//!
//! Output must be bit-identical across runs and across implementations, so the
//! token hash wraps as a 32-bit signed accumulator over UTF-16 code units.

use crate::similarity::l2_normalize;
use givewise_core::Embedding;

pub const FALLBACK_DIMENSION: usize = 384;

/// `hash = ((hash << 5) - hash) + unit` with 32-bit wrapping at every step.
pub fn token_hash(token: &str) -> i32 {
    token.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

pub fn bucket(token: &str) -> usize {
    (token_hash(token).unsigned_abs() % FALLBACK_DIMENSION as u32) as usize
}

/// Each token adds `1 / (position + 1)` to its bucket; the sum is L2-normalized.
/// Text without tokens yields the zero vector.
pub fn fallback_embedding(text: &str) -> Embedding {
    let lowered = text.to_lowercase();
    let mut embedding = vec![0.0; FALLBACK_DIMENSION];

    for (position, token) in lowered.split_whitespace().enumerate() {
        embedding[bucket(token)] += 1.0 / (position + 1) as f64;
    }

    l2_normalize(&mut embedding);
    embedding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::magnitude;

    #[test]
    fn test_token_hash_reference_values() {
        assert_eq!(token_hash(""), 0);
        assert_eq!(token_hash("x"), 120);
        assert_eq!(token_hash("help"), 3_198_785);
        assert_eq!(token_hash("water"), 112_903_447);
        assert_eq!(token_hash("wells"), 113_015_141);
        assert_eq!(token_hash("philanthropy"), 2_092_948_994);
    }

    #[test]
    fn test_token_hash_wraps_to_negative() {
        assert_eq!(token_hash("community"), -1_480_249_367);
        assert_eq!(bucket("community"), 23);
    }

    #[test]
    fn test_token_hash_uses_utf16_units() {
        assert_eq!(token_hash("ñandú"), 225_567_348);
        assert_eq!(bucket("ñandú"), 372);
    }

    #[test]
    fn test_reference_vector_for_help_water_wells() {
        let embedding = fallback_embedding("help water wells");
        assert_eq!(embedding.len(), FALLBACK_DIMENSION);

        assert_eq!(embedding[65], 0.8571428571428571);
        assert_eq!(embedding[151], 0.42857142857142855);
        assert_eq!(embedding[101], 0.2857142857142857);
        let non_zero = embedding.iter().filter(|v| **v != 0.0).count();
        assert_eq!(non_zero, 3);
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let first = fallback_embedding("Help Us Build 10 New Wells in Rural Uganda");
        let second = fallback_embedding("Help Us Build 10 New Wells in Rural Uganda");
        let first_bits: Vec<u64> = first.iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_case_and_whitespace_runs_do_not_matter() {
        assert_eq!(
            fallback_embedding("  Help\tWATER \n\n wells "),
            fallback_embedding("help water wells")
        );
    }

    #[test]
    fn test_colliding_tokens_accumulate() {
        let embedding = fallback_embedding("water water");
        assert_eq!(embedding[151], 1.0);
    }

    #[test]
    fn test_non_empty_text_is_unit_length() {
        for text in ["a", "help water wells", "Plant 1,000 Trees in São Paulo"] {
            let norm = magnitude(&fallback_embedding(text));
            assert!((norm - 1.0).abs() < 1e-12, "norm of {:?} was {}", text, norm);
        }
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        for text in ["", "   ", "\n\t"] {
            let embedding = fallback_embedding(text);
            assert_eq!(embedding.len(), FALLBACK_DIMENSION);
            assert!(embedding.iter().all(|v| *v == 0.0));
        }
    }
}
