//! Approximate key lookup
//!
//! Used only as an explicit fallback when a dataset key has drifted (extra
//! punctuation, a typo, a pluralization). Callers pass a conservative
//! threshold and treat `None` as "drop the item".

/// Normalized edit-distance similarity of two strings, in `[0, 1]`
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Best-scoring candidate at or above `threshold`.
///
/// Ties keep the first candidate in iteration order, so callers that need a
/// deterministic answer must iterate in a deterministic order.
pub fn best_match<'a, I>(needle: &str, candidates: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let ratio = similarity_ratio(needle, candidate);
        if best.map_or(true, |(_, r)| ratio > r) {
            best = Some((candidate, ratio));
        }
    }
    best.filter(|(_, r)| *r >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_above_threshold() {
        let keys = ["head ache", "knee swelling", "fever"];
        let found = best_match("head-ache", keys.iter().copied(), 0.85);
        assert_eq!(found.map(|(k, _)| k), Some("head ache"));
    }

    #[test]
    fn test_best_match_below_threshold_is_dropped() {
        let keys = ["head ache", "knee swelling"];
        assert!(best_match("ankle sprain", keys.iter().copied(), 0.85).is_none());
        assert!(best_match("fever", std::iter::empty(), 0.0).is_none());
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("fever", "fever"), 1.0);
        assert!(similarity_ratio("fever", "xyz") < 0.5);
    }
}
