//! 編集距離スコア
//!
//! Levenshtein distance and the normalized similarity used to rank dropdown
//! options. Distances are counted on `char`s, so accented street names cost
//! one edit per character rather than per byte.

/// Levenshtein distance between `a` and `b`.
///
/// Minimum number of single-character insertions, deletions or substitutions
/// needed to turn `a` into `b`.
pub fn distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // two rows are enough: row i only reads row i-1
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Similarity in `[0, 1]`, `1 - distance / max(len(a), len(b), 1)`.
///
/// Two empty strings are identical and score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count()).max(1);
    1.0 - (distance(a, b) as f64 / max_len as f64)
}

/// Case- and spacing-insensitive form used before scoring.
///
/// Lowercases, trims and collapses whitespace runs, so `"Main  St"` and
/// `"MAIN ST"` fold to the same string.
pub fn fold(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// [`similarity`] of the folded forms of `a` and `b`.
pub fn folded_similarity(a: &str, b: &str) -> f64 {
    similarity(&fold(a), &fold(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identity() {
        for s in ["", "a", "Asphalt Concrete", "Ñandú"] {
            assert_eq!(distance(s, s), 0);
        }
    }

    #[test]
    fn test_distance_against_empty() {
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abc", ""), 3);
        assert_eq!(distance("", "Ñandú"), 5);
    }

    #[test]
    fn test_distance_known_values() {
        assert_eq!(distance("abc", "abd"), 1);
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_distance_symmetric() {
        let pairs = [("MAIN ST", "MAIN STREET"), ("Collector", "Arterial"), ("", "x")];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn test_similarity_bounds() {
        assert!((similarity("abc", "abc") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("abc", "xyz").abs() < f64::EPSILON);
        assert!(similarity("", "abc").abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_decreases_with_distance() {
        let target = "Residential";
        assert!(similarity(target, "Residental") > similarity(target, "Resident"));
        assert!(similarity(target, "Resident") > similarity(target, "Arterial"));
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Main   St "), "main st");
        assert_eq!(fold("AC/AC"), "ac/ac");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn test_folded_similarity_ignores_case() {
        assert!((folded_similarity("MAIN ST", "Main  St") - 1.0).abs() < f64::EPSILON);
    }
}
