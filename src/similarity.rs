//! String similarity used for fuzzy lookups
//!
//! Normalized edit distance: 1 − levenshtein(a,b) / max(len(a), len(b)).
//! Shared by the lexical normalizer and the domain lexicon.

/// Levenshtein distance over Unicode scalar values
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row formulation
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut previous = row[0];
        row[0] = i + 1;

        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let current = row[j + 1];
            row[j + 1] = (previous + cost).min(current + 1).min(row[j] + 1);
            previous = current;
        }
    }

    row[b.len()]
}

/// Similarity in [0, 1]; 1.0 for identical strings (including both empty)
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("tabungan", "tabungn"), 1);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [
            ("pengeluaran", "pngeluaran"),
            ("anggaran", "angaran"),
            ("duit", "uang"),
        ];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_similarity_bounded() {
        let words = ["", "a", "uang", "pengeluaran", "xyz"];
        for a in words {
            for b in words {
                let s = similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "sim({:?},{:?}) = {}", a, b, s);
            }
        }
    }

    #[test]
    fn test_similarity_reflexive() {
        for word in ["", "uang", "tabungan"] {
            assert!((similarity(word, word) - 1.0).abs() < f64::EPSILON);
        }
    }
}
