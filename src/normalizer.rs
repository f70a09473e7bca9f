//! Lexical normalizer
//!
//! Maps regional dialect and slang tokens to standard Indonesian, rewrites
//! shorthand amounts ("50rb", "2jt") into literal digits, and reports which
//! regional speech patterns fired. Unmatched input always passes through
//! unchanged; normalization never fails.

use crate::models::{NormalizationResult, RegionalMatch};
use crate::similarity::similarity;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref AMOUNT_UNIT_RE: Regex =
        Regex::new(r"(?i)(\d+)\s*(k|rb|jt|m)\b").expect("valid amount unit pattern");
    static ref AMOUNT_RE: Regex =
        Regex::new(r"(?i)(\d[\d.,]*)\s*(k|rb|jt|m)?\b").expect("valid amount pattern");
}

/// One regional speech-pattern rewrite, applied in registration order
struct RegionalRule {
    region: String,
    pattern: Regex,
    replacement: String,
}

/// Ordered token substitution table; order is kept for stable suggestion ties
struct TokenTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, String>,
}

impl TokenTable {
    fn new(pairs: &[(&str, &str)]) -> Self {
        let mut table = Self {
            entries: Vec::with_capacity(pairs.len()),
            index: HashMap::with_capacity(pairs.len()),
        };
        for (word, standard) in pairs {
            table.insert(word, standard);
        }
        table
    }

    fn insert(&mut self, word: &str, standard: &str) {
        let word = word.to_lowercase();
        if self.index.insert(word.clone(), standard.to_string()).is_none() {
            self.entries.push((word, standard.to_string()));
        }
    }

    fn get(&self, word: &str) -> Option<&str> {
        self.index.get(word).map(String::as_str)
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(word, _)| word.as_str())
    }
}

pub struct DialectNormalizer {
    dialect_map: TokenTable,
    slang_map: TokenTable,
    typo_map: TokenTable,
    regional_rules: Vec<RegionalRule>,
    suggestion_threshold: f64,
}

impl DialectNormalizer {
    pub fn new() -> Self {
        Self::with_suggestion_threshold(0.6)
    }

    pub fn with_suggestion_threshold(suggestion_threshold: f64) -> Self {
        Self {
            dialect_map: default_dialect_map(),
            slang_map: default_slang_map(),
            typo_map: default_typo_map(),
            regional_rules: default_regional_rules(),
            suggestion_threshold,
        }
    }

    /// Normalize one utterance: lowercase, regional rewrites, token
    /// substitution, amount-unit rewriting
    pub fn normalize(&self, text: &str) -> NormalizationResult {
        let lowered = text.to_lowercase();
        let regional_matches = self.detect_regional_patterns(&lowered);

        let mut processed = lowered.clone();
        for rule in &self.regional_rules {
            processed = rule
                .pattern
                .replace_all(&processed, rule.replacement.as_str())
                .into_owned();
        }

        processed = processed
            .split_whitespace()
            .map(|token| self.map_token(token))
            .collect::<Vec<_>>()
            .join(" ");

        let standardized = rewrite_amount_units(&processed);

        NormalizationResult {
            original: text.to_string(),
            contains_dialect: lowered != standardized,
            standardized,
            regional_matches,
        }
    }

    fn map_token<'a>(&'a self, token: &'a str) -> &'a str {
        self.dialect_map
            .get(token)
            .or_else(|| self.slang_map.get(token))
            .or_else(|| self.typo_map.get(token))
            .unwrap_or(token)
    }

    fn detect_regional_patterns(&self, text: &str) -> Vec<RegionalMatch> {
        self.regional_rules
            .iter()
            .filter(|rule| rule.pattern.is_match(text))
            .map(|rule| RegionalMatch {
                region: rule.region.clone(),
                pattern: rule.pattern.as_str().to_string(),
            })
            .collect()
    }

    /// Known dialect/slang keys similar to `token`, best first, stable ties
    pub fn suggest(&self, token: &str, limit: usize) -> Vec<String> {
        let token = token.to_lowercase();
        let mut scored: Vec<(String, f64)> = self
            .dialect_map
            .keys()
            .chain(self.slang_map.keys())
            .chain(self.typo_map.keys())
            .map(|known| (known.to_string(), similarity(&token, known)))
            .filter(|(_, score)| *score >= self.suggestion_threshold)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored.into_iter().map(|(word, _)| word).collect()
    }

    pub fn add_dialect_mapping(&mut self, word: &str, standard: &str) {
        self.dialect_map.insert(word, standard);
    }

    pub fn add_slang_mapping(&mut self, word: &str, standard: &str) {
        self.slang_map.insert(word, standard);
    }

    pub fn add_regional_rule(
        &mut self,
        region: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<()> {
        let pattern = Regex::new(pattern)?;
        self.regional_rules.push(RegionalRule {
            region: region.to_string(),
            pattern,
            replacement: replacement.to_string(),
        });
        Ok(())
    }
}

impl Default for DialectNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite `50rb` / `2jt` style amounts into literal digit sequences
pub fn rewrite_amount_units(text: &str) -> String {
    AMOUNT_UNIT_RE
        .replace_all(text, |caps: &regex::Captures| {
            let value: i64 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => return caps[0].to_string(),
            };
            let scaled = match caps[2].to_lowercase().as_str() {
                "k" | "rb" => value.saturating_mul(1_000),
                "jt" | "m" => value.saturating_mul(1_000_000),
                _ => value,
            };
            scaled.to_string()
        })
        .into_owned()
}

/// Parse the first amount in `text`: digits with `.`/`,` separators and an
/// optional case-insensitive `k`/`rb`/`jt`/`m` unit suffix
pub fn parse_amount(text: &str) -> Option<i64> {
    let caps = AMOUNT_RE.captures(text)?;
    let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    let value: i64 = digits.parse().ok()?;

    let multiplier = match caps.get(2).map(|unit| unit.as_str().to_lowercase()) {
        Some(unit) if unit == "k" || unit == "rb" => 1_000,
        Some(unit) if unit == "jt" || unit == "m" => 1_000_000,
        _ => 1,
    };

    Some(value.saturating_mul(multiplier))
}

fn default_dialect_map() -> TokenTable {
    TokenTable::new(&[
        // Javanese influenced
        ("piye", "bagaimana"),
        ("piro", "berapa"),
        ("duit", "uang"),
        ("duwit", "uang"),
        ("opo", "apa"),
        ("nggo", "untuk"),
        // Sundanese influenced
        ("kumaha", "bagaimana"),
        ("sabaraha", "berapa"),
        ("naon", "apa"),
        ("keur", "untuk"),
        // Betawi influenced
        ("gimana", "bagaimana"),
        ("berape", "berapa"),
        ("apaan", "apa"),
        ("buat", "untuk"),
        // Medan influenced
        ("brapa", "berapa"),
    ])
}

fn default_slang_map() -> TokenTable {
    TokenTable::new(&[
        // Money related
        ("duid", "uang"),
        ("gopek", "500"),
        ("cepe", "100"),
        ("sejuta", "1000000"),
        ("seceng", "1000"),
        ("serbu", "1000"),
        // Transaction related
        ("tf", "transfer"),
        ("trf", "transfer"),
        ("kirim", "transfer"),
        ("krim", "transfer"),
        // Category related
        ("mam", "makan"),
        ("mkn", "makan"),
        ("gojek", "transportasi"),
        ("grab", "transportasi"),
        ("belanja", "shopping"),
        ("listrik", "utilities"),
        ("pln", "utilities"),
        ("pulsa", "utilities"),
        ("inet", "internet"),
        // Action related
        ("cek", "lihat"),
        ("liat", "lihat"),
        ("tampil", "lihat"),
        ("simpen", "simpan"),
        ("masukin", "masukkan"),
    ])
}

fn default_typo_map() -> TokenTable {
    TokenTable::new(&[
        ("pngeluaran", "pengeluaran"),
        ("pengluaran", "pengeluaran"),
        ("keluar", "pengeluaran"),
        ("pmasukan", "pemasukan"),
        ("pemaskan", "pemasukan"),
        ("masuk", "pemasukan"),
        ("tabungn", "tabungan"),
        ("tabunagn", "tabungan"),
        ("nabung", "tabungan"),
        ("angaran", "anggaran"),
        ("anggran", "anggaran"),
        ("bugdet", "anggaran"),
        ("makn", "makan"),
        ("transport", "transportasi"),
        ("trans", "transportasi"),
        ("ctat", "catat"),
        ("lht", "lihat"),
    ])
}

fn default_regional_rules() -> Vec<RegionalRule> {
    let rules: &[(&str, &str, &str)] = &[
        ("jawa", r"\btak\s+(.+?)\s+sek\b", "saya $1 dulu"),
        ("jawa", r"\bmonggo\s+(.+)", "silakan $1"),
        ("sunda", r"\bmangga\s+(.+)", "silakan $1"),
        ("sunda", r"\babdi\s+(.+)", "saya $1"),
        ("betawi", r"\bgua\s+(.+)", "saya $1"),
        ("betawi", r"\bane\s+(.+)", "saya $1"),
    ];

    rules
        .iter()
        .map(|(region, pattern, replacement)| RegionalRule {
            region: region.to_string(),
            pattern: Regex::new(pattern).expect("valid regional pattern"),
            replacement: replacement.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_token_substitution() {
        let normalizer = DialectNormalizer::new();
        let result = normalizer.normalize("piro duit saya");
        assert_eq!(result.standardized, "berapa uang saya");
        assert!(result.contains_dialect);
    }

    #[test]
    fn test_regional_pattern_rewrite() {
        let normalizer = DialectNormalizer::new();
        let result = normalizer.normalize("gua mau catat pengeluaran");
        assert_eq!(result.standardized, "saya mau catat pengeluaran");
        assert_eq!(result.regional_matches.len(), 1);
        assert_eq!(result.regional_matches[0].region, "betawi");
    }

    #[test]
    fn test_amount_unit_rewrite() {
        let normalizer = DialectNormalizer::new();
        assert_eq!(normalizer.normalize("bayar 50rb").standardized, "bayar 50000");
        assert_eq!(normalizer.normalize("gajian 2jt").standardized, "gajian 2000000");
        assert_eq!(normalizer.normalize("transfer 10 k").standardized, "transfer 10000");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let normalizer = DialectNormalizer::new();
        let result = normalizer.normalize("zxqw foo bar");
        assert_eq!(result.standardized, "zxqw foo bar");
        assert!(!result.contains_dialect);
        assert!(result.regional_matches.is_empty());
    }

    #[test]
    fn test_normalization_idempotent_on_known_tokens() {
        let normalizer = DialectNormalizer::new();
        let inputs = [
            "piro duit nggo mam",
            "gua bayar 50rb",
            "gimana cek tabungn",
            "ctat pngeluaran 2jt",
        ];
        for input in inputs {
            let once = normalizer.normalize(input);
            let twice = normalizer.normalize(&once.standardized);
            assert_eq!(once.standardized, twice.standardized, "input: {}", input);
        }
    }

    #[test]
    fn test_parse_amount_unit_semantics() {
        assert_eq!(parse_amount("50rb"), Some(50_000));
        assert_eq!(parse_amount("2jt"), Some(2_000_000));
        assert_eq!(parse_amount("50000"), Some(50_000));
        assert_eq!(parse_amount("Rp 25.000"), Some(25_000));
        assert_eq!(parse_amount("100K"), Some(100_000));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_suggest_ranks_by_similarity() {
        let normalizer = DialectNormalizer::new();
        let suggestions = normalizer.suggest("duwt", 3);
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= 3);
        assert!(suggestions.contains(&"duit".to_string()) || suggestions.contains(&"duwit".to_string()));
    }

    #[test]
    fn test_suggest_respects_threshold() {
        let normalizer = DialectNormalizer::new();
        assert!(normalizer.suggest("zzzzzzzz", 3).is_empty());
    }

    #[test]
    fn test_runtime_mappings() {
        let mut normalizer = DialectNormalizer::new();
        normalizer.add_slang_mapping("cuan", "keuntungan");
        assert_eq!(normalizer.normalize("cari cuan").standardized, "cari keuntungan");

        normalizer
            .add_regional_rule("jawa", r"\bkula\s+(.+)", "saya $1")
            .unwrap();
        assert_eq!(normalizer.normalize("kula setuju").standardized, "saya setuju");
    }
}
