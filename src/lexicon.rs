//! Domain lexicon of financial terms
//!
//! Process-wide dictionary of Indonesian financial vocabulary: definitions,
//! example phrases, related terms, synonyms, and category groupings. Supports
//! fuzzy suggestion for unrecognized tokens. Reads are concurrent; the rare
//! runtime mutation (new terms/synonyms) takes the exclusive write lock, so a
//! reader never observes a half-constructed entry.

use crate::similarity::similarity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// One lexicon entry; `name` is the lower-cased canonical form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub definition: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSuggestion {
    pub term: String,
    pub similarity: f64,
}

struct LexiconTable {
    /// Term keys in insertion order, for stable tie-breaking
    order: Vec<String>,
    terms: HashMap<String, Term>,
    synonyms: HashMap<String, Vec<String>>,
    categories: Vec<(String, Vec<String>)>,
}

pub struct FinancialLexicon {
    table: RwLock<LexiconTable>,
    suggestion_threshold: f64,
}

impl FinancialLexicon {
    pub fn new() -> Self {
        Self::with_suggestion_threshold(0.3)
    }

    pub fn with_suggestion_threshold(suggestion_threshold: f64) -> Self {
        Self {
            table: RwLock::new(default_table()),
            suggestion_threshold,
        }
    }

    pub async fn lookup(&self, term: &str) -> Option<Term> {
        let table = self.table.read().await;
        table.terms.get(&term.to_lowercase()).cloned()
    }

    pub async fn synonyms_of(&self, term: &str) -> Vec<String> {
        let table = self.table.read().await;
        table
            .synonyms
            .get(&term.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub async fn category_of(&self, term: &str) -> Option<String> {
        let normalized = term.to_lowercase();
        let table = self.table.read().await;
        table
            .categories
            .iter()
            .find(|(_, members)| members.iter().any(|m| *m == normalized))
            .map(|(category, _)| category.clone())
    }

    pub async fn terms_in_category(&self, category: &str) -> Vec<String> {
        let table = self.table.read().await;
        table
            .categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, members)| members.clone())
            .unwrap_or_default()
    }

    /// Substring search over keys, definitions, examples and related terms
    pub async fn search(&self, query: &str) -> Vec<Term> {
        let query = query.to_lowercase();
        let table = self.table.read().await;

        table
            .order
            .iter()
            .filter_map(|key| table.terms.get(key))
            .filter(|term| {
                term.name.contains(&query)
                    || term.definition.to_lowercase().contains(&query)
                    || term.examples.iter().any(|e| e.to_lowercase().contains(&query))
                    || term.related.iter().any(|r| r.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }

    /// Fuzzy suggestions over terms and their synonyms, best first; ties keep
    /// table insertion order
    pub async fn suggest(&self, term: &str, limit: usize) -> Vec<TermSuggestion> {
        let normalized = term.to_lowercase();
        let table = self.table.read().await;
        let mut scored = Vec::new();

        for key in &table.order {
            let score = similarity(&normalized, key);
            if score > self.suggestion_threshold {
                scored.push(TermSuggestion {
                    term: key.clone(),
                    similarity: score,
                });
            }

            if let Some(synonyms) = table.synonyms.get(key) {
                for synonym in synonyms {
                    let score = similarity(&normalized, &synonym.to_lowercase());
                    if score > self.suggestion_threshold {
                        scored.push(TermSuggestion {
                            term: synonym.clone(),
                            similarity: score,
                        });
                    }
                }
            }
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }

    /// Insert or replace a term; the entry becomes visible atomically
    pub async fn add_term(
        &self,
        name: &str,
        definition: &str,
        examples: Vec<String>,
        related: Vec<String>,
    ) {
        let name = name.to_lowercase();
        let term = Term {
            name: name.clone(),
            definition: definition.to_string(),
            examples,
            related,
        };

        let mut table = self.table.write().await;
        if table.terms.insert(name.clone(), term).is_none() {
            table.order.push(name.clone());
        }
        info!(term = %name, "Added term to lexicon");
    }

    pub async fn add_synonyms(&self, term: &str, new_synonyms: Vec<String>) {
        let term = term.to_lowercase();
        let mut table = self.table.write().await;
        table
            .synonyms
            .entry(term.clone())
            .or_default()
            .extend(new_synonyms);
        info!(term = %term, "Added synonyms to lexicon");
    }
}

impl Default for FinancialLexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn default_table() -> LexiconTable {
    let seed: &[(&str, &str, &[&str], &[&str])] = &[
        // Basic financial terms
        (
            "anggaran",
            "Rencana keuangan untuk periode tertentu",
            &["anggaran bulanan", "anggaran tahunan"],
            &["budget", "perencanaan"],
        ),
        (
            "tabungan",
            "Uang yang disimpan untuk keperluan masa depan",
            &["tabungan pendidikan", "tabungan pensiun"],
            &["saving", "deposito"],
        ),
        (
            "investasi",
            "Penanaman modal untuk mendapatkan keuntungan di masa depan",
            &["investasi saham", "investasi properti"],
            &["reksadana", "obligasi"],
        ),
        (
            "utang",
            "Kewajiban finansial yang harus dibayar",
            &["utang kartu kredit", "utang KPR"],
            &["pinjaman", "cicilan"],
        ),
        // Transaction terms
        (
            "pemasukan",
            "Uang yang diterima dari berbagai sumber",
            &["gaji", "bonus", "pendapatan sampingan"],
            &["income", "pendapatan"],
        ),
        (
            "pengeluaran",
            "Uang yang digunakan untuk berbagai keperluan",
            &["biaya makan", "transportasi", "belanja"],
            &["expense", "biaya"],
        ),
        (
            "saldo",
            "Jumlah uang yang tersedia",
            &["saldo rekening", "saldo e-wallet"],
            &["balance", "dana"],
        ),
        (
            "transfer",
            "Pengiriman uang dari satu akun ke akun lain",
            &["transfer antar bank", "transfer e-wallet"],
            &["kirim uang", "TF"],
        ),
        // Investment terms
        (
            "saham",
            "Bukti kepemilikan bagian perusahaan",
            &["saham blue chip", "saham growth"],
            &["stock", "equity"],
        ),
        (
            "reksadana",
            "Wadah investasi kolektif yang dikelola manajer investasi",
            &["reksadana saham", "reksadana pasar uang"],
            &["mutual fund", "investasi"],
        ),
        (
            "obligasi",
            "Surat utang yang dapat diperdagangkan",
            &["obligasi pemerintah", "obligasi korporasi"],
            &["bond", "surat utang"],
        ),
        (
            "deposito",
            "Simpanan berjangka dengan bunga tetap",
            &["deposito 1 bulan", "deposito 1 tahun"],
            &["time deposit", "simpanan"],
        ),
        // Financial planning terms
        (
            "dana_darurat",
            "Dana yang disiapkan untuk keadaan tidak terduga",
            &["dana darurat 6 bulan", "emergency fund"],
            &["simpanan", "cadangan"],
        ),
        (
            "asuransi",
            "Perlindungan finansial terhadap risiko",
            &["asuransi jiwa", "asuransi kesehatan"],
            &["insurance", "proteksi"],
        ),
        (
            "pensiun",
            "Dana yang disiapkan untuk masa pensiun",
            &["dana pensiun", "tabungan hari tua"],
            &["retirement", "jaminan hari tua"],
        ),
        (
            "pajak",
            "Kewajiban finansial kepada negara",
            &["pajak penghasilan", "pajak properti"],
            &["tax", "PPh", "PPN"],
        ),
    ];

    let mut order = Vec::with_capacity(seed.len());
    let mut terms = HashMap::with_capacity(seed.len());
    for (name, definition, examples, related) in seed {
        order.push(name.to_string());
        terms.insert(
            name.to_string(),
            Term {
                name: name.to_string(),
                definition: definition.to_string(),
                examples: examples.iter().map(|s| s.to_string()).collect(),
                related: related.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    let synonym_seed: &[(&str, &[&str])] = &[
        ("pemasukan", &["pendapatan", "income", "gaji", "penghasilan", "masukan"]),
        ("gaji", &["salary", "upah", "bayaran", "pendapatan tetap"]),
        ("bonus", &["insentif", "tambahan", "reward", "komisi"]),
        ("pengeluaran", &["biaya", "expense", "cost", "pembayaran", "belanja"]),
        ("tagihan", &["bill", "invoice", "pembayaran", "kewajiban"]),
        ("belanja", &["shopping", "pembelian", "konsumsi"]),
        ("tabungan", &["saving", "simpanan", "deposito", "dana"]),
        ("menabung", &["menyimpan", "saving", "investasi", "mengumpulkan"]),
        ("celengan", &["tabungan", "saving box", "tempat nabung"]),
        ("investasi", &["penanaman modal", "investment", "tabungan masa depan"]),
        ("saham", &["stock", "equity", "kepemilikan perusahaan"]),
        ("reksadana", &["mutual fund", "investasi kolektif"]),
        ("utang", &["pinjaman", "kredit", "debt", "loan", "kewajiban"]),
        ("cicilan", &["angsuran", "installment", "pembayaran berkala"]),
        ("kpr", &["kredit rumah", "mortgage", "housing loan"]),
        ("anggaran", &["budget", "rencana keuangan", "alokasi dana"]),
        ("alokasi", &["pembagian", "distribusi", "penempatan dana"]),
        ("target", &["goal", "tujuan", "rencana"]),
    ];

    let synonyms = synonym_seed
        .iter()
        .map(|(term, list)| {
            (
                term.to_string(),
                list.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();

    let category_seed: &[(&str, &[&str])] = &[
        (
            "pengeluaran_rutin",
            &["makan", "transportasi", "utilities", "internet", "pulsa", "sewa", "cicilan"],
        ),
        (
            "pengeluaran_non_rutin",
            &["belanja", "hiburan", "kesehatan", "pendidikan", "liburan", "hadiah"],
        ),
        ("pemasukan_rutin", &["gaji", "pensiun", "sewa", "dividen"]),
        (
            "pemasukan_non_rutin",
            &["bonus", "komisi", "freelance", "hadiah", "warisan"],
        ),
        (
            "investasi",
            &["saham", "reksadana", "obligasi", "deposito", "properti", "emas"],
        ),
        (
            "utang",
            &["kartu_kredit", "kpr", "kta", "pinjaman_online", "cicilan"],
        ),
    ];

    let categories = category_seed
        .iter()
        .map(|(name, members)| {
            (
                name.to_string(),
                members.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();

    LexiconTable {
        order,
        terms,
        synonyms,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_known_term() {
        let lexicon = FinancialLexicon::new();
        let term = lexicon.lookup("tabungan").await.unwrap();
        assert!(term.definition.contains("disimpan"));
        assert!(!term.examples.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let lexicon = FinancialLexicon::new();
        assert!(lexicon.lookup("TABUNGAN").await.is_some());
        assert!(lexicon.lookup("tidak_ada").await.is_none());
    }

    #[tokio::test]
    async fn test_synonyms_and_category() {
        let lexicon = FinancialLexicon::new();
        let synonyms = lexicon.synonyms_of("pengeluaran").await;
        assert!(synonyms.contains(&"biaya".to_string()));

        assert_eq!(
            lexicon.category_of("makan").await.as_deref(),
            Some("pengeluaran_rutin")
        );
        assert_eq!(lexicon.category_of("zzz").await, None);
    }

    #[tokio::test]
    async fn test_terms_in_category() {
        let lexicon = FinancialLexicon::new();
        let members = lexicon.terms_in_category("investasi").await;
        assert!(members.contains(&"saham".to_string()));
        assert!(lexicon.terms_in_category("tidak_ada").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_definition_text() {
        let lexicon = FinancialLexicon::new();
        let hits = lexicon.search("modal").await;
        assert!(hits.iter().any(|t| t.name == "investasi"));
    }

    #[tokio::test]
    async fn test_suggest_ranked_descending() {
        let lexicon = FinancialLexicon::new();
        let suggestions = lexicon.suggest("tabungn", 5).await;
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].term, "tabungan");
        for pair in suggestions.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn test_add_term_visible_to_lookup() {
        let lexicon = FinancialLexicon::new();
        lexicon
            .add_term(
                "dividen",
                "Bagian laba perusahaan yang dibagikan ke pemegang saham",
                vec!["dividen tahunan".to_string()],
                vec!["saham".to_string()],
            )
            .await;

        let term = lexicon.lookup("dividen").await.unwrap();
        assert_eq!(term.name, "dividen");
        assert!(lexicon
            .suggest("dividen", 1)
            .await
            .iter()
            .any(|s| s.term == "dividen"));
    }

    #[tokio::test]
    async fn test_add_synonyms_appends() {
        let lexicon = FinancialLexicon::new();
        lexicon
            .add_synonyms("anggaran", vec!["planning".to_string()])
            .await;
        let synonyms = lexicon.synonyms_of("anggaran").await;
        assert!(synonyms.contains(&"budget".to_string()));
        assert!(synonyms.contains(&"planning".to_string()));
    }
}
