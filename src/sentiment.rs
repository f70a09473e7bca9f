//! Sentiment / financial-stress classifier
//!
//! Scores an utterance on discrete stress and confidence scales (0–3) and
//! selects an empathetic or encouraging response template. The underlying
//! intent matcher is a pluggable external capability; only the deterministic
//! decision table that consumes its weighted labels lives here.

use crate::models::{Level, ResponseTemplate, SentimentResult};
use crate::Result;
use std::sync::Arc;
use tracing::warn;

pub const STRESS_HIGH: &str = "sentiment.stress.high";
pub const STRESS_MEDIUM: &str = "sentiment.stress.medium";
pub const STRESS_LOW: &str = "sentiment.stress.low";
pub const CONFIDENCE_HIGH: &str = "sentiment.confidence.high";
pub const CONFIDENCE_MEDIUM: &str = "sentiment.confidence.medium";
pub const CONFIDENCE_LOW: &str = "sentiment.confidence.low";

#[derive(Debug, Clone)]
pub struct WeightedIntent {
    pub label: String,
    pub weight: f64,
}

/// External text-classification capability
#[async_trait::async_trait]
pub trait IntentMatcher: Send + Sync {
    async fn classify_intents(&self, text: &str) -> Result<Vec<WeightedIntent>>;
}

/// Static phrase lists — zero allocation
const STRESS_HIGH_PHRASES: &[&str] = &[
    "khawatir", "tidak bisa bayar", "tidak cukup", "bingung", "takut",
    "bangkrut", "terlilit utang",
];

const STRESS_MEDIUM_PHRASES: &[&str] = &[
    "lebih besar dari pemasukan", "butuh tambahan", "menipis", "boros",
    "tidak sisa",
];

const STRESS_LOW_PHRASES: &[&str] = &[
    "mengatur keuangan", "mulai menabung", "mau menabung", "cara investasi",
];

const CONFIDENCE_HIGH_PHRASES: &[&str] = &[
    "berhasil menabung", "berkembang", "mencapai target", "sesuai rencana",
];

const CONFIDENCE_MEDIUM_PHRASES: &[&str] = &[
    "mulai bisa", "ada sedikit tabungan", "lumayan",
];

const CONFIDENCE_LOW_PHRASES: &[&str] = &["ragu", "tidak yakin"];

/// Deterministic phrase-list matcher used when no trained model is wired in
pub struct KeywordIntentMatcher;

impl KeywordIntentMatcher {
    fn score(text: &str, phrases: &[&str]) -> f64 {
        let hits = phrases.iter().filter(|p| text.contains(**p)).count();
        hits as f64 / phrases.len() as f64
    }
}

#[async_trait::async_trait]
impl IntentMatcher for KeywordIntentMatcher {
    async fn classify_intents(&self, text: &str) -> Result<Vec<WeightedIntent>> {
        let text = text.to_lowercase();
        let families = [
            (STRESS_HIGH, STRESS_HIGH_PHRASES),
            (STRESS_MEDIUM, STRESS_MEDIUM_PHRASES),
            (STRESS_LOW, STRESS_LOW_PHRASES),
            (CONFIDENCE_HIGH, CONFIDENCE_HIGH_PHRASES),
            (CONFIDENCE_MEDIUM, CONFIDENCE_MEDIUM_PHRASES),
            (CONFIDENCE_LOW, CONFIDENCE_LOW_PHRASES),
        ];

        Ok(families
            .iter()
            .filter_map(|(label, phrases)| {
                let weight = Self::score(&text, phrases);
                (weight > 0.0).then(|| WeightedIntent {
                    label: label.to_string(),
                    weight,
                })
            })
            .collect())
    }
}

pub struct SentimentClassifier {
    matcher: Arc<dyn IntentMatcher>,
}

impl SentimentClassifier {
    pub fn new(matcher: Arc<dyn IntentMatcher>) -> Self {
        Self { matcher }
    }

    /// Classify one utterance. A matcher failure or an empty label set is
    /// treated as neutral, never as an error.
    pub async fn classify(&self, text: &str) -> SentimentResult {
        let intents = match self.matcher.classify_intents(text).await {
            Ok(intents) => intents,
            Err(error) => {
                warn!(%error, "Intent matcher failed, treating utterance as neutral");
                Vec::new()
            }
        };

        let stress = top_level(&intents, "sentiment.stress.");
        let confidence = top_level(&intents, "sentiment.confidence.");
        let (template, message, suggestions) = select_template(stress, confidence);

        SentimentResult {
            stress,
            confidence,
            template,
            message: message.to_string(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Highest-weight label within one family; first wins on equal weight
fn top_level(intents: &[WeightedIntent], family_prefix: &str) -> Level {
    let mut best: Option<&WeightedIntent> = None;
    for intent in intents.iter().filter(|i| i.label.starts_with(family_prefix)) {
        match best {
            Some(current) if current.weight >= intent.weight => {}
            _ => best = Some(intent),
        }
    }

    match best.map(|i| i.label.rsplit('.').next().unwrap_or_default()) {
        Some("high") => Level::High,
        Some("medium") => Level::Medium,
        Some("low") => Level::Low,
        _ => Level::None,
    }
}

/// Total, deterministic mapping from (stress, confidence) to a template
fn select_template(
    stress: Level,
    confidence: Level,
) -> (ResponseTemplate, &'static str, &'static [&'static str]) {
    if stress == Level::High {
        (
            ResponseTemplate::CrisisSupport,
            "Saya mengerti Anda sedang menghadapi situasi keuangan yang sulit. \
             Mari kita cari solusi bersama.",
            &[
                "Membuat rencana pengelolaan utang",
                "Tips menghemat pengeluaran",
                "Konsultasi dengan ahli keuangan",
            ],
        )
    } else if stress == Level::Medium {
        (
            ResponseTemplate::BudgetAdjustment,
            "Terlihat ada beberapa tantangan keuangan yang Anda hadapi. \
             Saya bisa membantu Anda mengelolanya.",
            &[
                "Analisis pengeluaran bulanan",
                "Strategi penyesuaian anggaran",
                "Tips meningkatkan penghasilan",
            ],
        )
    } else if confidence >= Level::Medium {
        (
            ResponseTemplate::GrowthPlanning,
            "Bagus! Anda sudah di jalur yang tepat dalam mengelola keuangan.",
            &[
                "Tips investasi lanjutan",
                "Strategi diversifikasi",
                "Perencanaan keuangan jangka panjang",
            ],
        )
    } else {
        (
            ResponseTemplate::BeginnerHabits,
            "Mari mulai dengan langkah-langkah kecil dalam mengelola keuangan Anda.",
            &[
                "Membuat anggaran sederhana",
                "Tips menabung rutin",
                "Dasar-dasar investasi",
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    struct FailingMatcher;

    #[async_trait::async_trait]
    impl IntentMatcher for FailingMatcher {
        async fn classify_intents(&self, _text: &str) -> Result<Vec<WeightedIntent>> {
            Err(PipelineError::ClassificationError("model offline".into()))
        }
    }

    fn classifier() -> SentimentClassifier {
        SentimentClassifier::new(Arc::new(KeywordIntentMatcher))
    }

    #[tokio::test]
    async fn test_high_stress_detected() {
        let result = classifier().classify("saya takut bangkrut").await;
        assert_eq!(result.stress, Level::High);
        assert_eq!(result.template, ResponseTemplate::CrisisSupport);
        assert!(!result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_confidence_selects_growth_template() {
        let result = classifier()
            .classify("berhasil menabung bulan ini")
            .await;
        assert_eq!(result.confidence, Level::High);
        assert_eq!(result.template, ResponseTemplate::GrowthPlanning);
    }

    #[tokio::test]
    async fn test_neutral_input_gets_beginner_template() {
        let result = classifier().classify("halo apa kabar").await;
        assert_eq!(result.stress, Level::None);
        assert_eq!(result.confidence, Level::None);
        assert_eq!(result.template, ResponseTemplate::BeginnerHabits);
    }

    #[tokio::test]
    async fn test_matcher_failure_is_neutral() {
        let classifier = SentimentClassifier::new(Arc::new(FailingMatcher));
        let result = classifier.classify("takut bangkrut").await;
        assert_eq!(result.stress, Level::None);
        assert_eq!(result.template, ResponseTemplate::BeginnerHabits);
    }

    #[test]
    fn test_decision_table_is_total() {
        let levels = [Level::None, Level::Low, Level::Medium, Level::High];
        for stress in levels {
            for confidence in levels {
                let (template, message, suggestions) = select_template(stress, confidence);
                assert!(!message.is_empty());
                assert!(!suggestions.is_empty());
                // Spot-check the fixed priorities
                if stress == Level::High {
                    assert_eq!(template, ResponseTemplate::CrisisSupport);
                } else if stress == Level::Medium {
                    assert_eq!(template, ResponseTemplate::BudgetAdjustment);
                } else if confidence >= Level::Medium {
                    assert_eq!(template, ResponseTemplate::GrowthPlanning);
                } else {
                    assert_eq!(template, ResponseTemplate::BeginnerHabits);
                }
            }
        }
    }
}
