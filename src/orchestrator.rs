//! Pipeline orchestrator
//!
//! Sequences normalizer → sentiment classifier → session store → lexicon
//! enrichment for one inbound utterance and merges the sub-results into a
//! single response envelope. Reply priority: stress override, then active
//! dialogue context, then lexicon-enriched explanation, then generic
//! fallback. Faults anywhere in the pipeline are caught here and converted
//! into one generic apology; the caller never sees an error.

use crate::config::PipelineConfig;
use crate::lexicon::{FinancialLexicon, Term};
use crate::models::{
    MessageMetadata, NormalizationResult, ResponseEnvelope, ResponseKind, SentimentResult,
};
use crate::normalizer::DialectNormalizer;
use crate::sentiment::SentimentClassifier;
use crate::session::{SessionOutcome, SessionStore};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

const REPLY_FALLBACK: &str = "Maaf, saya tidak mengerti. Silakan coba perintah lain.";

/// One known term found in the utterance
#[derive(Debug, Clone)]
pub struct TermHit {
    pub token: String,
    pub term: Term,
    pub synonyms: Vec<String>,
    pub category: Option<String>,
}

/// Fuzzy candidates for one unrecognized token
#[derive(Debug, Clone)]
pub struct TokenSuggestion {
    pub token: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LexiconEnrichment {
    pub hits: Vec<TermHit>,
    pub suggestions: Vec<TokenSuggestion>,
}

/// Everything the pipeline derived from one utterance
#[derive(Debug, Clone)]
pub struct PipelineAnalysis {
    pub normalization: NormalizationResult,
    pub sentiment: SentimentResult,
    pub session: SessionOutcome,
    pub enrichment: LexiconEnrichment,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub envelope: ResponseEnvelope,
    /// Absent only when a pipeline fault was converted into an apology
    pub analysis: Option<PipelineAnalysis>,
}

pub struct Orchestrator {
    normalizer: DialectNormalizer,
    classifier: SentimentClassifier,
    sessions: Arc<SessionStore>,
    lexicon: Arc<FinancialLexicon>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        normalizer: DialectNormalizer,
        classifier: SentimentClassifier,
        sessions: Arc<SessionStore>,
        lexicon: Arc<FinancialLexicon>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            sessions,
            lexicon,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn lexicon(&self) -> &Arc<FinancialLexicon> {
        &self.lexicon
    }

    /// Process one utterance; never returns an error
    pub async fn process(
        &self,
        user_id: &str,
        text: &str,
        metadata: &MessageMetadata,
    ) -> PipelineOutput {
        info!(
            user_id,
            message_id = %metadata.message_id,
            "Processing utterance"
        );

        match self.try_process(user_id, text).await {
            Ok(output) => output,
            Err(err) => {
                error!(user_id, %err, "Pipeline fault, replying with generic apology");
                PipelineOutput {
                    envelope: ResponseEnvelope::apology(),
                    analysis: None,
                }
            }
        }
    }

    async fn try_process(&self, user_id: &str, text: &str) -> Result<PipelineOutput> {
        let normalization = self.normalizer.normalize(text);
        if normalization.contains_dialect {
            debug!(
                user_id,
                standardized = %normalization.standardized,
                regions = normalization.regional_matches.len(),
                "Dialect normalized"
            );
        }

        let sentiment = self.classifier.classify(&normalization.standardized).await;
        let session = self
            .sessions
            .advance(user_id, &normalization.standardized)
            .await;
        let enrichment = self.enrich(&normalization.standardized).await;

        let envelope = self.select_reply(&sentiment, &session, &enrichment);

        Ok(PipelineOutput {
            envelope,
            analysis: Some(PipelineAnalysis {
                normalization,
                sentiment,
                session,
                enrichment,
            }),
        })
    }

    /// Look up every whitespace-delimited token; unknown tokens collect fuzzy
    /// candidates instead
    async fn enrich(&self, text: &str) -> LexiconEnrichment {
        let mut enrichment = LexiconEnrichment::default();

        for token in text.split_whitespace() {
            match self.lexicon.lookup(token).await {
                Some(term) => {
                    let synonyms = self.lexicon.synonyms_of(token).await;
                    let category = self.lexicon.category_of(token).await;
                    enrichment.hits.push(TermHit {
                        token: token.to_string(),
                        term,
                        synonyms,
                        category,
                    });
                }
                None => {
                    let candidates: Vec<String> = self
                        .lexicon
                        .suggest(token, self.config.suggestion_limit)
                        .await
                        .into_iter()
                        .map(|s| s.term)
                        .collect();
                    if !candidates.is_empty() {
                        enrichment.suggestions.push(TokenSuggestion {
                            token: token.to_string(),
                            candidates,
                        });
                    }
                }
            }
        }

        enrichment
    }

    fn select_reply(
        &self,
        sentiment: &SentimentResult,
        session: &SessionOutcome,
        enrichment: &LexiconEnrichment,
    ) -> ResponseEnvelope {
        // Stress override comes first, even mid-dialogue. The draft stays in
        // the slot bag and is reclaimed by the inactivity timeout.
        if sentiment.stress >= self.config.stress_override_threshold {
            return ResponseEnvelope::new(ResponseKind::Support, sentiment.message.clone())
                .with_suggestions(sentiment.suggestions.clone());
        }

        if session.dialogue_active() {
            return ResponseEnvelope::new(ResponseKind::Context, session.reply.clone());
        }

        if let Some(hit) = enrichment.hits.first() {
            return ResponseEnvelope::new(ResponseKind::Financial, explain_term(hit));
        }

        ResponseEnvelope::new(ResponseKind::Fallback, REPLY_FALLBACK)
            .with_suggestions(suggestion_lines(enrichment))
    }
}

/// Explanatory reply combining definition, synonyms and the first example
fn explain_term(hit: &TermHit) -> String {
    let mut reply = format!("Mengenai {}, {}. ", hit.token, hit.term.definition);

    if !hit.synonyms.is_empty() {
        reply.push_str(&format!(
            "Istilah ini juga dikenal sebagai {}. ",
            hit.synonyms.join(", ")
        ));
    }

    if let Some(example) = hit.term.examples.first() {
        reply.push_str(&format!("Contohnya: {}", example));
    }

    reply
}

fn suggestion_lines(enrichment: &LexiconEnrichment) -> Vec<String> {
    enrichment
        .suggestions
        .iter()
        .map(|s| format!("Mungkin maksud Anda: {}", s.candidates.join(", ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DialogueState, Level, ResponseTemplate};
    use crate::sentiment::KeywordIntentMatcher;
    use chrono::Duration;

    fn orchestrator() -> Orchestrator {
        let config = PipelineConfig::default();
        Orchestrator::new(
            DialectNormalizer::new(),
            SentimentClassifier::new(Arc::new(KeywordIntentMatcher)),
            Arc::new(SessionStore::new(Duration::minutes(5))),
            Arc::new(FinancialLexicon::new()),
            config,
        )
    }

    fn metadata() -> MessageMetadata {
        MessageMetadata::new()
    }

    #[tokio::test]
    async fn test_dialogue_reply_takes_priority() {
        let orchestrator = orchestrator();
        let output = orchestrator
            .process("user-a", "catat pengeluaran", &metadata())
            .await;

        assert_eq!(output.envelope.kind, ResponseKind::Context);
        assert_eq!(output.envelope.text, "Berapa jumlah pengeluarannya?");
        let analysis = output.analysis.unwrap();
        assert_eq!(analysis.session.state, DialogueState::AwaitingAmount);
    }

    #[tokio::test]
    async fn test_stress_overrides_dialogue_context() {
        let orchestrator = orchestrator();
        orchestrator
            .process("user-a", "catat pengeluaran", &metadata())
            .await;

        let output = orchestrator
            .process("user-a", "saya takut bangkrut tidak bisa bayar utang", &metadata())
            .await;

        assert_eq!(output.envelope.kind, ResponseKind::Support);
        let analysis = output.analysis.unwrap();
        assert_eq!(analysis.sentiment.stress, Level::High);
        assert_eq!(analysis.sentiment.template, ResponseTemplate::CrisisSupport);
        assert!(!output.envelope.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_lexicon_explanation_for_known_term() {
        let orchestrator = orchestrator();
        let output = orchestrator
            .process("user-a", "apa itu investasi", &metadata())
            .await;

        assert_eq!(output.envelope.kind, ResponseKind::Financial);
        assert!(output.envelope.text.contains("investasi"));
        assert!(output.envelope.text.contains("Penanaman modal"));
        assert!(output.envelope.text.contains("Contohnya"));
    }

    #[tokio::test]
    async fn test_fallback_for_unknown_input() {
        let orchestrator = orchestrator();
        let output = orchestrator
            .process("user-a", "xyzzy qwerty", &metadata())
            .await;

        assert_eq!(output.envelope.kind, ResponseKind::Fallback);
        assert!(!output.envelope.text.is_empty());
    }

    #[tokio::test]
    async fn test_dialect_is_normalized_before_enrichment() {
        let orchestrator = orchestrator();
        // "duit" is Javanese/Betawi slang; no standard term matches the raw token
        let output = orchestrator
            .process("user-a", "piro duit tabungan saya", &metadata())
            .await;

        let analysis = output.analysis.unwrap();
        assert!(analysis.normalization.contains_dialect);
        assert!(analysis
            .enrichment
            .hits
            .iter()
            .any(|hit| hit.token == "tabungan"));
    }

    #[tokio::test]
    async fn test_completed_dialogue_reply_is_visible() {
        let orchestrator = orchestrator();
        for turn in ["catat pengeluaran", "50rb", "makan"] {
            orchestrator.process("user-a", turn, &metadata()).await;
        }
        let output = orchestrator.process("user-a", "ya", &metadata()).await;

        assert_eq!(output.envelope.kind, ResponseKind::Context);
        assert_eq!(output.envelope.text, "Transaksi berhasil dicatat!");
        let analysis = output.analysis.unwrap();
        assert_eq!(analysis.session.state, DialogueState::Initial);
    }
}
