//! Message processor
//!
//! Top-level entry point for one inbound chat message. Runs the analysis
//! pipeline first, then decides whether the turn is answered by the stress
//! override, the active dialogue, a registered command, or the pipeline's
//! own enriched reply. Transactions confirmed through the dialogue are
//! persisted here before the success reply goes out.

use crate::models::{MessageMetadata, ResponseEnvelope, ResponseKind};
use crate::orchestrator::Orchestrator;
use crate::router::CommandRouter;
use crate::session::SessionEvent;
use tracing::info;

pub struct MessageProcessor {
    orchestrator: Orchestrator,
    router: CommandRouter,
}

impl MessageProcessor {
    pub fn new(orchestrator: Orchestrator, router: CommandRouter) -> Self {
        Self {
            orchestrator,
            router,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Handle one message end to end; always produces a reply
    pub async fn handle_utterance(
        &self,
        user_id: &str,
        text: &str,
        metadata: &MessageMetadata,
    ) -> ResponseEnvelope {
        let output = self.orchestrator.process(user_id, text, metadata).await;

        let Some(analysis) = output.analysis else {
            return output.envelope;
        };

        // Stress override already won reply selection; nothing else runs
        if output.envelope.kind == ResponseKind::Support {
            return output.envelope;
        }

        // A dialogue that just confirmed a draft persists it before replying
        if let Some(SessionEvent::TransactionConfirmed(draft)) = &analysis.session.event {
            info!(user_id, category = %draft.category, "Dialogue confirmed a transaction");
            return self.router.record_confirmed_draft(user_id, draft).await;
        }

        if analysis.session.dialogue_active() {
            return output.envelope;
        }

        // Commands match on the raw message; normalization may rewrite
        // trigger words ("cek" becomes "lihat")
        if let Some(command) = self.router.identify(text) {
            return self.router.dispatch(&command, user_id, text).await;
        }

        output.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::lexicon::FinancialLexicon;
    use crate::normalizer::DialectNormalizer;
    use crate::router::InMemoryFinanceBackend;
    use crate::sentiment::{KeywordIntentMatcher, SentimentClassifier};
    use crate::session::SessionStore;
    use std::sync::Arc;

    fn processor_with_backend() -> (MessageProcessor, Arc<InMemoryFinanceBackend>) {
        let config = PipelineConfig::default();
        let backend = Arc::new(InMemoryFinanceBackend::new());
        let orchestrator = Orchestrator::new(
            DialectNormalizer::new(),
            SentimentClassifier::new(Arc::new(KeywordIntentMatcher)),
            Arc::new(SessionStore::new(config.session_timeout)),
            Arc::new(FinancialLexicon::new()),
            config,
        );
        let router = CommandRouter::new(backend.clone());
        (MessageProcessor::new(orchestrator, router), backend)
    }

    fn metadata() -> MessageMetadata {
        MessageMetadata::new()
    }

    #[tokio::test]
    async fn test_full_dialogue_persists_transaction() {
        let (processor, backend) = processor_with_backend();

        let reply = processor
            .handle_utterance("user-a", "catat pengeluaran", &metadata())
            .await;
        assert_eq!(reply.text, "Berapa jumlah pengeluarannya?");

        let reply = processor.handle_utterance("user-a", "50rb", &metadata()).await;
        assert_eq!(reply.text, "Untuk kategori apa?");

        let reply = processor.handle_utterance("user-a", "makan", &metadata()).await;
        assert!(reply.text.contains("Konfirmasi"));
        assert!(reply.text.contains("makan"));

        let reply = processor.handle_utterance("user-a", "ya", &metadata()).await;
        assert_eq!(reply.kind, ResponseKind::Command);
        assert!(reply.text.contains("Pengeluaran sebesar Rp 50.000 untuk makan"));
        assert_eq!(backend.transaction_count("user-a").await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_dialogue_persists_nothing() {
        let (processor, backend) = processor_with_backend();

        for turn in ["catat pengeluaran", "50rb", "makan"] {
            processor.handle_utterance("user-a", turn, &metadata()).await;
        }
        let reply = processor
            .handle_utterance("user-a", "tidak", &metadata())
            .await;

        assert!(reply.text.contains("transaksi dibatalkan"));
        assert_eq!(backend.transaction_count("user-a").await, 0);
    }

    #[tokio::test]
    async fn test_command_outside_dialogue() {
        let (processor, _) = processor_with_backend();
        let reply = processor
            .handle_utterance("user-a", "bantuan", &metadata())
            .await;

        assert_eq!(reply.kind, ResponseKind::Help);
        assert!(reply.text.contains("catat"));
    }

    #[tokio::test]
    async fn test_command_wins_over_lexicon_explanation() {
        let (processor, _) = processor_with_backend();
        // "cek budget" mentions a known synonym but is a registered command
        let reply = processor
            .handle_utterance("user-a", "cek budget", &metadata())
            .await;

        assert_eq!(reply.kind, ResponseKind::Info);
        assert!(reply.text.contains("budget"));
    }

    #[tokio::test]
    async fn test_stress_override_beats_commands() {
        let (processor, backend) = processor_with_backend();
        let reply = processor
            .handle_utterance(
                "user-a",
                "catat semua, saya takut bangkrut dan bingung",
                &metadata(),
            )
            .await;

        assert_eq!(reply.kind, ResponseKind::Support);
        assert_eq!(backend.transaction_count("user-a").await, 0);
    }

    #[tokio::test]
    async fn test_non_command_falls_through_to_pipeline_reply() {
        let (processor, _) = processor_with_backend();
        let reply = processor
            .handle_utterance("user-a", "apa itu reksadana", &metadata())
            .await;

        assert_eq!(reply.kind, ResponseKind::Financial);
        assert!(reply.text.contains("reksadana"));
    }
}
