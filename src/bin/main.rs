//! Interactive demo for the financial chat assistant pipeline.
//!
//! Feeds a scripted conversation through the full message processor with the
//! in-memory persistence backend and prints each reply.

use financial_chat_assistant::config::PipelineConfig;
use financial_chat_assistant::lexicon::FinancialLexicon;
use financial_chat_assistant::models::MessageMetadata;
use financial_chat_assistant::normalizer::DialectNormalizer;
use financial_chat_assistant::orchestrator::Orchestrator;
use financial_chat_assistant::processor::MessageProcessor;
use financial_chat_assistant::router::{CommandRouter, InMemoryFinanceBackend};
use financial_chat_assistant::sentiment::{KeywordIntentMatcher, SentimentClassifier};
use financial_chat_assistant::session::SessionStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "financial_chat_assistant=info".into()),
        )
        .init();

    info!("Starting financial chat assistant demo");

    let config = PipelineConfig::default();
    let orchestrator = Orchestrator::new(
        DialectNormalizer::with_suggestion_threshold(config.dialect_suggestion_threshold),
        SentimentClassifier::new(Arc::new(KeywordIntentMatcher)),
        Arc::new(SessionStore::new(config.session_timeout)),
        Arc::new(FinancialLexicon::with_suggestion_threshold(
            config.term_suggestion_threshold,
        )),
        config,
    );
    let router = CommandRouter::new(Arc::new(InMemoryFinanceBackend::new()));
    let processor = MessageProcessor::new(orchestrator, router);

    let conversation = [
        "piro duit tabungan saya",
        "apa itu reksadana",
        "catat pengeluaran",
        "50rb",
        "makan siang",
        "ya",
        "lihat transaksi hari ini",
        "saya takut bangkrut, pengeluaran lebih besar dari pemasukan",
        "bantuan",
    ];

    for text in conversation {
        let metadata = MessageMetadata::new();
        println!("> {}", text);
        let reply = processor
            .handle_utterance("demo-user", text, &metadata)
            .await;
        println!("{}", reply.text);
        for suggestion in &reply.suggestions {
            println!("  - {}", suggestion);
        }
        println!();
    }
}
