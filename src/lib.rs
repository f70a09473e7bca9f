//! Financial chat assistant
//!
//! Natural-language pipeline for an Indonesian-language personal-finance
//! chatbot: dialect/slang normalization, a financial-term lexicon,
//! sentiment and stress scoring, multi-turn dialogue sessions for recording
//! transactions, and a command router in front of the persistence
//! collaborators.
//!
//! `MessageProcessor` is the entry point; it wires the analysis
//! [`orchestrator`] to the [`router`] and decides which layer answers each
//! message.

pub mod config;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod processor;
pub mod router;
pub mod sentiment;
pub mod session;
pub mod similarity;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use lexicon::FinancialLexicon;
pub use models::{MessageMetadata, ResponseEnvelope, ResponseKind, Utterance};
pub use normalizer::DialectNormalizer;
pub use orchestrator::Orchestrator;
pub use processor::MessageProcessor;
pub use router::{CommandRouter, FinanceBackend, InMemoryFinanceBackend};
pub use sentiment::{IntentMatcher, KeywordIntentMatcher, SentimentClassifier};
pub use session::SessionStore;
