//! Core data models for the financial chat assistant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Discrete 0–3 scale shared by stress and confidence scoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    None,
    Low,
    Medium,
    High,
}

impl Level {
    pub fn score(self) -> u8 {
        match self {
            Level::None => 0,
            Level::Low => 1,
            Level::Medium => 2,
            Level::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTemplate {
    CrisisSupport,
    BudgetAdjustment,
    GrowthPlanning,
    BeginnerHabits,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Initial,
    AwaitingAmount,
    AwaitingCategory,
    AwaitingConfirmation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    /// User-facing Indonesian label
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Expense => "pengeluaran",
            TransactionType::Income => "pemasukan",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//
// ================= Utterance =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl MessageMetadata {
    pub fn new() -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for MessageMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One inbound chat message; immutable once received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub user_id: String,
    pub text: String,
    pub metadata: MessageMetadata,
}

//
// ================= Normalization =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalMatch {
    pub region: String,
    pub pattern: String,
}

/// Output of the lexical normalizer; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationResult {
    pub original: String,
    pub standardized: String,
    pub contains_dialect: bool,
    pub regional_matches: Vec<RegionalMatch>,
}

//
// ================= Sentiment =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub stress: Level,
    pub confidence: Level,
    pub template: ResponseTemplate,
    pub message: String,
    pub suggestions: Vec<String>,
}

//
// ================= Slot Bag =================
//

/// Partial transaction draft collected across dialogue turns
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: Option<TransactionType>,
    pub amount: Option<i64>,
    pub category: Option<String>,
}

impl TransactionDraft {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.amount.is_none() && self.category.is_none()
    }
}

/// Fully collected draft, emitted when a dialogue completes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedDraft {
    pub kind: TransactionType,
    pub amount: i64,
    pub category: String,
}

//
// ================= Commands =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandDomain {
    Transaction,
    Budget,
    Goal,
    Report,
    Help,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Create,
    Update,
    Delete,
    View,
    Set,
    Check,
    Generate,
    Analyze,
    Show,
}

/// A registered command trigger; examples are used only for help text
#[derive(Debug, Clone, Copy)]
pub struct Command {
    pub trigger: &'static str,
    pub domain: CommandDomain,
    pub action: CommandAction,
    pub examples: &'static [&'static str],
}

//
// ================= Response Envelope =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Support,
    Context,
    Financial,
    Command,
    Help,
    Info,
    Fallback,
    Error,
}

/// Final reply handed back to the transport collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub text: String,
    pub suggestions: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    pub fn new(kind: ResponseKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggestions: Vec::new(),
            kind,
            action: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_action(mut self, action: serde_json::Value) -> Self {
        self.action = Some(action);
        self
    }

    /// Generic apology used whenever a pipeline fault or collaborator
    /// failure must be hidden behind a polite reply
    pub fn apology() -> Self {
        Self::new(
            ResponseKind::Error,
            "Maaf, terjadi kesalahan dalam memproses pesan Anda. Silakan coba lagi.",
        )
    }
}

//
// ================= Collaborator I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount: i64,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRef {
    pub transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalFields {
    pub name: String,
    pub target_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRef {
    pub goal_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryScope {
    Balance,
    Transactions,
    Budget,
    Goals,
    Report,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryData {
    pub scope: SummaryScope,
    pub lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_and_scores() {
        assert!(Level::High > Level::Medium);
        assert!(Level::Medium > Level::Low);
        assert!(Level::Low > Level::None);
        assert_eq!(Level::None.score(), 0);
        assert_eq!(Level::High.score(), 3);
    }

    #[test]
    fn test_envelope_serializes_type_tag() {
        let envelope = ResponseEnvelope::new(ResponseKind::Support, "halo");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "support");
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_empty_draft() {
        let draft = TransactionDraft::default();
        assert!(draft.is_empty());
    }
}
