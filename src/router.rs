//! Command router
//!
//! Matches the inbound message against the registered command table and
//! dispatches to the persistence collaborators. This is the only component
//! allowed to call into persistence; collaborator failures are logged and
//! converted into a polite generic reply so the message-handling loop never
//! crashes.

use crate::models::{
    Command, CommandAction, CommandDomain, CompletedDraft, GoalFields, GoalRef, NewTransaction,
    ResponseEnvelope, ResponseKind, SummaryData, SummaryScope, TransactionRef, TransactionType,
};
use crate::normalizer::parse_amount;
use crate::Result;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

const REPLY_INVALID_ACTION: &str = "Maaf, aksi tidak valid.";

/// Persistence collaborators. All calls must resolve before the triggering
/// message is considered handled; there is no fire-and-forget path.
#[async_trait::async_trait]
pub trait FinanceBackend: Send + Sync {
    async fn create_transaction(
        &self,
        user_id: &str,
        transaction: NewTransaction,
    ) -> Result<TransactionRef>;

    async fn adjust_budget_spending(
        &self,
        user_id: &str,
        category: &str,
        delta_amount: i64,
    ) -> Result<()>;

    async fn create_or_update_goal(&self, user_id: &str, goal: GoalFields) -> Result<GoalRef>;

    async fn fetch_summary(&self, user_id: &str, scope: SummaryScope) -> Result<SummaryData>;
}

/// Command table recovered at startup; first registered trigger wins
fn default_commands() -> Vec<Command> {
    vec![
        Command {
            trigger: "catat",
            domain: CommandDomain::Transaction,
            action: CommandAction::Create,
            examples: &[
                "catat pengeluaran 50rb untuk makan",
                "catat pemasukan 5jt dari gaji",
            ],
        },
        Command {
            trigger: "hapus",
            domain: CommandDomain::Transaction,
            action: CommandAction::Delete,
            examples: &["hapus transaksi terakhir", "hapus pengeluaran makan kemarin"],
        },
        Command {
            trigger: "ubah",
            domain: CommandDomain::Transaction,
            action: CommandAction::Update,
            examples: &["ubah jumlah jadi 75rb", "ubah kategori jadi transportasi"],
        },
        Command {
            trigger: "lihat",
            domain: CommandDomain::Transaction,
            action: CommandAction::View,
            examples: &["lihat transaksi hari ini", "lihat pengeluaran bulan ini"],
        },
        Command {
            trigger: "atur",
            domain: CommandDomain::Budget,
            action: CommandAction::Set,
            examples: &["atur budget makan 2jt", "atur anggaran transportasi 500rb"],
        },
        Command {
            trigger: "cek",
            domain: CommandDomain::Budget,
            action: CommandAction::Check,
            examples: &["cek budget", "cek sisa anggaran"],
        },
        Command {
            trigger: "target",
            domain: CommandDomain::Goal,
            action: CommandAction::Create,
            examples: &[
                "target menabung 10jt untuk liburan",
                "target keuangan 50jt untuk dp rumah",
            ],
        },
        Command {
            trigger: "progress",
            domain: CommandDomain::Goal,
            action: CommandAction::Check,
            examples: &["progress tabungan", "progress target"],
        },
        Command {
            trigger: "laporan",
            domain: CommandDomain::Report,
            action: CommandAction::Generate,
            examples: &["laporan keuangan bulan ini", "laporan pengeluaran minggu ini"],
        },
        Command {
            trigger: "analisis",
            domain: CommandDomain::Report,
            action: CommandAction::Analyze,
            examples: &["analisis pengeluaran", "analisis budget"],
        },
        Command {
            trigger: "bantuan",
            domain: CommandDomain::Help,
            action: CommandAction::Show,
            examples: &["bantuan", "cara pakai bot"],
        },
    ]
}

pub struct CommandRouter {
    commands: Vec<Command>,
    backend: Arc<dyn FinanceBackend>,
}

impl CommandRouter {
    pub fn new(backend: Arc<dyn FinanceBackend>) -> Self {
        Self {
            commands: default_commands(),
            backend,
        }
    }

    /// Case-insensitive prefix match against the command table
    pub fn identify(&self, text: &str) -> Option<Command> {
        let normalized = text.trim().to_lowercase();
        self.commands
            .iter()
            .find(|command| normalized.starts_with(command.trigger))
            .copied()
    }

    /// Dispatch a recognized command; never raises out of the message loop
    pub async fn dispatch(
        &self,
        command: &Command,
        user_id: &str,
        text: &str,
    ) -> ResponseEnvelope {
        let result = match (command.domain, command.action) {
            (CommandDomain::Transaction, CommandAction::Create) => {
                self.create_transaction_inline(user_id, text).await
            }
            (CommandDomain::Transaction, CommandAction::View) => {
                self.summary_reply(user_id, SummaryScope::Transactions, "Transaksi Anda:")
                    .await
            }
            (CommandDomain::Budget, CommandAction::Set) => self.set_budget(user_id, text).await,
            (CommandDomain::Budget, CommandAction::Check) => {
                self.summary_reply(user_id, SummaryScope::Budget, "Ringkasan budget Anda:")
                    .await
            }
            (CommandDomain::Goal, CommandAction::Create) => self.create_goal(user_id, text).await,
            (CommandDomain::Goal, CommandAction::Check) => {
                self.summary_reply(user_id, SummaryScope::Goals, "Progress target Anda:")
                    .await
            }
            (CommandDomain::Report, CommandAction::Generate) => {
                self.summary_reply(user_id, SummaryScope::Report, "Laporan keuangan Anda:")
                    .await
            }
            (CommandDomain::Report, CommandAction::Analyze) => {
                self.summary_reply(user_id, SummaryScope::Report, "Analisis keuangan Anda:")
                    .await
            }
            (CommandDomain::Help, CommandAction::Show) => Ok(self.help_reply(text)),
            _ => {
                return ResponseEnvelope::new(ResponseKind::Error, REPLY_INVALID_ACTION);
            }
        };

        match result {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(
                    user_id,
                    trigger = command.trigger,
                    payload = text,
                    %err,
                    "Command dispatch failed"
                );
                ResponseEnvelope::apology()
            }
        }
    }

    /// Persist a draft completed through the multi-turn dialogue
    pub async fn record_confirmed_draft(
        &self,
        user_id: &str,
        draft: &CompletedDraft,
    ) -> ResponseEnvelope {
        let transaction = NewTransaction {
            kind: draft.kind,
            amount: draft.amount,
            category: draft.category.clone(),
            description: format!("{} {}", draft.kind.label(), draft.category),
        };

        match self.backend.create_transaction(user_id, transaction).await {
            Ok(reference) => {
                info!(
                    user_id,
                    transaction_id = %reference.transaction_id,
                    "Transaction recorded from dialogue"
                );
                ResponseEnvelope::new(
                    ResponseKind::Command,
                    format!(
                        "{} sebesar {} untuk {} telah dicatat.",
                        capitalize(draft.kind.label()),
                        format_currency(draft.amount),
                        draft.category
                    ),
                )
                .with_action(json!({
                    "kind": "transaction_created",
                    "transaction_id": reference.transaction_id,
                }))
            }
            Err(err) => {
                error!(user_id, %err, "Failed to persist confirmed transaction");
                ResponseEnvelope::apology()
            }
        }
    }

    async fn create_transaction_inline(
        &self,
        user_id: &str,
        text: &str,
    ) -> Result<ResponseEnvelope> {
        let Some(amount) = parse_amount(text) else {
            return Ok(ResponseEnvelope::new(
                ResponseKind::Command,
                "Format: catat pengeluaran [jumlah] untuk [kategori]",
            ));
        };

        let kind = if text.contains("pemasukan") {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };
        let category = text_after(text, "untuk ").unwrap_or("lainnya").to_string();

        let reference = self
            .backend
            .create_transaction(
                user_id,
                NewTransaction {
                    kind,
                    amount,
                    category: category.clone(),
                    description: text.to_string(),
                },
            )
            .await?;

        Ok(ResponseEnvelope::new(
            ResponseKind::Command,
            format!(
                "{} sebesar {} untuk {} telah dicatat.",
                capitalize(kind.label()),
                format_currency(amount),
                category
            ),
        )
        .with_action(json!({
            "kind": "transaction_created",
            "transaction_id": reference.transaction_id,
        })))
    }

    async fn set_budget(&self, user_id: &str, text: &str) -> Result<ResponseEnvelope> {
        let Some(amount) = parse_amount(text) else {
            return Ok(ResponseEnvelope::new(
                ResponseKind::Command,
                "Format: atur budget [kategori] [jumlah]",
            ));
        };

        let category = text
            .split_whitespace()
            .skip(1)
            .find(|token| {
                !matches!(*token, "budget" | "anggaran") && parse_amount(token).is_none()
            })
            .unwrap_or("umum")
            .to_string();

        self.backend
            .adjust_budget_spending(user_id, &category, amount)
            .await?;

        Ok(ResponseEnvelope::new(
            ResponseKind::Command,
            format!(
                "Budget {} diatur sebesar {}.",
                category,
                format_currency(amount)
            ),
        ))
    }

    async fn create_goal(&self, user_id: &str, text: &str) -> Result<ResponseEnvelope> {
        let Some(amount) = parse_amount(text) else {
            return Ok(ResponseEnvelope::new(
                ResponseKind::Command,
                "Format: target menabung [jumlah] untuk [tujuan]",
            ));
        };

        let name = text_after(text, "untuk ")
            .unwrap_or("target tabungan")
            .to_string();

        let reference = self
            .backend
            .create_or_update_goal(
                user_id,
                GoalFields {
                    name: name.clone(),
                    target_amount: amount,
                },
            )
            .await?;

        Ok(ResponseEnvelope::new(
            ResponseKind::Command,
            format!(
                "Target menabung {} untuk {} telah dibuat.",
                format_currency(amount),
                name
            ),
        )
        .with_action(json!({
            "kind": "goal_created",
            "goal_id": reference.goal_id,
        })))
    }

    async fn summary_reply(
        &self,
        user_id: &str,
        scope: SummaryScope,
        heading: &str,
    ) -> Result<ResponseEnvelope> {
        let summary = self.backend.fetch_summary(user_id, scope).await?;

        let text = if summary.lines.is_empty() {
            format!("{}\nBelum ada data.", heading)
        } else {
            format!("{}\n{}", heading, summary.lines.join("\n"))
        };

        Ok(ResponseEnvelope::new(ResponseKind::Info, text))
    }

    fn help_reply(&self, text: &str) -> ResponseEnvelope {
        // "bantuan catat" narrows help to one command
        let topic = self
            .commands
            .iter()
            .find(|command| {
                command.trigger != "bantuan" && text.to_lowercase().contains(command.trigger)
            })
            .copied();

        let text = match topic {
            Some(command) => format!(
                "Bantuan untuk perintah \"{}\":\n\nContoh penggunaan:\n{}",
                command.trigger,
                command.examples.join("\n")
            ),
            None => {
                let listing = self
                    .commands
                    .iter()
                    .map(|command| format!("{}: {}", command.trigger, command.examples[0]))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                format!("Perintah yang tersedia:\n\n{}", listing)
            }
        };

        ResponseEnvelope::new(ResponseKind::Help, text)
    }
}

fn text_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.split_once(marker)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Indonesian currency grouping: 1234567 → "Rp 1.234.567"
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if amount < 0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

//
// ================= In-memory backend =================
//

/// In-memory collaborator for tests and the demo binary
pub struct InMemoryFinanceBackend {
    transactions: RwLock<HashMap<String, Vec<NewTransaction>>>,
    budgets: RwLock<HashMap<String, HashMap<String, i64>>>,
    goals: RwLock<HashMap<String, Vec<GoalFields>>>,
}

impl InMemoryFinanceBackend {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(HashMap::new()),
            budgets: RwLock::new(HashMap::new()),
            goals: RwLock::new(HashMap::new()),
        }
    }

    pub async fn transaction_count(&self, user_id: &str) -> usize {
        self.transactions
            .read()
            .await
            .get(user_id)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryFinanceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FinanceBackend for InMemoryFinanceBackend {
    async fn create_transaction(
        &self,
        user_id: &str,
        transaction: NewTransaction,
    ) -> Result<TransactionRef> {
        if transaction.amount <= 0 {
            return Err(crate::error::PipelineError::ValidationError(
                "transaction amount must be positive".to_string(),
            ));
        }

        let mut transactions = self.transactions.write().await;
        transactions
            .entry(user_id.to_string())
            .or_default()
            .push(transaction);

        Ok(TransactionRef {
            transaction_id: Uuid::new_v4(),
            created_at: Utc::now(),
        })
    }

    async fn adjust_budget_spending(
        &self,
        user_id: &str,
        category: &str,
        delta_amount: i64,
    ) -> Result<()> {
        if category.is_empty() {
            return Err(crate::error::PipelineError::ValidationError(
                "budget category must not be empty".to_string(),
            ));
        }

        let mut budgets = self.budgets.write().await;
        *budgets
            .entry(user_id.to_string())
            .or_default()
            .entry(category.to_string())
            .or_insert(0) += delta_amount;
        Ok(())
    }

    async fn create_or_update_goal(&self, user_id: &str, goal: GoalFields) -> Result<GoalRef> {
        let mut goals = self.goals.write().await;
        let user_goals = goals.entry(user_id.to_string()).or_default();

        if let Some(existing) = user_goals.iter_mut().find(|g| g.name == goal.name) {
            existing.target_amount = goal.target_amount;
        } else {
            user_goals.push(goal);
        }

        Ok(GoalRef {
            goal_id: Uuid::new_v4(),
        })
    }

    async fn fetch_summary(&self, user_id: &str, scope: SummaryScope) -> Result<SummaryData> {
        let lines = match scope {
            SummaryScope::Transactions | SummaryScope::Report | SummaryScope::Balance => {
                let transactions = self.transactions.read().await;
                transactions
                    .get(user_id)
                    .map(|list| {
                        list.iter()
                            .map(|t| {
                                format!(
                                    "{} {} ({})",
                                    t.kind.label(),
                                    format_currency(t.amount),
                                    t.category
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            SummaryScope::Budget => {
                let budgets = self.budgets.read().await;
                budgets
                    .get(user_id)
                    .map(|per_category| {
                        per_category
                            .iter()
                            .map(|(category, amount)| {
                                format!("{}: {}", category, format_currency(*amount))
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            SummaryScope::Goals => {
                let goals = self.goals.read().await;
                goals
                    .get(user_id)
                    .map(|list| {
                        list.iter()
                            .map(|g| format!("{}: {}", g.name, format_currency(g.target_amount)))
                            .collect()
                    })
                    .unwrap_or_default()
            }
        };

        Ok(SummaryData { scope, lines })
    }
}
