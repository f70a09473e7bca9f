//! Conversation session store
//!
//! One dialogue session per user id, holding the current state of a
//! multi-turn transaction draft. Sessions expire lazily after an inactivity
//! timeout; an expired session is treated as absent on next access. Same-user
//! messages are serialized through a per-user mutex; different users proceed
//! independently.

use crate::models::{CompletedDraft, DialogueState, TransactionDraft};
use crate::normalizer::parse_amount;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

const REPLY_ASK_EXPENSE_AMOUNT: &str = "Berapa jumlah pengeluarannya?";
const REPLY_ASK_INCOME_AMOUNT: &str = "Berapa jumlah pemasukannya?";
const REPLY_ASK_CATEGORY: &str = "Untuk kategori apa?";
const REPLY_BAD_AMOUNT: &str =
    "Maaf, saya tidak mengerti jumlahnya. Mohon masukkan jumlah yang valid (contoh: 50000 atau 50rb).";
const REPLY_ASK_YES_NO: &str = "Mohon jawab dengan \"ya\" atau \"tidak\".";
const REPLY_CONFIRMED: &str = "Transaksi berhasil dicatat!";
const REPLY_CANCELLED: &str = "Baik, transaksi dibatalkan. Ada yang bisa saya bantu lagi?";
const REPLY_SHOW_BALANCE: &str = "Menampilkan informasi saldo Anda...";
const REPLY_SHOW_TRANSACTIONS: &str = "Menampilkan riwayat transaksi Anda...";
const REPLY_NOT_UNDERSTOOD: &str = "Maaf, saya tidak mengerti. Silakan coba perintah lain.";

/// Completion signal for the command router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TransactionConfirmed(CompletedDraft),
    TransactionCancelled,
}

/// Result of advancing one session by one utterance
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub state_before: DialogueState,
    pub state: DialogueState,
    pub reply: String,
    pub event: Option<SessionEvent>,
}

impl SessionOutcome {
    /// A dialogue was in progress this turn (either still open, or it just
    /// finished with a confirmation/cancellation)
    pub fn dialogue_active(&self) -> bool {
        self.state_before != DialogueState::Initial || self.state != DialogueState::Initial
    }
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub user_id: String,
    pub state: DialogueState,
    pub draft: TransactionDraft,
    pub last_activity: DateTime<Utc>,
}

impl ConversationSession {
    fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            state: DialogueState::Initial,
            draft: TransactionDraft::default(),
            last_activity: now,
        }
    }

    fn expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }

    fn reset(&mut self) {
        self.state = DialogueState::Initial;
        self.draft = TransactionDraft::default();
    }
}

/// One transition of the pure state machine
struct Transition {
    state: DialogueState,
    draft: TransactionDraft,
    reply: String,
    event: Option<SessionEvent>,
}

impl Transition {
    fn stay(state: DialogueState, draft: TransactionDraft, reply: &str) -> Self {
        Self {
            state,
            draft,
            reply: reply.to_string(),
            event: None,
        }
    }
}

/// state × utterance → (new state, slot update, reply). Pure so it can be
/// tested without the store.
fn transition(state: DialogueState, draft: &TransactionDraft, text: &str) -> Transition {
    let text = text.trim();
    match state {
        DialogueState::Initial => transition_initial(text),
        DialogueState::AwaitingAmount => match parse_amount(text) {
            Some(amount) => Transition {
                state: DialogueState::AwaitingCategory,
                draft: TransactionDraft {
                    amount: Some(amount),
                    ..draft.clone()
                },
                reply: REPLY_ASK_CATEGORY.to_string(),
                event: None,
            },
            None => Transition::stay(state, draft.clone(), REPLY_BAD_AMOUNT),
        },
        DialogueState::AwaitingCategory => {
            if text.is_empty() {
                return Transition::stay(state, draft.clone(), REPLY_ASK_CATEGORY);
            }
            match (draft.kind, draft.amount) {
                (Some(kind), Some(amount)) => Transition {
                    state: DialogueState::AwaitingConfirmation,
                    draft: TransactionDraft {
                        category: Some(text.to_string()),
                        ..draft.clone()
                    },
                    reply: format!(
                        "Konfirmasi: {} sebesar {} untuk {}. Benar? (ya/tidak)",
                        kind.label(),
                        amount,
                        text
                    ),
                    event: None,
                },
                // Draft lost its earlier slots; restart rather than guess
                _ => Transition::stay(
                    DialogueState::Initial,
                    TransactionDraft::default(),
                    REPLY_NOT_UNDERSTOOD,
                ),
            }
        }
        DialogueState::AwaitingConfirmation => {
            if text.contains("tidak") {
                return Transition {
                    state: DialogueState::Initial,
                    draft: TransactionDraft::default(),
                    reply: REPLY_CANCELLED.to_string(),
                    event: Some(SessionEvent::TransactionCancelled),
                };
            }
            if text.contains("ya") {
                return match (draft.kind, draft.amount, draft.category.clone()) {
                    (Some(kind), Some(amount), Some(category)) => Transition {
                        state: DialogueState::Initial,
                        draft: TransactionDraft::default(),
                        reply: REPLY_CONFIRMED.to_string(),
                        event: Some(SessionEvent::TransactionConfirmed(CompletedDraft {
                            kind,
                            amount,
                            category,
                        })),
                    },
                    _ => Transition::stay(
                        DialogueState::Initial,
                        TransactionDraft::default(),
                        REPLY_NOT_UNDERSTOOD,
                    ),
                };
            }
            Transition::stay(state, draft.clone(), REPLY_ASK_YES_NO)
        }
    }
}

fn transition_initial(text: &str) -> Transition {
    use crate::models::TransactionType;

    if text.contains("catat") || text.contains("tambah") {
        if text.contains("pengeluaran") {
            return Transition::stay(
                DialogueState::AwaitingAmount,
                TransactionDraft {
                    kind: Some(TransactionType::Expense),
                    ..TransactionDraft::default()
                },
                REPLY_ASK_EXPENSE_AMOUNT,
            );
        }
        if text.contains("pemasukan") {
            return Transition::stay(
                DialogueState::AwaitingAmount,
                TransactionDraft {
                    kind: Some(TransactionType::Income),
                    ..TransactionDraft::default()
                },
                REPLY_ASK_INCOME_AMOUNT,
            );
        }
    }

    if text.contains("lihat") || text.contains("cek") {
        if text.contains("saldo") {
            return Transition::stay(
                DialogueState::Initial,
                TransactionDraft::default(),
                REPLY_SHOW_BALANCE,
            );
        }
        if text.contains("transaksi") {
            return Transition::stay(
                DialogueState::Initial,
                TransactionDraft::default(),
                REPLY_SHOW_TRANSACTIONS,
            );
        }
    }

    Transition::stay(
        DialogueState::Initial,
        TransactionDraft::default(),
        REPLY_NOT_UNDERSTOOD,
    )
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    async fn entry(&self, user_id: &str, now: DateTime<Utc>) -> Arc<Mutex<ConversationSession>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user_id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationSession::new(user_id, now))))
            .clone()
    }

    /// Advance the session for `user_id` by one utterance
    pub async fn advance(&self, user_id: &str, text: &str) -> SessionOutcome {
        self.advance_at(user_id, text, Utc::now()).await
    }

    /// `advance` with an explicit clock, for deterministic replay and tests.
    /// Expiry check → transition → write-back happen under the per-user lock,
    /// so concurrent same-user messages cannot lose slot updates.
    pub async fn advance_at(
        &self,
        user_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> SessionOutcome {
        let entry = self.entry(user_id, now).await;
        let mut session = entry.lock().await;

        if session.expired(now, self.timeout) {
            debug!(user_id, "Session expired, resetting to initial state");
            session.reset();
        }

        let state_before = session.state;
        let result = transition(session.state, &session.draft, text);

        session.state = result.state;
        session.draft = result.draft;
        session.last_activity = now;

        debug!(
            user_id,
            from = ?state_before,
            to = ?session.state,
            "Dialogue transition"
        );

        SessionOutcome {
            state_before,
            state: result.state,
            reply: result.reply,
            event: result.event,
        }
    }

    /// Current state; absent and expired sessions both read as `Initial`
    pub async fn state_of(&self, user_id: &str) -> DialogueState {
        self.state_at(user_id, Utc::now()).await
    }

    pub async fn state_at(&self, user_id: &str, now: DateTime<Utc>) -> DialogueState {
        let sessions = self.sessions.read().await;
        match sessions.get(user_id) {
            Some(entry) => {
                let session = entry.lock().await;
                if session.expired(now, self.timeout) {
                    DialogueState::Initial
                } else {
                    session.state
                }
            }
            None => DialogueState::Initial,
        }
    }

    /// Slot bag snapshot; absent sessions read as an empty draft
    pub async fn draft_of(&self, user_id: &str) -> TransactionDraft {
        let sessions = self.sessions.read().await;
        match sessions.get(user_id) {
            Some(entry) => entry.lock().await.draft.clone(),
            None => TransactionDraft::default(),
        }
    }

    pub async fn clear(&self, user_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id);
    }

    /// Optional memory reclamation; correctness never depends on it because
    /// expiry is re-checked on every access
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let timeout = self.timeout;

        let mut keep = HashMap::new();
        for (user_id, entry) in sessions.drain() {
            let expired = entry.lock().await.expired(now, timeout);
            if !expired {
                keep.insert(user_id, entry);
            }
        }
        *sessions = keep;

        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
