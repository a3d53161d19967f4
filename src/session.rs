// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::window_start;
use crate::models::{Kind, KindTotals, Transaction, TransactionUpdate};
use crate::parser;
use crate::store::TransactionStore;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

/// An in-progress flow is dropped after this long without interaction.
pub const DEFAULT_TTL_MINUTES: i64 = 10;

const HISTORY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Category,
    Amount,
    Kind,
}

/// Everything a menu button can trigger. The transport maps its own
/// callback payloads onto these and gets exhaustive dispatch in return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddTransaction,
    ChooseKind(Kind),
    ConfirmDraft,
    DiscardDraft,
    ShowBalance,
    ShowTransactions,
    BackToMenu,
    EditField { id: i64, field: EditField },
    DeleteTransaction { id: i64 },
}

/// A parsed entry waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub kind: Kind,
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
enum Flow {
    Idle,
    EnteringDraft { kind: Kind },
    ConfirmingDraft { draft: Draft },
    EditingField { id: i64, field: EditField },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Unrecognized,
    /// Guided entry needs at least a category and an amount.
    IncompleteEntry,
    InvalidAmount,
    NonPositiveAmount,
    InvalidKind,
    EmptyCategory,
    /// Confirm pressed with no draft staged.
    NothingStaged,
}

/// What the presentation layer should show next. Rendering stays with the
/// transport.
#[derive(Debug)]
pub enum Outcome {
    MainMenu,
    KindPrompt,
    EntryPrompt(Kind),
    NeedsConfirmation(Draft),
    Recorded(Transaction),
    Balance(KindTotals),
    Transactions(Vec<Transaction>),
    FieldPrompt { id: i64, field: EditField },
    Updated(i64),
    Deleted(i64),
    NotFound(i64),
    Rejected(RejectReason),
}

/// Conversation state for one user. The transport owns one per active
/// conversation and feeds it menu actions and text messages; there is no
/// process-wide registry.
pub struct Session {
    user_id: i64,
    flow: Flow,
    touched_at: DateTime<Utc>,
    ttl: Duration,
}

impl Session {
    pub fn new(user_id: i64) -> Self {
        Self::with_ttl(user_id, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(user_id: i64, ttl: Duration) -> Self {
        Self {
            user_id,
            flow: Flow::Idle,
            touched_at: Utc::now(),
            ttl,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Drops an in-progress flow once the session has sat idle past its
    /// TTL. Returns true when something was dropped.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.touched_at > self.ttl && !matches!(self.flow, Flow::Idle) {
            debug!(user_id = self.user_id, "session flow expired");
            self.flow = Flow::Idle;
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, store: &impl TransactionStore, action: MenuAction) -> Result<Outcome> {
        self.touched_at = Utc::now();
        debug!(user_id = self.user_id, ?action, "menu action");
        match action {
            MenuAction::AddTransaction => {
                self.flow = Flow::Idle;
                Ok(Outcome::KindPrompt)
            }
            MenuAction::ChooseKind(kind) => {
                self.flow = Flow::EnteringDraft { kind };
                Ok(Outcome::EntryPrompt(kind))
            }
            MenuAction::ConfirmDraft => match self.flow.clone() {
                Flow::ConfirmingDraft { draft } => {
                    let tx = store.create(
                        self.user_id,
                        draft.kind,
                        &draft.category,
                        draft.amount,
                        None,
                    )?;
                    self.flow = Flow::Idle;
                    Ok(Outcome::Recorded(tx))
                }
                _ => Ok(Outcome::Rejected(RejectReason::NothingStaged)),
            },
            MenuAction::DiscardDraft | MenuAction::BackToMenu => {
                self.flow = Flow::Idle;
                Ok(Outcome::MainMenu)
            }
            MenuAction::ShowBalance => Ok(Outcome::Balance(store.sum_by_kind(self.user_id)?)),
            MenuAction::ShowTransactions => Ok(Outcome::Transactions(
                store.query(self.user_id, window_start(HISTORY_DAYS))?,
            )),
            MenuAction::EditField { id, field } => {
                self.flow = Flow::EditingField { id, field };
                Ok(Outcome::FieldPrompt { id, field })
            }
            MenuAction::DeleteTransaction { id } => {
                if store.delete(id, self.user_id)? {
                    Ok(Outcome::Deleted(id))
                } else {
                    Ok(Outcome::NotFound(id))
                }
            }
        }
    }

    /// Routes a plain text message through the current flow. Free text on
    /// an idle session goes through the full entry grammar; mid-flow text
    /// is interpreted by the stage that asked for it.
    pub fn handle_text(&mut self, store: &impl TransactionStore, text: &str) -> Result<Outcome> {
        self.touched_at = Utc::now();
        match self.flow.clone() {
            Flow::Idle => self.free_form(store, text),
            Flow::EnteringDraft { kind } => Ok(self.guided_entry(kind, text)),
            // Typing over the confirmation screen restarts the entry with
            // the kind already chosen.
            Flow::ConfirmingDraft { draft } => Ok(self.guided_entry(draft.kind, text)),
            Flow::EditingField { id, field } => self.edit_field(store, id, field, text),
        }
    }

    fn free_form(&mut self, store: &impl TransactionStore, text: &str) -> Result<Outcome> {
        match parser::parse(text) {
            Some((kind, category, amount)) => {
                let tx = store.create(self.user_id, kind, &category, amount, None)?;
                Ok(Outcome::Recorded(tx))
            }
            None => Ok(Outcome::Rejected(RejectReason::Unrecognized)),
        }
    }

    /// Guided entry: everything up to the last whitespace-separated token
    /// is the category, the last token is the amount. Case is kept as
    /// typed. Invalid input leaves the flow in place for another try.
    fn guided_entry(&mut self, kind: Kind, text: &str) -> Outcome {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some((amount_tok, category_toks)) = tokens.split_last() else {
            return Outcome::Rejected(RejectReason::IncompleteEntry);
        };
        if category_toks.is_empty() {
            return Outcome::Rejected(RejectReason::IncompleteEntry);
        }
        let Some(amount) = parser::parse_amount(amount_tok) else {
            return Outcome::Rejected(RejectReason::InvalidAmount);
        };
        if amount <= Decimal::ZERO {
            return Outcome::Rejected(RejectReason::NonPositiveAmount);
        }
        let draft = Draft {
            kind,
            category: category_toks.join(" "),
            amount,
        };
        self.flow = Flow::ConfirmingDraft {
            draft: draft.clone(),
        };
        Outcome::NeedsConfirmation(draft)
    }

    fn edit_field(
        &mut self,
        store: &impl TransactionStore,
        id: i64,
        field: EditField,
        text: &str,
    ) -> Result<Outcome> {
        let patch = match field {
            EditField::Category => match parser::normalize_category(text) {
                Some(category) => TransactionUpdate {
                    category: Some(category),
                    ..Default::default()
                },
                None => return Ok(Outcome::Rejected(RejectReason::EmptyCategory)),
            },
            EditField::Amount => {
                let Some(amount) = parser::parse_amount(text) else {
                    return Ok(Outcome::Rejected(RejectReason::InvalidAmount));
                };
                if amount <= Decimal::ZERO {
                    return Ok(Outcome::Rejected(RejectReason::NonPositiveAmount));
                }
                TransactionUpdate {
                    amount: Some(amount),
                    ..Default::default()
                }
            }
            EditField::Kind => match parser::kind_keyword(text) {
                Some(kind) => TransactionUpdate {
                    kind: Some(kind),
                    ..Default::default()
                },
                None => return Ok(Outcome::Rejected(RejectReason::InvalidKind)),
            },
        };
        // A miss means the row is gone or never ours, so the staged edit
        // has nothing left to wait for.
        self.flow = Flow::Idle;
        if store.update(id, self.user_id, &patch)? {
            Ok(Outcome::Updated(id))
        } else {
            Ok(Outcome::NotFound(id))
        }
    }
}
