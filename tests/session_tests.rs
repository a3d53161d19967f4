// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use kopilka::models::Kind;
use kopilka::session::{EditField, MenuAction, Outcome, RejectReason, Session};
use kopilka::store::{SqliteStore, TransactionStore};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (SqliteStore, Session) {
    (SqliteStore::open_in_memory().unwrap(), Session::new(77))
}

#[test]
fn guided_add_happy_path() {
    let (store, mut session) = setup();

    let out = session.apply(&store, MenuAction::AddTransaction).unwrap();
    assert!(matches!(out, Outcome::KindPrompt));

    let out = session
        .apply(&store, MenuAction::ChooseKind(Kind::Expense))
        .unwrap();
    assert!(matches!(out, Outcome::EntryPrompt(Kind::Expense)));

    let out = session.handle_text(&store, "Кофе с собой 250").unwrap();
    let Outcome::NeedsConfirmation(draft) = out else {
        panic!("expected confirmation, got {:?}", out);
    };
    // Guided entry keeps the case as typed.
    assert_eq!(draft.category, "Кофе с собой");
    assert_eq!(draft.amount, dec("250"));

    let out = session.apply(&store, MenuAction::ConfirmDraft).unwrap();
    let Outcome::Recorded(tx) = out else {
        panic!("expected recorded, got {:?}", out);
    };
    assert_eq!(tx.user_id, 77);
    assert_eq!(tx.kind, Kind::Expense);
    assert_eq!(tx.category, "Кофе с собой");
    assert_eq!(tx.amount, dec("250"));

    let rows = store.query(77, Utc::now() - Duration::days(1)).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn free_text_is_parsed_when_idle() {
    let (store, mut session) = setup();
    let out = session.handle_text(&store, "Доход Зарплата 50000").unwrap();
    let Outcome::Recorded(tx) = out else {
        panic!("expected recorded, got {:?}", out);
    };
    // The free-form grammar lowercases the whole line.
    assert_eq!(tx.kind, Kind::Income);
    assert_eq!(tx.category, "зарплата");
    assert_eq!(tx.amount, dec("50000"));
}

#[test]
fn unrecognized_idle_text_is_rejected() {
    let (store, mut session) = setup();
    let out = session.handle_text(&store, "привет").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::Unrecognized)));
    assert!(store.query(77, Utc::now() - Duration::days(1)).unwrap().is_empty());
}

#[test]
fn guided_entry_rejections_allow_retry() {
    let (store, mut session) = setup();
    session
        .apply(&store, MenuAction::ChooseKind(Kind::Expense))
        .unwrap();

    let out = session.handle_text(&store, "250").unwrap();
    assert!(matches!(
        out,
        Outcome::Rejected(RejectReason::IncompleteEntry)
    ));

    let out = session.handle_text(&store, "кофе abc").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::InvalidAmount)));

    let out = session.handle_text(&store, "кофе -5").unwrap();
    assert!(matches!(
        out,
        Outcome::Rejected(RejectReason::NonPositiveAmount)
    ));

    // The flow survived all three rejections.
    let out = session.handle_text(&store, "кофе 250").unwrap();
    assert!(matches!(out, Outcome::NeedsConfirmation(_)));
}

#[test]
fn typing_over_the_confirmation_restarts_entry() {
    let (store, mut session) = setup();
    session
        .apply(&store, MenuAction::ChooseKind(Kind::Expense))
        .unwrap();
    session.handle_text(&store, "кофе 250").unwrap();

    let out = session.handle_text(&store, "такси 400").unwrap();
    let Outcome::NeedsConfirmation(draft) = out else {
        panic!("expected confirmation, got {:?}", out);
    };
    assert_eq!(draft.category, "такси");
    assert_eq!(draft.amount, dec("400"));

    let out = session.apply(&store, MenuAction::ConfirmDraft).unwrap();
    let Outcome::Recorded(tx) = out else {
        panic!("expected recorded, got {:?}", out);
    };
    assert_eq!(tx.category, "такси");
}

#[test]
fn confirm_without_draft_is_rejected() {
    let (store, mut session) = setup();
    let out = session.apply(&store, MenuAction::ConfirmDraft).unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::NothingStaged)));
}

#[test]
fn discard_clears_the_draft() {
    let (store, mut session) = setup();
    session
        .apply(&store, MenuAction::ChooseKind(Kind::Expense))
        .unwrap();
    session.handle_text(&store, "кофе 250").unwrap();

    let out = session.apply(&store, MenuAction::DiscardDraft).unwrap();
    assert!(matches!(out, Outcome::MainMenu));

    let out = session.apply(&store, MenuAction::ConfirmDraft).unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::NothingStaged)));
    assert!(store.query(77, Utc::now() - Duration::days(1)).unwrap().is_empty());
}

#[test]
fn edit_amount_accepts_comma_decimals() {
    let (store, mut session) = setup();
    let tx = store
        .create(77, Kind::Expense, "еда", dec("1500"), None)
        .unwrap();

    let out = session
        .apply(
            &store,
            MenuAction::EditField {
                id: tx.id,
                field: EditField::Amount,
            },
        )
        .unwrap();
    assert!(matches!(out, Outcome::FieldPrompt { .. }));

    let out = session.handle_text(&store, "199,99").unwrap();
    assert!(matches!(out, Outcome::Updated(id) if id == tx.id));

    let rows = store.query(77, Utc::now() - Duration::days(1)).unwrap();
    assert_eq!(rows[0].amount, dec("199.99"));
    assert_eq!(rows[0].category, "еда");
}

#[test]
fn edit_kind_accepts_keyword_synonyms() {
    let (store, mut session) = setup();
    let tx = store
        .create(77, Kind::Expense, "возврат", dec("300"), None)
        .unwrap();

    session
        .apply(
            &store,
            MenuAction::EditField {
                id: tx.id,
                field: EditField::Kind,
            },
        )
        .unwrap();

    let out = session.handle_text(&store, "зачисление").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::InvalidKind)));

    let out = session.handle_text(&store, "Доход").unwrap();
    assert!(matches!(out, Outcome::Updated(_)));

    let rows = store.query(77, Utc::now() - Duration::days(1)).unwrap();
    assert_eq!(rows[0].kind, Kind::Income);
}

#[test]
fn edit_category_rejects_blank_then_succeeds() {
    let (store, mut session) = setup();
    let tx = store
        .create(77, Kind::Expense, "еда", dec("1500"), None)
        .unwrap();

    session
        .apply(
            &store,
            MenuAction::EditField {
                id: tx.id,
                field: EditField::Category,
            },
        )
        .unwrap();

    let out = session.handle_text(&store, "   ").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::EmptyCategory)));

    let out = session.handle_text(&store, "такси  и  метро").unwrap();
    assert!(matches!(out, Outcome::Updated(_)));

    let rows = store.query(77, Utc::now() - Duration::days(1)).unwrap();
    assert_eq!(rows[0].category, "такси и метро");
}

#[test]
fn edit_of_missing_row_reports_not_found_and_resets() {
    let (store, mut session) = setup();
    session
        .apply(
            &store,
            MenuAction::EditField {
                id: 999,
                field: EditField::Amount,
            },
        )
        .unwrap();

    let out = session.handle_text(&store, "50").unwrap();
    assert!(matches!(out, Outcome::NotFound(999)));

    // Back to idle: the next text goes through the entry grammar.
    let out = session.handle_text(&store, "расход еда 100").unwrap();
    assert!(matches!(out, Outcome::Recorded(_)));
}

#[test]
fn delete_action_reports_misses() {
    let (store, mut session) = setup();
    let tx = store
        .create(77, Kind::Expense, "еда", dec("1500"), None)
        .unwrap();

    let out = session
        .apply(&store, MenuAction::DeleteTransaction { id: tx.id })
        .unwrap();
    assert!(matches!(out, Outcome::Deleted(id) if id == tx.id));

    let out = session
        .apply(&store, MenuAction::DeleteTransaction { id: tx.id })
        .unwrap();
    assert!(matches!(out, Outcome::NotFound(_)));
}

#[test]
fn balance_and_history_read_through_the_store() {
    let (store, mut session) = setup();
    store
        .create(77, Kind::Income, "зарплата", dec("1000"), None)
        .unwrap();
    store
        .create(77, Kind::Expense, "еда", dec("300"), None)
        .unwrap();

    let out = session.apply(&store, MenuAction::ShowBalance).unwrap();
    let Outcome::Balance(totals) = out else {
        panic!("expected balance, got {:?}", out);
    };
    assert_eq!(totals.income_total, dec("1000"));
    assert_eq!(totals.expense_total, dec("300"));
    assert_eq!(totals.balance(), dec("700"));

    let out = session.apply(&store, MenuAction::ShowTransactions).unwrap();
    let Outcome::Transactions(rows) = out else {
        panic!("expected transactions, got {:?}", out);
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "еда");
}

#[test]
fn stale_flow_expires_after_ttl() {
    let (store, mut session) = setup();
    session
        .apply(&store, MenuAction::ChooseKind(Kind::Expense))
        .unwrap();

    // Fresh sessions never expire.
    assert!(!session.expire_if_stale(Utc::now()));

    assert!(session.expire_if_stale(Utc::now() + Duration::minutes(11)));
    // Nothing left to expire afterwards.
    assert!(!session.expire_if_stale(Utc::now() + Duration::minutes(12)));

    // The guided flow is gone, so this line no longer looks like an entry.
    let out = session.handle_text(&store, "кофе 250").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::Unrecognized)));
}

#[test]
fn back_to_menu_clears_any_flow() {
    let (store, mut session) = setup();
    let tx = store
        .create(77, Kind::Expense, "еда", dec("1500"), None)
        .unwrap();
    session
        .apply(
            &store,
            MenuAction::EditField {
                id: tx.id,
                field: EditField::Amount,
            },
        )
        .unwrap();

    let out = session.apply(&store, MenuAction::BackToMenu).unwrap();
    assert!(matches!(out, Outcome::MainMenu));

    // Text is no longer treated as the new amount.
    let out = session.handle_text(&store, "200").unwrap();
    assert!(matches!(out, Outcome::Rejected(RejectReason::Unrecognized)));
    let rows = store.query(77, Utc::now() - Duration::days(1)).unwrap();
    assert_eq!(rows[0].amount, dec("1500"));
}
