// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Utc};
use kopilka::models::Kind;
use kopilka::store::{SqliteStore, timestamp_text};
use kopilka::{aggregate, cli, commands::reports};
use rusqlite::params;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    // All rows share one stamp, so the fixture sits in a single day, week
    // and month bucket no matter when the test runs.
    let at = timestamp_text(Utc::now());
    for (kind, category, amount) in [
        ("income", "зарплата", "100000"),
        ("expense", "еда", "1500"),
        ("expense", "еда", "2000"),
    ] {
        store
            .connection()
            .execute(
                "INSERT INTO transactions(user_id, kind, category, amount, description, created_at)
                 VALUES (1, ?1, ?2, ?3, NULL, ?4)",
                params![kind, category, amount, at],
            )
            .unwrap();
    }
    store
}

fn run(store: &SqliteStore, args: &[&str]) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(args);
    if let Some(("report", report_m)) = matches.subcommand() {
        reports::handle(store, report_m)
    } else {
        panic!("no report subcommand");
    }
}

#[test]
fn summary_stats_cover_the_window() {
    let store = setup();
    let s = aggregate::summary_stats(&store, 1, 7).unwrap();
    assert_eq!(s.total_income, dec("100000"));
    assert_eq!(s.total_expense, dec("3500"));
    assert_eq!(s.balance, dec("96500"));
    assert_eq!(s.transaction_count, 3);
    assert_eq!(s.avg_expense, dec("1750"));
}

#[test]
fn category_stats_group_by_kind() {
    let store = setup();
    let b = aggregate::category_stats(&store, 1, 7).unwrap();
    assert_eq!(b.income["зарплата"].total, dec("100000"));
    assert_eq!(b.expense["еда"].total, dec("3500"));
    assert_eq!(b.expense["еда"].count, 2);
    assert_eq!(b.expense["еда"].avg, dec("1750"));
}

#[test]
fn trend_series_bucket_fresh_rows_into_one_slot() {
    let store = setup();
    let days = aggregate::daily_totals(&store, 1, 7).unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].balance, dec("96500"));

    let weeks = aggregate::weekly_trends(&store, 1, 7).unwrap();
    assert_eq!(weeks.len(), 1);
    assert_eq!(weeks[0].income, dec("100000"));

    let months = aggregate::monthly_trends(&store, 1, 90).unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].month.day0(), 0);
    assert_eq!(months[0].expense, dec("3500"));
}

#[test]
fn top_categories_rank_expenses() {
    let store = setup();
    let top = aggregate::top_categories(&store, 1, Kind::Expense, 7, 10).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].category, "еда");
    assert_eq!(top[0].amount, dec("3500"));
    assert_eq!(top[0].count, 2);
}

#[test]
fn empty_window_yields_zeroes_not_errors() {
    let store = SqliteStore::open_in_memory().unwrap();
    let s = aggregate::summary_stats(&store, 1, 30).unwrap();
    assert_eq!(s.transaction_count, 0);
    assert_eq!(s.balance, Decimal::ZERO);
    assert!(aggregate::daily_totals(&store, 1, 30).unwrap().is_empty());
    assert!(aggregate::top_categories(&store, 1, Kind::Expense, 30, 5)
        .unwrap()
        .is_empty());
}

#[test]
fn report_commands_render_without_errors() {
    let store = setup();
    for sub in ["summary", "categories", "daily", "weekly", "monthly", "top", "balance"] {
        run(&store, &["kopilka", "report", sub]).unwrap();
    }
    run(&store, &["kopilka", "report", "summary", "--json"]).unwrap();
    run(&store, &["kopilka", "report", "daily", "--jsonl"]).unwrap();
}

#[test]
fn oversized_window_covers_the_full_log() {
    let store = setup();
    // Clamped to the earliest instant, the window takes in everything.
    let s = aggregate::summary_stats(&store, 1, 100_000_000).unwrap();
    assert_eq!(s.transaction_count, 3);
    run(&store, &["kopilka", "report", "summary", "--days", "100000000"]).unwrap();
}

#[test]
fn top_rejects_unknown_kind() {
    let store = setup();
    let err = run(&store, &["kopilka", "report", "top", "--kind", "savings"]).unwrap_err();
    assert!(err.to_string().contains("Unknown kind"));
}

#[test]
fn monthly_defaults_to_a_ninety_day_window() {
    let matches = cli::build_cli().get_matches_from(["kopilka", "report", "monthly"]);
    if let Some(("report", report_m)) = matches.subcommand() {
        if let Some(("monthly", monthly_m)) = report_m.subcommand() {
            assert_eq!(*monthly_m.get_one::<i64>("days").unwrap(), 90);
        } else {
            panic!("no monthly subcommand");
        }
    } else {
        panic!("no report subcommand");
    }
}
