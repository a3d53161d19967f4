// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate;
use crate::parser;
use crate::store::{SqliteStore, TransactionStore};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, sub)?,
        Some(("categories", sub)) => categories(store, sub)?,
        Some(("daily", sub)) => daily(store, sub)?,
        Some(("weekly", sub)) => weekly(store, sub)?,
        Some(("monthly", sub)) => monthly(store, sub)?,
        Some(("top", sub)) => top(store, sub)?,
        Some(("balance", sub)) => balance(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let s = aggregate::summary_stats(store, user, days)?;
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        let rows = vec![
            vec!["Income".to_string(), fmt_money(&s.total_income)],
            vec!["Expense".to_string(), fmt_money(&s.total_expense)],
            vec!["Balance".to_string(), fmt_money(&s.balance)],
            vec!["Entries".to_string(), s.transaction_count.to_string()],
            vec!["Avg income".to_string(), fmt_money(&s.avg_income)],
            vec!["Avg expense".to_string(), fmt_money(&s.avg_expense)],
        ];
        println!(
            "{}",
            pretty_table(&["Metric", &format!("Last {} days", days)], rows)
        );
    }
    Ok(())
}

fn categories(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let b = aggregate::category_stats(store, user, days)?;
    if !maybe_print_json(json_flag, jsonl_flag, &b)? {
        for (title, map) in [("Income", &b.income), ("Expense", &b.expense)] {
            let rows: Vec<Vec<String>> = map
                .iter()
                .map(|(cat, st)| {
                    vec![
                        cat.clone(),
                        st.total.to_string(),
                        st.count.to_string(),
                        st.avg.to_string(),
                    ]
                })
                .collect();
            println!("{}", title);
            println!(
                "{}",
                pretty_table(&["Category", "Total", "Count", "Avg"], rows)
            );
        }
    }
    Ok(())
}

fn daily(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let data = aggregate::daily_totals(store, user, days)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|d| {
                vec![
                    d.date.to_string(),
                    d.income.to_string(),
                    d.expense.to_string(),
                    d.balance.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Income", "Expense", "Balance"], rows)
        );
    }
    Ok(())
}

fn weekly(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let data = aggregate::weekly_trends(store, user, days)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|w| {
                vec![
                    format!("W{:02}", w.week),
                    w.income.to_string(),
                    w.expense.to_string(),
                    w.balance.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Week", "Income", "Expense", "Balance"], rows)
        );
    }
    Ok(())
}

fn monthly(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let data = aggregate::monthly_trends(store, user, days)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|m| {
                vec![
                    m.month.format("%Y-%m").to_string(),
                    m.income.to_string(),
                    m.expense.to_string(),
                    m.balance.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Balance"], rows)
        );
    }
    Ok(())
}

fn top(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let limit = *sub.get_one::<usize>("limit").unwrap();
    let raw_kind = sub.get_one::<String>("kind").unwrap();
    let Some(kind) = parser::kind_keyword(raw_kind) else {
        return Err(anyhow!(
            "Unknown kind '{}', use income/доход or expense/расход",
            raw_kind
        ));
    };
    let data = aggregate::top_categories(store, user, kind, days, limit)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.category.clone(),
                    r.amount.to_string(),
                    r.count.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Amount", "Count"], rows));
    }
    Ok(())
}

fn balance(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = *sub.get_one::<i64>("user").unwrap();
    let totals = store.sum_by_kind(user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &totals)? {
        let rows = vec![
            vec!["Income".to_string(), fmt_money(&totals.income_total)],
            vec!["Expense".to_string(), fmt_money(&totals.expense_total)],
            vec!["Balance".to_string(), fmt_money(&totals.balance())],
        ];
        println!("{}", pretty_table(&["Metric", "All time"], rows));
    }
    Ok(())
}
