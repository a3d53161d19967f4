// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::window_start;
use crate::models::{Transaction, TransactionUpdate};
use crate::parser;
use crate::store::{SqliteStore, TransactionStore};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => rm(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let user = *sub.get_one::<i64>("user").unwrap();
    let text = sub
        .get_many::<String>("text")
        .unwrap()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let desc = sub.get_one::<String>("desc").map(|s| s.to_string());

    let Some((kind, category, amount)) = parser::parse(&text) else {
        return Err(anyhow!(
            "Could not read '{}'. Expected: <доход|расход> <категория> <сумма>",
            text
        ));
    };
    let tx = store.create(user, kind, &category, amount, desc.as_deref())?;
    println!(
        "Recorded {} '{}' {} (id {})",
        tx.kind,
        tx.category,
        fmt_money(&tx.amount),
        tx.id
    );
    Ok(())
}

fn list(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.created_at.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "When", "Kind", "Category", "Amount", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub created_at: String,
    pub kind: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

fn row_from(t: Transaction) -> TransactionRow {
    TransactionRow {
        id: t.id,
        created_at: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        kind: t.kind.to_string(),
        category: t.category,
        amount: t.amount.to_string(),
        description: t.description.unwrap_or_default(),
    }
}

pub fn query_rows(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let user = *sub.get_one::<i64>("user").unwrap();
    let days = *sub.get_one::<i64>("days").unwrap();
    let mut data = store.query(user, window_start(days))?;
    if let Some(&limit) = sub.get_one::<usize>("limit") {
        data.truncate(limit);
    }
    Ok(data.into_iter().map(row_from).collect())
}

fn edit(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let user = *sub.get_one::<i64>("user").unwrap();
    let id = *sub.get_one::<i64>("id").unwrap();

    let mut patch = TransactionUpdate::default();
    if let Some(category) = sub.get_one::<String>("category") {
        patch.category = Some(category.to_string());
    }
    if let Some(raw) = sub.get_one::<String>("amount") {
        match parser::parse_amount(raw) {
            Some(amount) => patch.amount = Some(amount),
            None => return Err(anyhow!("Invalid amount '{}'", raw)),
        }
    }
    if let Some(raw) = sub.get_one::<String>("kind") {
        match parser::kind_keyword(raw) {
            Some(kind) => patch.kind = Some(kind),
            None => {
                return Err(anyhow!(
                    "Unknown kind '{}', use income/доход or expense/расход",
                    raw
                ));
            }
        }
    }
    if patch.is_empty() {
        return Err(anyhow!(
            "Nothing to change, pass --category, --amount or --kind"
        ));
    }

    if store.update(id, user, &patch)? {
        println!("Updated transaction {}", id);
    } else {
        println!("Transaction {} not found", id);
    }
    Ok(())
}

fn rm(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let user = *sub.get_one::<i64>("user").unwrap();
    let id = *sub.get_one::<i64>("id").unwrap();
    if store.delete(id, user)? {
        println!("Deleted transaction {}", id);
    } else {
        println!("Transaction {} not found", id);
    }
    Ok(())
}
