// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{self, SqliteStore, TransactionStore};
use anyhow::{Result, anyhow};
use chrono::DateTime;
use serde_json::json;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(store, sub),
        _ => Ok(()),
    }
}

fn export_transactions(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let user = *sub.get_one::<i64>("user").unwrap();

    // Full log, oldest first.
    let mut rows = store.query(user, DateTime::UNIX_EPOCH)?;
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "created_at", "kind", "category", "amount", "description"])?;
            for t in &rows {
                wtr.write_record([
                    t.id.to_string(),
                    store::timestamp_text(t.created_at),
                    t.kind.to_string(),
                    t.category.clone(),
                    t.amount.to_string(),
                    t.description.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for t in &rows {
                items.push(json!({
                    "id": t.id,
                    "created_at": store::timestamp_text(t.created_at),
                    "kind": t.kind,
                    "category": t.category,
                    "amount": t.amount,
                    "description": t.description,
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
