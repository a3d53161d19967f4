// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db;
use crate::errors::EntryError;
use crate::models::{CategoryTotal, Kind, KindTotals, Transaction, TransactionUpdate};
use crate::parser::normalize_category;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Persistence seam for the transaction log. Reads never fail on empty
/// windows; update/delete report a miss as `Ok(false)`.
pub trait TransactionStore {
    /// Validates, stamps `created_at` and stores a new entry, returning it
    /// with its assigned id.
    fn create(
        &self,
        user_id: i64,
        kind: Kind,
        category: &str,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction>;

    /// All transactions of `user_id` with `created_at >= since`, newest
    /// first. No upper bound, so future-dated rows are included.
    fn query(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<Transaction>>;

    /// Applies the set fields of `patch` to the row owned by `user_id`.
    /// Patch values are validated before anything is written. `Ok(false)`
    /// when the row is absent or owned by someone else.
    fn update(&self, id: i64, user_id: i64, patch: &TransactionUpdate) -> Result<bool>;

    fn delete(&self, id: i64, user_id: i64) -> Result<bool>;

    /// All-time income and expense sums, ignoring any window.
    fn sum_by_kind(&self, user_id: i64) -> Result<KindTotals>;

    fn group_by_category(
        &self,
        user_id: i64,
        kind: Kind,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<String, CategoryTotal>>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open_default() -> Result<Self> {
        Ok(Self {
            conn: db::open_or_init()?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Open in-memory DB")?;
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn new(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// Fixed-width so that TEXT comparison in SQL equals chronological order.
const TS_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TS_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.format(TS_WRITE_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TS_READ_FORMAT)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid timestamp '{}'", s))
}

type RawRow = (i64, i64, String, String, String, Option<String>, String);

fn decode_row(row: RawRow) -> Result<Transaction> {
    let (id, user_id, kind, category, amount, description, created_at) = row;
    Ok(Transaction {
        id,
        user_id,
        kind: kind.parse()?,
        category,
        amount: amount
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transaction {}", amount, id))?,
        description,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn kind_sum(conn: &Connection, user_id: i64, kind: Kind) -> Result<Decimal> {
    let total_f: f64 = conn.query_row(
        "SELECT IFNULL(SUM(amount), 0) FROM transactions WHERE user_id=?1 AND kind=?2",
        params![user_id, kind.as_str()],
        |r| r.get(0),
    )?;
    Decimal::try_from(total_f).with_context(|| format!("Invalid {} total '{}'", kind, total_f))
}

impl TransactionStore for SqliteStore {
    fn create(
        &self,
        user_id: i64,
        kind: Kind,
        category: &str,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction> {
        let category = normalize_category(category).ok_or(EntryError::EmptyCategory)?;
        if amount <= Decimal::ZERO {
            return Err(EntryError::NonPositiveAmount(amount).into());
        }
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO transactions(user_id, kind, category, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                kind.as_str(),
                category,
                amount.to_string(),
                description,
                timestamp_text(created_at)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, user_id, kind = kind.as_str(), %amount, "recorded transaction");
        Ok(Transaction {
            id,
            user_id,
            kind,
            category,
            amount,
            description: description.map(|s| s.to_string()),
            created_at,
        })
    }

    fn query(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, kind, category, amount, description, created_at
             FROM transactions
             WHERE user_id=?1 AND created_at>=?2
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id, timestamp_text(since)], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut data = Vec::new();
        for row in rows {
            data.push(decode_row(row?)?);
        }
        Ok(data)
    }

    fn update(&self, id: i64, user_id: i64, patch: &TransactionUpdate) -> Result<bool> {
        let category = match patch.category.as_deref() {
            Some(raw) => Some(normalize_category(raw).ok_or(EntryError::EmptyCategory)?),
            None => None,
        };
        if let Some(amount) = patch.amount {
            if amount <= Decimal::ZERO {
                return Err(EntryError::NonPositiveAmount(amount).into());
            }
        }
        // Single conditional statement: a concurrent delete of the same row
        // makes this report false instead of resurrecting anything.
        let n = self.conn.execute(
            "UPDATE transactions
             SET category=COALESCE(?1, category),
                 amount=COALESCE(?2, amount),
                 kind=COALESCE(?3, kind)
             WHERE id=?4 AND user_id=?5",
            params![
                category,
                patch.amount.map(|a| a.to_string()),
                patch.kind.map(|k| k.as_str()),
                id,
                user_id
            ],
        )?;
        if n > 0 {
            info!(id, user_id, "updated transaction");
        }
        Ok(n > 0)
    }

    fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if n > 0 {
            info!(id, user_id, "deleted transaction");
        }
        Ok(n > 0)
    }

    fn sum_by_kind(&self, user_id: i64) -> Result<KindTotals> {
        Ok(KindTotals {
            income_total: kind_sum(&self.conn, user_id, Kind::Income)?,
            expense_total: kind_sum(&self.conn, user_id, Kind::Expense)?,
        })
    }

    fn group_by_category(
        &self,
        user_id: i64,
        kind: Kind,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<String, CategoryTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, IFNULL(SUM(amount), 0), COUNT(*)
             FROM transactions
             WHERE user_id=?1 AND kind=?2 AND created_at>=?3
             GROUP BY category",
        )?;
        let rows = stmt.query_map(
            params![user_id, kind.as_str(), timestamp_text(since)],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, f64>(1)?,
                    r.get::<_, i64>(2)?,
                ))
            },
        )?;
        let mut map = BTreeMap::new();
        for row in rows {
            let (category, total_f, count) = row?;
            let total = Decimal::try_from(total_f)
                .with_context(|| format!("Invalid total '{}' for category {}", total_f, category))?;
            map.insert(category, CategoryTotal { total, count });
        }
        Ok(map)
    }
}
