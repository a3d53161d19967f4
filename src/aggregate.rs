// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Kind, Transaction};
use crate::store::TransactionStore;
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: i64,
    pub income_count: i64,
    pub expense_count: i64,
    pub avg_income: Decimal,
    pub avg_expense: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStat {
    pub total: Decimal,
    pub count: i64,
    pub avg: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub income: BTreeMap<String, CategoryStat>,
    pub expense: BTreeMap<String, CategoryStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTotal {
    /// ISO week number alone. The same week number from different years
    /// lands in one bucket.
    pub week: u32,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the calendar month.
    pub month: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRank {
    pub category: String,
    pub amount: Decimal,
    pub count: i64,
}

/// Inclusive lower bound of a trailing window of `days` days. A window
/// reaching past the representable range clamps to the earliest instant,
/// which turns the query into a full-log scan.
pub fn window_start(days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn summarize(rows: &[Transaction]) -> SummaryStats {
    let mut s = SummaryStats::default();
    for t in rows {
        match t.kind {
            Kind::Income => {
                s.total_income += t.amount;
                s.income_count += 1;
            }
            Kind::Expense => {
                s.total_expense += t.amount;
                s.expense_count += 1;
            }
        }
        s.transaction_count += 1;
    }
    s.balance = s.total_income - s.total_expense;
    if s.income_count > 0 {
        s.avg_income = s.total_income / Decimal::from(s.income_count);
    }
    if s.expense_count > 0 {
        s.avg_expense = s.total_expense / Decimal::from(s.expense_count);
    }
    s
}

/// Per-category totals and averages for each kind. Totals and averages are
/// rounded to two decimal places here; the average is taken over the raw
/// total before its rounding.
pub fn category_breakdown(rows: &[Transaction]) -> CategoryBreakdown {
    let mut out = CategoryBreakdown::default();
    for t in rows {
        let map = match t.kind {
            Kind::Income => &mut out.income,
            Kind::Expense => &mut out.expense,
        };
        let stat = map.entry(t.category.clone()).or_insert(CategoryStat {
            total: Decimal::ZERO,
            count: 0,
            avg: Decimal::ZERO,
        });
        stat.total += t.amount;
        stat.count += 1;
    }
    for stat in out.income.values_mut().chain(out.expense.values_mut()) {
        stat.avg = (stat.total / Decimal::from(stat.count)).round_dp(2);
        stat.total = stat.total.round_dp(2);
    }
    out
}

pub fn bucket_by_day(rows: &[Transaction]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for t in rows {
        let slot = days
            .entry(t.created_at.date_naive())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            Kind::Income => slot.0 += t.amount,
            Kind::Expense => slot.1 += t.amount,
        }
    }
    days.into_iter()
        .map(|(date, (income, expense))| DailyTotal {
            date,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}

/// Weekly totals keyed by ISO week-of-year, ascending by week number.
pub fn bucket_by_week(rows: &[Transaction]) -> Vec<WeeklyTotal> {
    let mut weeks: BTreeMap<u32, (Decimal, Decimal)> = BTreeMap::new();
    for t in rows {
        let slot = weeks
            .entry(t.created_at.iso_week().week())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            Kind::Income => slot.0 += t.amount,
            Kind::Expense => slot.1 += t.amount,
        }
    }
    weeks
        .into_iter()
        .map(|(week, (income, expense))| WeeklyTotal {
            week,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}

pub fn bucket_by_month(rows: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for t in rows {
        let date = t.created_at.date_naive();
        let month = date.with_day(1).unwrap_or(date);
        let slot = months
            .entry(month)
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            Kind::Income => slot.0 += t.amount,
            Kind::Expense => slot.1 += t.amount,
        }
    }
    months
        .into_iter()
        .map(|(month, (income, expense))| MonthlyTotal {
            month,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}

/// Top spending or earning categories, largest first. The sort is stable,
/// so categories with equal amounts keep the order in which they first
/// appear in `rows`. Amounts are rounded to two decimals after ranking.
pub fn rank_categories(rows: &[Transaction], kind: Kind, n: usize) -> Vec<CategoryRank> {
    let mut ranks: Vec<CategoryRank> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for t in rows.iter().filter(|t| t.kind == kind) {
        match index.get(&t.category) {
            Some(&i) => {
                ranks[i].amount += t.amount;
                ranks[i].count += 1;
            }
            None => {
                index.insert(t.category.clone(), ranks.len());
                ranks.push(CategoryRank {
                    category: t.category.clone(),
                    amount: t.amount,
                    count: 1,
                });
            }
        }
    }
    ranks.sort_by(|a, b| b.amount.cmp(&a.amount));
    ranks.truncate(n);
    for r in &mut ranks {
        r.amount = r.amount.round_dp(2);
    }
    ranks
}

pub fn summary_stats(
    store: &impl TransactionStore,
    user_id: i64,
    days: i64,
) -> Result<SummaryStats> {
    Ok(summarize(&store.query(user_id, window_start(days))?))
}

pub fn category_stats(
    store: &impl TransactionStore,
    user_id: i64,
    days: i64,
) -> Result<CategoryBreakdown> {
    Ok(category_breakdown(&store.query(user_id, window_start(days))?))
}

pub fn daily_totals(
    store: &impl TransactionStore,
    user_id: i64,
    days: i64,
) -> Result<Vec<DailyTotal>> {
    Ok(bucket_by_day(&store.query(user_id, window_start(days))?))
}

pub fn weekly_trends(
    store: &impl TransactionStore,
    user_id: i64,
    days: i64,
) -> Result<Vec<WeeklyTotal>> {
    Ok(bucket_by_week(&store.query(user_id, window_start(days))?))
}

pub fn monthly_trends(
    store: &impl TransactionStore,
    user_id: i64,
    days: i64,
) -> Result<Vec<MonthlyTotal>> {
    Ok(bucket_by_month(&store.query(user_id, window_start(days))?))
}

pub fn top_categories(
    store: &impl TransactionStore,
    user_id: i64,
    kind: Kind,
    days: i64,
    n: usize,
) -> Result<Vec<CategoryRank>> {
    Ok(rank_categories(
        &store.query(user_id, window_start(days))?,
        kind,
        n,
    ))
}
