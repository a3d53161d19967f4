// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Kind;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

// Anchored entry grammar: kind keyword, free-text category, trailing amount.
// Longer keyword alternatives come first so plural forms are taken whole.
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<kind>доходы|доход|income|расходы|расход|expense)\s+(?P<category>[\p{L}\p{N}\s]+)\s+(?P<amount>\d+(?:[.,]\d+)?)$",
    )
    .unwrap()
});

/// Parses a free-form transaction line like `расход продукты 1500.50`.
///
/// The line is lowercased and trimmed, then matched against an anchored
/// grammar: a kind keyword (`доход`/`доходы`/`income` or
/// `расход`/`расходы`/`expense`), a category of letters, digits and spaces,
/// and a final unsigned amount with an optional `.` or `,` decimal part.
/// Everything between the keyword and the last numeric token belongs to the
/// category, so `расход еда 1500 2000` records `еда 1500` costing `2000`.
///
/// Returns `None` for anything that does not fit, including a zero amount.
pub fn parse(text: &str) -> Option<(Kind, String, Decimal)> {
    let normalized = text.to_lowercase();
    let caps = ENTRY_RE.captures(normalized.trim())?;
    let kind = kind_keyword(&caps["kind"])?;
    let category = normalize_category(&caps["category"])?;
    let amount = parse_amount(&caps["amount"])?;
    if amount <= Decimal::ZERO {
        return None;
    }
    Some((kind, category, amount))
}

/// True when `text` would be accepted by [`parse`].
pub fn looks_like_transaction(text: &str) -> bool {
    parse(text).is_some()
}

/// Numeric-token rule shared by the entry grammar and the edit flows:
/// `,` is a valid decimal separator. Sign checks stay with the caller.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    text.trim().replace(',', ".").parse::<Decimal>().ok()
}

/// Trims and collapses internal whitespace runs; `None` when nothing is left.
pub fn normalize_category(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Resolves a single kind keyword in either deployment language.
pub fn kind_keyword(text: &str) -> Option<Kind> {
    match text.trim().to_lowercase().as_str() {
        "доход" | "доходы" | "income" => Some(Kind::Income),
        "расход" | "расходы" | "expense" => Some(Kind::Expense),
        _ => None,
    }
}
