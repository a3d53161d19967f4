// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(anyhow::anyhow!("Unknown transaction kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: Kind,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial patch for an existing transaction; unset fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<Kind>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.amount.is_none() && self.kind.is_none()
    }
}

/// All-time income/expense sums for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindTotals {
    pub income_total: Decimal,
    pub expense_total: Decimal,
}

impl KindTotals {
    pub fn balance(&self) -> Decimal {
        self.income_total - self.expense_total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub total: Decimal,
    pub count: i64,
}
