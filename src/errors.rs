// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failures for transaction writes. Create and update enforce
/// the same rules.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Category must not be empty")]
    EmptyCategory,
}
