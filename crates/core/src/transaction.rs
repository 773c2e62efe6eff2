use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount;

/// A settled bank transaction as fetched from the upstream source.
/// Immutable once built; a later fetch with the same id supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub balance: Option<Decimal>,
    pub description_raw: String,
    pub merchant_normalised: String,
    pub source: String,
}

/// Column selector used by categorisation and ignore rules.
///
/// Rules name their target column as free text; unrecognised names resolve
/// to `Unknown`, which reads as an empty string and therefore matches
/// nothing beyond patterns that accept the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnField {
    Id,
    Date,
    Account,
    Amount,
    Balance,
    DescriptionRaw,
    MerchantNormalised,
    Source,
    Unknown,
}

impl TxnField {
    pub fn parse(name: &str) -> TxnField {
        match name.trim() {
            "id" => TxnField::Id,
            "date" => TxnField::Date,
            "account" => TxnField::Account,
            "amount" => TxnField::Amount,
            "balance" => TxnField::Balance,
            "description_raw" => TxnField::DescriptionRaw,
            "merchant_normalised" => TxnField::MerchantNormalised,
            "source" => TxnField::Source,
            _ => TxnField::Unknown,
        }
    }
}

impl Transaction {
    /// String view of a field, rendered the same way the sheet stores the
    /// column, so rule patterns see identical text either way.
    pub fn field(&self, field: TxnField) -> Cow<'_, str> {
        match field {
            TxnField::Id => Cow::Borrowed(self.id.as_str()),
            TxnField::Date => Cow::Owned(self.date.to_string()),
            TxnField::Account => Cow::Borrowed(self.account.as_str()),
            TxnField::Amount => Cow::Owned(amount::format_2dp(self.amount)),
            TxnField::Balance => {
                Cow::Owned(self.balance.map(amount::format_2dp).unwrap_or_default())
            }
            TxnField::DescriptionRaw => Cow::Borrowed(self.description_raw.as_str()),
            TxnField::MerchantNormalised => Cow::Borrowed(self.merchant_normalised.as_str()),
            TxnField::Source => Cow::Borrowed(self.source.as_str()),
            TxnField::Unknown => Cow::Borrowed(""),
        }
    }

    /// Render the fixed-column sheet row for this transaction.
    /// Column order must stay in lockstep with [`crate::TRANSACTION_HEADERS`].
    pub fn to_row(
        &self,
        category: &str,
        category_type: &str,
        is_transfer: bool,
        imported_at: DateTime<Utc>,
    ) -> Vec<String> {
        vec![
            self.id.clone(),
            self.date.to_string(),
            self.account.clone(),
            amount::format_2dp(self.amount),
            self.balance.map(amount::format_2dp).unwrap_or_default(),
            self.description_raw.clone(),
            self.merchant_normalised.clone(),
            category.to_string(),
            category_type.to_string(),
            if is_transfer { "TRUE" } else { "FALSE" }.to_string(),
            self.source.clone(),
            imported_at.to_rfc3339(),
        ]
    }
}
