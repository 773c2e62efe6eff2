use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use kahu_core::{amount, Transaction};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// One page of the paginated `/transactions` response.
#[derive(Debug, Deserialize)]
pub struct TransactionsPage {
    #[serde(default)]
    pub items: Vec<RawTransaction>,
    #[serde(default)]
    pub cursor: Cursor,
}

#[derive(Debug, Default, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountsPage {
    #[serde(default)]
    pub items: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
pub struct RawAccount {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Raw transaction payload. Field shapes are deliberately loose: the
/// upstream data is semi-trusted, and an odd value in one field must fall
/// back rather than fail the whole page.
#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub settled_at: Option<String>,
    #[serde(rename = "_account", default)]
    pub account: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant: Option<RawMerchant>,
    #[serde(default)]
    pub merchant_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMerchant {
    #[serde(default)]
    pub name: Option<String>,
}

impl RawTransaction {
    /// Map into the domain record.
    ///
    /// Fallbacks are deliberate: missing or unparsable date becomes today,
    /// missing amount becomes zero, an unparsable balance becomes absent,
    /// and the merchant name falls back from `merchant.name` to the flat
    /// `merchant_name` field.
    pub fn into_transaction(self, account_name: &str, source: &str) -> Transaction {
        let date = ensure_iso_date(self.date.as_deref().or(self.settled_at.as_deref()));
        let amount = self.amount.as_ref().and_then(value_to_decimal).unwrap_or_default();
        let balance = self.balance.as_ref().and_then(value_to_decimal);
        let merchant_normalised = self
            .merchant
            .and_then(|merchant| merchant.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or(self.merchant_name)
            .unwrap_or_default();

        Transaction {
            id: self.id,
            date,
            account: account_name.to_string(),
            amount,
            balance,
            description_raw: self.description.unwrap_or_default(),
            merchant_normalised,
            source: source.to_string(),
        }
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(text) => amount::coerce(text),
        _ => None,
    }
}

/// Settlement timestamps arrive as bare dates or full datetimes; anything
/// else collapses to today rather than aborting the run.
fn ensure_iso_date(raw: Option<&str>) -> NaiveDate {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return Utc::now().date_naive();
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return datetime.date_naive();
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return datetime.date();
    }
    Utc::now().date_naive()
}
