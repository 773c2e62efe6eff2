use std::collections::HashMap;
use std::path::Path;

use kahu_core::StoredRecord;
use kahu_rules::RuleSpec;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::{fetch_access_token, ServiceAccountKey};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed service account key: {0}")]
    Key(#[from] serde_json::Error),
    #[error("JWT signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No rows to upload")]
    EmptyUpload,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "sheetId")]
    sheet_id: i64,
}

/// Thin adapter over the Sheets v4 values API. Ranges use `A2:L` /
/// `A2:F` bounds — the transaction and category tabs' fixed column sets.
pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
    spreadsheet_id: String,
    transactions_tab: String,
    category_tab: String,
    sheet_id_cache: HashMap<String, i64>,
}

impl SheetsClient {
    /// Read the service-account key, perform the token exchange, and return
    /// a ready client. All credential problems surface here, before any
    /// sheet traffic.
    pub async fn connect(
        spreadsheet_id: &str,
        credentials_path: &Path,
        transactions_tab: &str,
        category_map_tab: &str,
    ) -> Result<SheetsClient, SheetsError> {
        let http = reqwest::Client::new();
        let key = ServiceAccountKey::from_file(credentials_path)?;
        let token = fetch_access_token(&http, &key).await?;
        Ok(SheetsClient {
            http,
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
            transactions_tab: transactions_tab.to_string(),
            category_tab: category_map_tab.to_string(),
            sheet_id_cache: HashMap::new(),
        })
    }

    /// All stored transaction rows, positions starting at sheet row 2
    /// (row 1 is the header).
    pub async fn fetch_transactions(&self) -> Result<Vec<StoredRecord>, SheetsError> {
        let range = format!("{}!A2:L", self.transactions_tab);
        let response: ValueRange = self
            .http
            .get(self.values_url(&range, None))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .values
            .into_iter()
            .enumerate()
            .map(|(offset, cells)| StoredRecord::from_cells(offset + 2, cells))
            .collect())
    }

    pub async fn append_transactions(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        tracing::info!("Appending {} new transactions", rows.len());
        let range = format!("{}!A:L", self.transactions_tab);
        self.http
            .post(self.values_url(&range, Some("append")))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": rows }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Rewrite changed rows in a single values batchUpdate.
    pub async fn batch_update_transactions(
        &self,
        updates: &[(usize, Vec<String>)],
    ) -> Result<(), SheetsError> {
        if updates.is_empty() {
            return Ok(());
        }
        tracing::info!("Batch updating {} rows", updates.len());
        let data: Vec<Value> = updates
            .iter()
            .map(|(row_index, row)| {
                json!({
                    "range": format!("{}!A{row_index}:L{row_index}", self.transactions_tab),
                    "values": [row],
                })
            })
            .collect();
        self.http
            .post(format!(
                "{API_BASE}/{}/values:batchUpdate",
                self.spreadsheet_id
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "valueInputOption": "USER_ENTERED", "data": data }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Physically remove rows. Positions are deleted highest-first so the
    /// earlier removals cannot shift the later ones.
    pub async fn delete_rows(&mut self, row_indices: &[usize]) -> Result<(), SheetsError> {
        if row_indices.is_empty() {
            return Ok(());
        }
        let tab = self.transactions_tab.clone();
        let sheet_id = self.sheet_id(&tab).await?;
        tracing::warn!("Deleting {} transactions", row_indices.len());
        self.http
            .post(format!("{API_BASE}/{}:batchUpdate", self.spreadsheet_id))
            .bearer_auth(&self.token)
            .json(&json!({ "requests": delete_requests(sheet_id, row_indices) }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Category rules from the rule tab, padded to the six-column layout
    /// with the documented defaults.
    pub async fn fetch_category_rules(&self) -> Result<Vec<RuleSpec>, SheetsError> {
        let range = format!("{}!A2:F", self.category_tab);
        let response: ValueRange = self
            .http
            .get(self.values_url(&range, None))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.values.into_iter().map(rule_from_cells).collect())
    }

    /// Replace the category tab's contents with rows from a local file:
    /// clear everything below the header, then write from the top
    /// (including the uploaded header row).
    pub async fn upload_category_rules(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Err(SheetsError::EmptyUpload);
        }
        let clear_range = format!("{}!A2:F", self.category_tab);
        self.http
            .post(self.values_url(&clear_range, Some("clear")))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!("Cleared existing category rules");

        let write_range = format!("{}!A1:F", self.category_tab);
        self.http
            .put(self.values_url(&write_range, None))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": rows }))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!("Uploaded {} rows to {}", rows.len(), self.category_tab);
        Ok(())
    }

    /// Numeric sheetId for a tab, resolved from spreadsheet metadata once
    /// and cached. Unknown titles fall back to 0, the first sheet.
    async fn sheet_id(&mut self, title: &str) -> Result<i64, SheetsError> {
        if let Some(id) = self.sheet_id_cache.get(title) {
            return Ok(*id);
        }
        let metadata: SpreadsheetMetadata = self
            .http
            .get(format!("{API_BASE}/{}", self.spreadsheet_id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        for sheet in metadata.sheets {
            self.sheet_id_cache
                .insert(sheet.properties.title, sheet.properties.sheet_id);
        }
        Ok(self.sheet_id_cache.get(title).copied().unwrap_or(0))
    }

    fn values_url(&self, range: &str, verb: Option<&str>) -> String {
        match verb {
            Some(verb) => format!(
                "{API_BASE}/{}/values/{range}:{verb}",
                self.spreadsheet_id
            ),
            None => format!("{API_BASE}/{}/values/{range}", self.spreadsheet_id),
        }
    }
}

// ── Pure request/row helpers ──────────────────────────────────────────────────

/// Build deleteDimension requests, highest position first. Sheet positions
/// are 1-based; the API's row indices are 0-based and half-open.
fn delete_requests(sheet_id: i64, row_indices: &[usize]) -> Vec<Value> {
    let mut ordered: Vec<usize> = row_indices.to_vec();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    ordered
        .into_iter()
        .map(|index| {
            json!({
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": index - 1,
                        "endIndex": index,
                    }
                }
            })
        })
        .collect()
}

/// Pad a raw rule row to the six-column layout and apply defaults.
/// Column order: pattern, field, category, priority, amount_condition,
/// category_type.
fn rule_from_cells(cells: Vec<String>) -> RuleSpec {
    let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
    let or_default = |value: String, default: &str| {
        if value.is_empty() {
            default.to_string()
        } else {
            value
        }
    };
    RuleSpec {
        pattern: cell(0),
        field: or_default(cell(1), "merchant_normalised"),
        category: or_default(cell(2), "Uncategorised"),
        priority: or_default(cell(3), "1000"),
        amount_condition: cell(4),
        category_type: cell(5),
    }
}
