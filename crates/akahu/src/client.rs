use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kahu_core::Transaction;
use thiserror::Error;

use crate::payload::{AccountsPage, TransactionsPage};

const BASE_URL: &str = "https://api.akahu.io/v1";
const PAGE_SIZE: usize = 250;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source tag stamped on every fetched transaction.
const SOURCE_TAG: &str = "akahu_bnz";

#[derive(Debug, Error)]
pub enum AkahuError {
    #[error("Akahu request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Minimal client for the Akahu API.
///
/// One logical request sequence per run: the account map is loaded once,
/// then the transaction pages for the window are drained in order. Non-2xx
/// responses propagate as fatal; retry policy, if any, belongs to the
/// caller's scheduler.
pub struct AkahuClient {
    http: reqwest::Client,
    user_token: String,
    app_token: String,
    base_url: String,
}

impl AkahuClient {
    pub fn new(user_token: &str, app_token: &str) -> Result<AkahuClient, AkahuError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(AkahuClient {
            http,
            user_token: user_token.to_string(),
            app_token: app_token.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> AkahuClient {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch every settled transaction in `[start, end]`, draining all
    /// cursor pages before returning.
    pub async fn fetch_settled_transactions(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AkahuError> {
        let account_names = self.fetch_account_names().await?;

        let mut transactions = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut request = self.get("/transactions").query(&[
                ("start", start.to_rfc3339()),
                ("end", end.to_rfc3339()),
                ("limit", PAGE_SIZE.to_string()),
                ("type", "SETTLED".to_string()),
            ]);
            if let Some(next) = &cursor {
                request = request.query(&[("cursor", next)]);
            }
            let page: TransactionsPage =
                request.send().await?.error_for_status()?.json().await?;
            tracing::debug!("Akahu returned {} settled transactions", page.items.len());

            for raw in page.items {
                let account_name = raw
                    .account
                    .as_deref()
                    .and_then(|id| account_names.get(id))
                    .map(String::as_str)
                    .unwrap_or("unknown");
                transactions.push(raw.into_transaction(account_name, SOURCE_TAG));
            }

            cursor = page.cursor.next;
            if cursor.is_none() {
                break;
            }
        }
        Ok(transactions)
    }

    /// `/accounts` gives display names; transactions only carry account ids.
    async fn fetch_account_names(&self) -> Result<HashMap<String, String>, AkahuError> {
        let page: AccountsPage = self
            .get("/accounts")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::info!("Loaded {} accounts", page.items.len());
        Ok(page
            .items
            .into_iter()
            .map(|account| {
                let name = account.name.unwrap_or_else(|| "unknown".to_string());
                (account.id, name)
            })
            .collect())
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.user_token)
            .header("X-Akahu-Id", &self.app_token)
    }
}
