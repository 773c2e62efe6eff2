use std::path::Path;

use anyhow::Context;
use chrono::{Duration, Utc};
use kahu_akahu::AkahuClient;
use kahu_rules::{build_ignore_rules, should_ignore, Categoriser};
use kahu_sheets::SheetsClient;
use kahu_sync::{plan_sync, reconcile};

use crate::config::Config;
use crate::state::SyncState;

/// One full sync pass: fetch → filter → classify → diff → apply →
/// reconcile → save state. With `dry_run` the plan is computed and logged
/// but nothing mutates and the state timestamp stays put.
pub async fn run_sync(config: &Config, dry_run: bool, reset_state: bool) -> anyhow::Result<()> {
    let credentials_path = config.credentials_path()?;

    let end_timestamp = Utc::now();
    let state = SyncState::load(&config.state_file);
    let start_timestamp = match state.last_synced_at {
        // Overlap the previous window by a millisecond so a transaction
        // settling exactly on the boundary is never skipped.
        Some(last) if !reset_state => last - Duration::milliseconds(1),
        _ => {
            let start = end_timestamp - Duration::days(i64::from(config.lookback_days));
            if reset_state {
                tracing::info!("Resetting sync state, will fetch from {start}");
            }
            start
        }
    };

    let mut sheets = SheetsClient::connect(
        &config.spreadsheet_id,
        &credentials_path,
        &config.transactions_tab,
        &config.category_map_tab,
    )
    .await
    .context("connecting to Google Sheets")?;

    let stored = sheets.fetch_transactions().await?;
    let rule_specs = sheets.fetch_category_rules().await?;
    let categoriser = Categoriser::new(rule_specs);
    let ignore_rules = build_ignore_rules(&config.ignore_rules)?;

    let akahu = AkahuClient::new(&config.akahu_user_token, &config.akahu_app_token)?;
    tracing::info!("Fetching Akahu transactions between {start_timestamp} and {end_timestamp}");
    let fetched = akahu
        .fetch_settled_transactions(start_timestamp, end_timestamp)
        .await?;
    tracing::info!("Fetched {} transactions from Akahu", fetched.len());

    let imported_at = Utc::now();
    let mut rendered: Vec<(String, Vec<String>)> = Vec::with_capacity(fetched.len());
    for tx in &fetched {
        if should_ignore(tx, &ignore_rules) {
            // Not marked seen either: if this id is already stored, the
            // diff will schedule it for deletion.
            tracing::info!(
                "Ignoring transaction {} ({}) due to ignore rules",
                tx.id,
                tx.description_raw
            );
            continue;
        }
        let (category, category_type) = categoriser.categorise(tx);
        let is_transfer = Categoriser::detect_transfer(tx);
        rendered.push((
            tx.id.clone(),
            tx.to_row(&category, &category_type, is_transfer, imported_at),
        ));
    }

    let plan = plan_sync(&stored, &rendered);
    tracing::info!(
        "Processing complete: {} new, {} updates, {} deletions",
        plan.inserts.len(),
        plan.updates.len(),
        plan.deletes.len()
    );

    if dry_run {
        for line in plan.summary() {
            tracing::info!("Dry-run: {line}");
        }
        return Ok(());
    }

    if !plan.inserts.is_empty() {
        sheets.append_transactions(&plan.inserts).await?;
    }
    if !plan.updates.is_empty() {
        sheets.batch_update_transactions(&plan.updates).await?;
    }
    if !plan.deletes.is_empty() {
        sheets.delete_rows(&plan.deletes).await?;
    }

    if config.perform_reconciliation {
        // Reconcile the post-apply table, not the stale pre-apply view.
        let refreshed = sheets.fetch_transactions().await?;
        for result in reconcile(&refreshed) {
            if result.is_ok() {
                tracing::info!("Reconciled {}: {:.2}", result.account, result.expected_balance);
            } else {
                tracing::warn!(
                    "Reconciliation drift for {}: expected {:.2} vs sheet {:.2} (diff {:.2})",
                    result.account,
                    result.expected_balance,
                    result.sheet_balance,
                    result.difference
                );
            }
        }
    }

    let new_state = SyncState {
        last_synced_at: Some(end_timestamp),
    };
    new_state.save(&config.state_file).context("saving sync state")?;
    Ok(())
}

/// Push category rules from a local CSV file to the category tab,
/// replacing whatever is there.
pub async fn upload_categories(config: &Config, csv_path: &Path) -> anyhow::Result<()> {
    let credentials_path = config.credentials_path()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    anyhow::ensure!(!rows.is_empty(), "CSV file is empty: {}", csv_path.display());
    tracing::info!(
        "Read {} rows from {} (including header)",
        rows.len(),
        csv_path.display()
    );

    let sheets = SheetsClient::connect(
        &config.spreadsheet_id,
        &credentials_path,
        &config.transactions_tab,
        &config.category_map_tab,
    )
    .await
    .context("connecting to Google Sheets")?;

    sheets.upload_category_rules(&rows).await?;
    tracing::info!(
        "Uploaded {} category rules to the {} tab",
        rows.len().saturating_sub(1),
        config.category_map_tab
    );
    Ok(())
}
