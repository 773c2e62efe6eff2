use std::collections::BTreeMap;

use kahu_core::{amount, StoredRecord};
use rust_decimal::Decimal;

/// Per-account comparison of the recorded balance against the sum of the
/// account's stored amounts.
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    pub account: String,
    pub difference: Decimal,
    pub expected_balance: Decimal,
    pub sheet_balance: Decimal,
}

impl ReconciliationResult {
    /// 10-cent absolute tolerance for rounding/timing differences.
    pub fn is_ok(&self) -> bool {
        self.difference.abs() < Decimal::new(10, 2)
    }
}

/// Group stored records by account name and compute the drift between the
/// latest recorded balance and the sum of amounts. Records without an
/// account name group under "unknown". Results come back in account-name
/// order; drift is reported, never raised.
pub fn reconcile(records: &[StoredRecord]) -> Vec<ReconciliationResult> {
    let mut grouped: BTreeMap<&str, Vec<&StoredRecord>> = BTreeMap::new();
    for record in records {
        let account = match record.get("account") {
            "" => "unknown",
            name => name,
        };
        grouped.entry(account).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(account, group)| {
            let sheet_balance: Decimal = group
                .iter()
                .map(|record| amount::coerce(record.get("amount")).unwrap_or_default())
                .sum();
            let expected_balance = latest_balance(&group);
            ReconciliationResult {
                account: account.to_string(),
                difference: expected_balance - sheet_balance,
                expected_balance,
                sheet_balance,
            }
        })
        .collect()
}

/// Balance column of the chronologically latest record carrying a
/// non-empty numeric balance; zero when none does. Dates are ISO strings,
/// so lexicographic order is chronological order.
fn latest_balance(group: &[&StoredRecord]) -> Decimal {
    let mut ordered: Vec<&StoredRecord> = group.to_vec();
    ordered.sort_by(|a, b| a.get("date").cmp(b.get("date")));
    for record in ordered.iter().rev() {
        let raw = record.get("balance");
        if raw.is_empty() {
            continue;
        }
        if let Some(balance) = amount::coerce(raw) {
            return balance;
        }
    }
    Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row_index: usize, account: &str, date: &str, amount: &str, balance: &str) -> StoredRecord {
        StoredRecord::from_cells(
            row_index,
            vec![
                format!("tx_{row_index}"),
                date.to_string(),
                account.to_string(),
                amount.to_string(),
                balance.to_string(),
            ],
        )
    }

    #[test]
    fn balanced_account_is_ok() {
        let records = vec![
            record(2, "Everyday", "2025-01-01", "100.00", ""),
            record(3, "Everyday", "2025-01-02", "-40.00", "60.00"),
        ];
        let results = reconcile(&records);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.account, "Everyday");
        assert_eq!(result.sheet_balance, Decimal::new(6000, 2));
        assert_eq!(result.expected_balance, Decimal::new(6000, 2));
        assert!(result.is_ok());
    }

    #[test]
    fn drift_beyond_tolerance_is_flagged() {
        let records = vec![record(2, "Everyday", "2025-01-01", "100.00", "120.00")];
        let results = reconcile(&records);
        assert!(!results[0].is_ok());
        assert_eq!(results[0].difference, Decimal::new(2000, 2));
    }

    #[test]
    fn tolerance_boundary_is_exclusive() {
        let just_inside = vec![record(2, "A", "2025-01-01", "0.000001", "0.10")];
        let results = reconcile(&just_inside);
        // difference = 0.099999
        assert!(results[0].is_ok());

        let exactly_at = vec![record(2, "A", "2025-01-01", "0.00", "0.10")];
        let results = reconcile(&exactly_at);
        // difference = 0.10
        assert!(!results[0].is_ok());
    }

    #[test]
    fn expected_balance_comes_from_latest_dated_record() {
        // Row order deliberately disagrees with date order.
        let records = vec![
            record(2, "Everyday", "2025-01-05", "5.00", "50.00"),
            record(3, "Everyday", "2025-01-01", "45.00", "45.00"),
        ];
        let results = reconcile(&records);
        assert_eq!(results[0].expected_balance, Decimal::new(5000, 2));
    }

    #[test]
    fn blank_and_unparsable_balances_are_skipped() {
        let records = vec![
            record(2, "Everyday", "2025-01-01", "10.00", "10.00"),
            record(3, "Everyday", "2025-01-02", "5.00", ""),
            record(4, "Everyday", "2025-01-03", "0.00", "pending"),
        ];
        let results = reconcile(&records);
        // Scan walks back past the blank and the unparsable value.
        assert_eq!(results[0].expected_balance, Decimal::new(1000, 2));
    }

    #[test]
    fn missing_balance_everywhere_defaults_to_zero() {
        let records = vec![record(2, "Everyday", "2025-01-01", "10.00", "")];
        let results = reconcile(&records);
        assert_eq!(results[0].expected_balance, Decimal::ZERO);
        assert_eq!(results[0].difference, Decimal::new(-1000, 2));
    }

    #[test]
    fn non_numeric_amounts_count_as_zero() {
        let records = vec![
            record(2, "Everyday", "2025-01-01", "oops", "0.00"),
            record(3, "Everyday", "2025-01-02", "10.00", "10.00"),
        ];
        let results = reconcile(&records);
        assert_eq!(results[0].sheet_balance, Decimal::new(1000, 2));
        assert!(results[0].is_ok());
    }

    #[test]
    fn accounts_are_reported_separately_and_sorted() {
        let records = vec![
            record(2, "Savings", "2025-01-01", "1.00", "1.00"),
            record(3, "Everyday", "2025-01-01", "2.00", "2.00"),
            record(4, "", "2025-01-01", "3.00", "3.00"),
        ];
        let results = reconcile(&records);
        let accounts: Vec<&str> = results.iter().map(|r| r.account.as_str()).collect();
        assert_eq!(accounts, vec!["Everyday", "Savings", "unknown"]);
        assert!(results.iter().all(ReconciliationResult::is_ok));
    }
}
