use std::collections::{HashMap, HashSet};

use kahu_core::{StoredRecord, TRANSACTION_HEADERS};

/// The mutation plan produced by one diff pass.
///
/// The three sets are disjoint. Application order is inserts, then updates,
/// then deletes — deletes strictly in the descending position order held
/// here, so physical removal never shifts a position that is still pending.
#[derive(Debug, Default, Clone)]
pub struct SyncPlan {
    pub inserts: Vec<Vec<String>>,
    pub updates: Vec<(usize, Vec<String>)>,
    pub deletes: Vec<usize>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Human-readable description of the planned mutations — the dry-run
    /// output, one action per line.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.inserts.is_empty() {
            lines.push(format!("append {} new row(s)", self.inserts.len()));
        }
        if !self.updates.is_empty() {
            lines.push(format!("update {} existing row(s)", self.updates.len()));
        }
        if !self.deletes.is_empty() {
            lines.push(format!("delete {} orphaned row(s)", self.deletes.len()));
        }
        if lines.is_empty() {
            lines.push("no sheet mutations are required".to_string());
        }
        lines
    }
}

/// Diff freshly fetched, rendered rows against the stored records.
///
/// Fetched ids unseen in the store become inserts; seen ids whose rendered
/// row differs in any column become updates at the stored position; stored
/// rows with a non-empty id that no fetched row claimed become deletes.
/// Re-running with identical inputs therefore produces an empty plan.
pub fn plan_sync(stored: &[StoredRecord], fetched: &[(String, Vec<String>)]) -> SyncPlan {
    let stored_by_id: HashMap<&str, &StoredRecord> = stored
        .iter()
        .filter(|record| !record.id().is_empty())
        .map(|record| (record.id(), record))
        .collect();

    let mut plan = SyncPlan::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for (id, row) in fetched {
        seen.insert(id.as_str());
        match stored_by_id.get(id.as_str()) {
            None => plan.inserts.push(row.clone()),
            Some(record) => {
                if needs_update(record, row) {
                    plan.updates.push((record.row_index, row.clone()));
                }
            }
        }
    }

    plan.deletes = stored
        .iter()
        .filter(|record| !record.id().is_empty() && !seen.contains(record.id()))
        .map(|record| record.row_index)
        .collect();
    plan.deletes.sort_unstable_by(|a, b| b.cmp(a));

    plan
}

fn needs_update(record: &StoredRecord, new_row: &[String]) -> bool {
    TRANSACTION_HEADERS
        .iter()
        .zip(new_row)
        .any(|(header, value)| record.get(header) != value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A full-width row with recognisable id and amount cells.
    fn row(id: &str, amount: &str) -> Vec<String> {
        vec![
            id.to_string(),
            "2025-02-01".to_string(),
            "Everyday".to_string(),
            amount.to_string(),
            "".to_string(),
            "desc".to_string(),
            "merchant".to_string(),
            "Uncategorised".to_string(),
            "".to_string(),
            "FALSE".to_string(),
            "akahu_bnz".to_string(),
            "2025-02-02T00:00:00+00:00".to_string(),
        ]
    }

    fn stored(row_index: usize, cells: Vec<String>) -> StoredRecord {
        StoredRecord::from_cells(row_index, cells)
    }

    fn fetched(id: &str, amount: &str) -> (String, Vec<String>) {
        (id.to_string(), row(id, amount))
    }

    #[test]
    fn new_id_becomes_insert() {
        let stored_rows = vec![stored(2, row("A", "10.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "10.00"), fetched("B", "5.00")]);
        assert_eq!(plan.inserts, vec![row("B", "5.00")]);
        assert!(plan.updates.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn changed_column_becomes_update_at_stored_position() {
        let stored_rows = vec![stored(7, row("A", "10.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "12.00")]);
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates, vec![(7, row("A", "12.00"))]);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn identical_row_is_a_noop() {
        let stored_rows = vec![stored(2, row("A", "10.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "10.00")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn unseen_stored_id_becomes_delete() {
        let stored_rows = vec![stored(2, row("A", "10.00")), stored(4, row("C", "3.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "10.00")]);
        assert!(plan.inserts.is_empty());
        assert!(plan.updates.is_empty());
        assert_eq!(plan.deletes, vec![4]);
    }

    #[test]
    fn deletes_are_emitted_in_descending_position_order() {
        let stored_rows = vec![
            stored(2, row("A", "1.00")),
            stored(3, row("B", "2.00")),
            stored(5, row("C", "3.00")),
        ];
        let plan = plan_sync(&stored_rows, &[]);
        assert_eq!(plan.deletes, vec![5, 3, 2]);
    }

    #[test]
    fn rows_without_id_are_never_deleted_or_matched() {
        let stored_rows = vec![stored(2, row("", "1.00")), stored(3, row("A", "2.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "2.00")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn second_run_on_applied_state_is_empty() {
        let first = plan_sync(&[], &[fetched("A", "1.00"), fetched("B", "2.00")]);
        assert_eq!(first.inserts.len(), 2);

        // Pretend the inserts were applied at positions 2 and 3.
        let stored_rows = vec![
            stored(2, first.inserts[0].clone()),
            stored(3, first.inserts[1].clone()),
        ];
        let second = plan_sync(&stored_rows, &[fetched("A", "1.00"), fetched("B", "2.00")]);
        assert!(second.is_empty());
    }

    #[test]
    fn mixed_plan_keeps_sets_disjoint() {
        let stored_rows = vec![
            stored(2, row("A", "10.00")),
            stored(3, row("B", "5.00")),
            stored(4, row("C", "1.00")),
        ];
        let plan = plan_sync(
            &stored_rows,
            &[fetched("A", "10.00"), fetched("B", "6.00"), fetched("D", "9.00")],
        );
        assert_eq!(plan.inserts, vec![row("D", "9.00")]);
        assert_eq!(plan.updates, vec![(3, row("B", "6.00"))]);
        assert_eq!(plan.deletes, vec![4]);
    }

    #[test]
    fn summary_reports_each_action() {
        let stored_rows = vec![stored(2, row("A", "10.00")), stored(3, row("B", "5.00"))];
        let plan = plan_sync(&stored_rows, &[fetched("A", "11.00"), fetched("N", "1.00")]);
        let summary = plan.summary();
        assert!(summary.contains(&"append 1 new row(s)".to_string()));
        assert!(summary.contains(&"update 1 existing row(s)".to_string()));
        assert!(summary.contains(&"delete 1 orphaned row(s)".to_string()));
    }

    #[test]
    fn summary_reports_noop_plan() {
        let plan = plan_sync(&[], &[]);
        assert_eq!(plan.summary(), vec!["no sheet mutations are required".to_string()]);
    }
}
