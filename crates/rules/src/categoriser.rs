use kahu_core::{Transaction, TxnField};
use regex::{Regex, RegexBuilder};

use crate::condition::AmountCondition;

pub const DEFAULT_PRIORITY: i32 = 1000;

/// Substrings that mark a transaction as an internal transfer, checked
/// case-insensitively against both the description and the merchant name.
const TRANSFER_HINTS: [&str; 5] = ["internet xfr", "transfer", "internal", "self", "bnz"];

/// Raw rule row as read from the category tab — every column free text.
#[derive(Debug, Clone, Default)]
pub struct RuleSpec {
    pub pattern: String,
    pub field: String,
    pub category: String,
    pub category_type: String,
    pub priority: String,
    pub amount_condition: String,
}

/// A compiled categorisation rule. Lower priority numbers take precedence.
#[derive(Debug)]
pub struct CategoryRule {
    pub priority: i32,
    pub field: TxnField,
    pub category: String,
    pub category_type: String,
    pub amount_condition: Option<AmountCondition>,
    regex: Regex,
}

impl CategoryRule {
    /// The pattern is a *search*: it matches anywhere in the selected
    /// field's string value.
    fn matches(&self, tx: &Transaction) -> bool {
        if !self.regex.is_match(&tx.field(self.field)) {
            return false;
        }
        match &self.amount_condition {
            Some(condition) => condition.matches(tx.amount),
            None => true,
        }
    }
}

pub struct Categoriser {
    rules: Vec<CategoryRule>,
}

impl Categoriser {
    /// Build the rule table from raw specs.
    ///
    /// Rules with empty patterns are discarded. Priorities that fail to
    /// parse fall back to [`DEFAULT_PRIORITY`]. Patterns that fail to
    /// compile are discarded with a warning — sheet data is semi-trusted,
    /// and one bad row must not take the run down. The surviving rules are
    /// stable-sorted ascending by priority, so ties keep declaration order.
    pub fn new<I: IntoIterator<Item = RuleSpec>>(specs: I) -> Categoriser {
        let mut rules = Vec::new();
        for spec in specs {
            let pattern = spec.pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => regex,
                Err(err) => {
                    tracing::warn!("Discarding category rule with bad pattern {pattern:?}: {err}");
                    continue;
                }
            };
            let priority = spec.priority.trim().parse().unwrap_or(DEFAULT_PRIORITY);
            let field = match spec.field.trim() {
                "" => TxnField::MerchantNormalised,
                name => TxnField::parse(name),
            };
            let category = if spec.category.is_empty() {
                "Uncategorised".to_string()
            } else {
                spec.category
            };
            rules.push(CategoryRule {
                priority,
                field,
                category,
                category_type: spec.category_type,
                amount_condition: AmountCondition::parse(&spec.amount_condition),
                regex,
            });
        }
        rules.sort_by_key(|rule| rule.priority);
        Categoriser { rules }
    }

    /// First matching rule in priority order, if any.
    pub fn find_matching_rule(&self, tx: &Transaction) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.matches(tx))
    }

    /// Returns `(category, category_type)` from the winning rule, or
    /// `("Uncategorised", "")` when nothing matches.
    pub fn categorise(&self, tx: &Transaction) -> (String, String) {
        match self.find_matching_rule(tx) {
            Some(rule) => (rule.category.clone(), rule.category_type.clone()),
            None => ("Uncategorised".to_string(), String::new()),
        }
    }

    /// Heuristic internal-transfer check, independent of the rule table.
    pub fn detect_transfer(tx: &Transaction) -> bool {
        let description = tx.description_raw.to_lowercase();
        let merchant = tx.merchant_normalised.to_lowercase();
        TRANSFER_HINTS
            .iter()
            .any(|hint| description.contains(hint) || merchant.contains(hint))
    }
}
