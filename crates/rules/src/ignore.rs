use kahu_core::{Transaction, TxnField};
use regex::{Regex, RegexBuilder};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IgnoreRuleError {
    #[error("ignore rule pattern {pattern:?} failed to compile: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Raw ignore rule as written in config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreRuleSpec {
    pub pattern: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub min_amount: Option<f64>,
    #[serde(default)]
    pub max_amount: Option<f64>,
}

/// A compiled exclusion rule. Matching transactions are dropped before
/// categorisation and never reach the sheet.
#[derive(Debug)]
pub struct IgnoreRule {
    field: TxnField,
    regex: Regex,
    min_amount: Option<Decimal>,
    max_amount: Option<Decimal>,
}

impl IgnoreRule {
    fn matches(&self, tx: &Transaction) -> bool {
        if !self.regex.is_match(&tx.field(self.field)) {
            return false;
        }
        // Bounds are signed, unlike category amount conditions.
        if let Some(min) = self.min_amount {
            if tx.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if tx.amount > max {
                return false;
            }
        }
        true
    }
}

/// Compile config-sourced ignore rules.
///
/// Specs with empty patterns are skipped. A pattern that fails to compile
/// is a configuration error: ignore rules are operator-authored, so a typo
/// aborts the run rather than silently letting transactions through.
pub fn build_ignore_rules(specs: &[IgnoreRuleSpec]) -> Result<Vec<IgnoreRule>, IgnoreRuleError> {
    let mut rules = Vec::new();
    for spec in specs {
        let pattern = spec.pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| IgnoreRuleError::BadPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let field = match spec.field.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => TxnField::parse(name),
            _ => TxnField::DescriptionRaw,
        };
        rules.push(IgnoreRule {
            field,
            regex,
            min_amount: spec.min_amount.and_then(Decimal::from_f64),
            max_amount: spec.max_amount.and_then(Decimal::from_f64),
        });
    }
    Ok(rules)
}

pub fn should_ignore(tx: &Transaction, rules: &[IgnoreRule]) -> bool {
    rules.iter().any(|rule| rule.matches(tx))
}
