use regex::Regex;
use rust_decimal::Decimal;

/// Comparison operator for a rule's amount constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl Comparator {
    fn from_symbol(symbol: &str) -> Option<Comparator> {
        match symbol {
            ">" => Some(Comparator::Gt),
            ">=" => Some(Comparator::Ge),
            "<" => Some(Comparator::Lt),
            "<=" => Some(Comparator::Le),
            "=" | "==" => Some(Comparator::Eq),
            _ => None,
        }
    }

    fn test(self, lhs: Decimal, rhs: Decimal) -> bool {
        match self {
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Eq => lhs == rhs,
        }
    }
}

/// A rule's numeric constraint: either a single comparison against a
/// threshold, or a set of accepted exact values.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountCondition {
    Comparison { op: Comparator, threshold: Decimal },
    AnyOf(Vec<Decimal>),
}

/// Phrase synonyms, most specific first so no prefix of a longer phrase is
/// replaced before the longer phrase gets its turn ("no more than" must win
/// over "more than").
const PHRASE_OPS: [(&str, &str); 11] = [
    ("greater than or equal to", ">="),
    ("less than or equal to", "<="),
    ("no more than", "<="),
    ("no less than", ">="),
    ("at least", ">="),
    ("at most", "<="),
    ("greater than", ">"),
    ("less than", "<"),
    ("more than", ">"),
    ("fewer than", "<"),
    ("equal to", "="),
];

impl AmountCondition {
    /// Parse a free-text amount constraint, e.g. `">= 10"`,
    /// `"at most 20 dollars"`, `"0 or $-0"`.
    ///
    /// Anything unparsable yields `None`: the rule then matches on its
    /// pattern alone. This permissive default is intentional — the text
    /// comes from a hand-edited sheet.
    pub fn parse(raw: &str) -> Option<AmountCondition> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        let mut normalized = text.to_lowercase();
        for (phrase, symbol) in PHRASE_OPS {
            normalized = normalized.replace(phrase, symbol);
        }
        normalized = normalized
            .replace("dollars", "")
            .replace("dollar", "")
            .replace("nz$", "$")
            .replace("nzd", "")
            .replace(',', "");
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        // "a or b or c" — every side must be a bare numeric literal.
        let or_re = Regex::new(r"\bor\b").ok()?;
        if or_re.is_match(&normalized) {
            let parts: Vec<&str> = or_re
                .split(&normalized)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            if !parts.is_empty() {
                let values: Vec<Option<Decimal>> =
                    parts.iter().map(|part| parse_numeric_literal(part)).collect();
                if values.iter().all(Option::is_some) {
                    return Some(AmountCondition::AnyOf(
                        values.into_iter().flatten().collect(),
                    ));
                }
            }
        }

        // A lone numeric literal is an exact-match condition.
        if let Some(value) = parse_numeric_literal(&normalized) {
            return Some(AmountCondition::AnyOf(vec![value]));
        }

        let condensed: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
        let cmp_re = Regex::new(r"(>=|<=|>|<|==|=)\$?(-?\d+(?:\.\d+)?)").ok()?;
        let caps = cmp_re.captures(&condensed)?;
        let op = Comparator::from_symbol(caps.get(1)?.as_str())?;
        let threshold: Decimal = caps.get(2)?.as_str().parse().ok()?;
        Some(AmountCondition::Comparison { op, threshold })
    }

    /// Sign is deliberately ignored: the transaction amount and the rule's
    /// values are both compared by absolute value.
    pub fn matches(&self, amount: Decimal) -> bool {
        let abs_amount = amount.abs();
        match self {
            AmountCondition::AnyOf(values) => values.iter().any(|v| abs_amount == v.abs()),
            AmountCondition::Comparison { op, threshold } => {
                op.test(abs_amount, threshold.abs())
            }
        }
    }
}

fn parse_numeric_literal(text: &str) -> Option<Decimal> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let re = Regex::new(r"^\$?(-?\d+(?:\.\d+)?)$").ok()?;
    let caps = re.captures(&cleaned)?;
    caps.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parses_symbolic_comparison() {
        let cond = AmountCondition::parse("> 10").unwrap();
        assert_eq!(
            cond,
            AmountCondition::Comparison { op: Comparator::Gt, threshold: dec("10") }
        );
    }

    #[test]
    fn phrase_and_symbol_forms_are_equivalent() {
        let phrased = AmountCondition::parse("at least 20 dollars").unwrap();
        let symbolic = AmountCondition::parse(">=20").unwrap();
        assert_eq!(phrased, symbolic);
    }

    #[test]
    fn longest_phrase_wins_over_its_suffix() {
        // "no more than" must not be mangled by the "more than" replacement.
        let cond = AmountCondition::parse("no more than 20").unwrap();
        assert_eq!(
            cond,
            AmountCondition::Comparison { op: Comparator::Le, threshold: dec("20") }
        );
    }

    #[test]
    fn comparison_matches_absolute_values_symmetrically() {
        let cond = AmountCondition::parse("> 10").unwrap();
        assert!(cond.matches(dec("15")));
        assert!(cond.matches(dec("-15")));
        assert!(!cond.matches(dec("5")));
        assert!(!cond.matches(dec("-5")));
    }

    #[test]
    fn bare_literal_is_exact_match() {
        let cond = AmountCondition::parse("4.5").unwrap();
        assert!(cond.matches(dec("4.50")));
        assert!(cond.matches(dec("-4.5")));
        assert!(!cond.matches(dec("4.51")));
    }

    #[test]
    fn or_combination_accepts_each_literal() {
        let cond = AmountCondition::parse("$-2 OR -4").unwrap();
        assert!(cond.matches(dec("2")));
        assert!(cond.matches(dec("-4")));
        assert!(!cond.matches(dec("3")));
    }

    #[test]
    fn zero_or_negative_zero_accepts_only_zero() {
        let cond = AmountCondition::parse("0 or $-0").unwrap();
        assert!(cond.matches(dec("0")));
        assert!(cond.matches(dec("-0")));
        assert!(!cond.matches(dec("0.01")));
    }

    #[test]
    fn currency_tokens_are_stripped() {
        assert_eq!(
            AmountCondition::parse("greater than or equal to $10"),
            AmountCondition::parse(">= 10")
        );
        assert_eq!(AmountCondition::parse("nz$5"), AmountCondition::parse("5"));
        assert_eq!(AmountCondition::parse("nzd 25"), AmountCondition::parse("25"));
    }

    #[test]
    fn thousands_separators_are_stripped() {
        let cond = AmountCondition::parse("> 1,000").unwrap();
        assert_eq!(
            cond,
            AmountCondition::Comparison { op: Comparator::Gt, threshold: dec("1000") }
        );
    }

    #[test]
    fn double_equals_collapses_to_equals() {
        let cond = AmountCondition::parse("== 7").unwrap();
        assert_eq!(
            cond,
            AmountCondition::Comparison { op: Comparator::Eq, threshold: dec("7") }
        );
        assert!(cond.matches(dec("-7")));
    }

    #[test]
    fn negative_threshold_compares_by_absolute_value() {
        let cond = AmountCondition::parse(">= $-5").unwrap();
        assert!(cond.matches(dec("-6")));
        assert!(cond.matches(dec("5")));
        assert!(!cond.matches(dec("4.99")));
    }

    // ── failure modes ─────────────────────────────────────────────────────────

    #[test]
    fn unparsable_text_yields_no_condition() {
        assert_eq!(AmountCondition::parse("bigger than lots"), None);
        assert_eq!(AmountCondition::parse(""), None);
        assert_eq!(AmountCondition::parse("   "), None);
    }

    #[test]
    fn word_or_inside_another_word_is_not_a_separator() {
        // "organic" contains "or", but not on a word boundary; the text
        // parses as nothing rather than an OR of literals.
        assert_eq!(AmountCondition::parse("4 organic"), None);
    }

    #[test]
    fn or_with_one_unparsable_side_falls_through() {
        // "ten" is not a literal, so OR-mode is abandoned entirely.
        assert_eq!(AmountCondition::parse("5 or ten"), None);
    }
}
