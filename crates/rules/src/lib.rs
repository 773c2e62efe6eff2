pub mod categoriser;
pub mod condition;
pub mod ignore;

pub use categoriser::{Categoriser, CategoryRule, RuleSpec, DEFAULT_PRIORITY};
pub use condition::{AmountCondition, Comparator};
pub use ignore::{build_ignore_rules, should_ignore, IgnoreRule, IgnoreRuleError, IgnoreRuleSpec};
