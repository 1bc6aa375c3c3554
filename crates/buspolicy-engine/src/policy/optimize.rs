//! Dead-rule pruning for compiled client policies.
//!
//! A blanket rule (every selector wildcarded) matches every candidate of its
//! kind, so under last-match-wins nothing of the same kind before it can
//! change a verdict. Such rules are dropped. A later blanket rule also drops
//! earlier blanket rules of its kind.

use std::collections::HashSet;

use buspolicy_core::{RuleKind, RuleRef};

/// Remove every rule that is followed by a blanket rule of the same kind.
///
/// Only Send/Receive/Own rules trigger pruning; User/Group rules never appear
/// in compiled policies and are kept untouched if present. Relative order of
/// the surviving rules is preserved. Idempotent.
pub fn optimize(rules: Vec<RuleRef>) -> Vec<RuleRef> {
    let mut shadowed: HashSet<RuleKind> = HashSet::new();
    let mut keep = vec![false; rules.len()];

    for (i, rule) in rules.iter().enumerate().rev() {
        let kind = rule.kind();
        keep[i] = !shadowed.contains(&kind);
        if kind.is_per_connection() && rule.is_blanket() {
            shadowed.insert(kind);
        }
    }

    rules
        .into_iter()
        .zip(keep)
        .filter_map(|(rule, k)| k.then_some(rule))
        .collect()
}
