//! Policy store: default, mandatory, per-uid and per-gid rule containers.

use std::collections::HashMap;
use std::sync::Arc;

use buspolicy_core::error::{BusPolicyError, Result};
use buspolicy_core::{Gid, RuleRef, Uid};

use crate::identity::IdentityResolver;

/// All rules of one bus configuration.
///
/// Containers hold shared handles; appending or merging never copies a rule.
/// Built at startup or reload, then read-only. Reload swaps the whole store.
#[derive(Debug, Default)]
pub struct PolicyStore {
    default_rules: Vec<RuleRef>,
    mandatory_rules: Vec<RuleRef>,
    rules_by_uid: HashMap<Uid, Vec<RuleRef>>,
    rules_by_gid: HashMap<Gid, Vec<RuleRef>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_default(&mut self, rule: &RuleRef) -> Result<()> {
        push_ref(&mut self.default_rules, rule, "default rules")
    }

    pub fn append_mandatory(&mut self, rule: &RuleRef) -> Result<()> {
        push_ref(&mut self.mandatory_rules, rule, "mandatory rules")
    }

    pub fn append_for_uid(&mut self, uid: Uid, rule: &RuleRef) -> Result<()> {
        let list = bucket(&mut self.rules_by_uid, uid, "uid buckets")?;
        push_ref(list, rule, "uid rules")
    }

    pub fn append_for_gid(&mut self, gid: Gid, rule: &RuleRef) -> Result<()> {
        let list = bucket(&mut self.rules_by_gid, gid, "gid buckets")?;
        push_ref(list, rule, "gid rules")
    }

    /// Absorb `other`'s rules after this store's own, sharing the handles.
    ///
    /// Not atomic: a resource failure part way through leaves the lists that
    /// were already extended in place. Only call this while composing
    /// configuration, never on a store that connections are evaluated against.
    pub fn merge(&mut self, other: &PolicyStore) -> Result<()> {
        extend_refs(&mut self.default_rules, &other.default_rules, "default rules")?;
        extend_refs(&mut self.mandatory_rules, &other.mandatory_rules, "mandatory rules")?;
        merge_buckets(&mut self.rules_by_uid, &other.rules_by_uid, "uid buckets")?;
        merge_buckets(&mut self.rules_by_gid, &other.rules_by_gid, "gid buckets")?;
        Ok(())
    }

    /// Whether the bus accepts connections from `uid` at all.
    ///
    /// Only User/Group rules of the default then mandatory lists take part.
    /// Failing to resolve the uid's groups rejects the user.
    pub fn allow_user(&self, identity: &dyn IdentityResolver, uid: Uid) -> bool {
        let group_ids = match identity.groups_of(uid) {
            Ok(g) => g,
            Err(e) => {
                tracing::debug!(uid, error = %e, "did not get any groups for uid");
                return false;
            }
        };

        let mut allowed = false;
        allowed = list_allows_user(allowed, &self.default_rules, uid, &group_ids);
        allowed = list_allows_user(allowed, &self.mandatory_rules, uid, &group_ids);

        tracing::debug!(uid, allowed, "user gate evaluated");
        allowed
    }

    pub fn default_rules(&self) -> &[RuleRef] {
        &self.default_rules
    }

    pub fn mandatory_rules(&self) -> &[RuleRef] {
        &self.mandatory_rules
    }

    pub fn rules_for_uid(&self, uid: Uid) -> Option<&[RuleRef]> {
        self.rules_by_uid.get(&uid).map(Vec::as_slice)
    }

    pub fn rules_for_gid(&self, gid: Gid) -> Option<&[RuleRef]> {
        self.rules_by_gid.get(&gid).map(Vec::as_slice)
    }

    pub fn uid_bucket_count(&self) -> usize {
        self.rules_by_uid.len()
    }

    pub fn gid_bucket_count(&self) -> usize {
        self.rules_by_gid.len()
    }
}

fn push_ref(list: &mut Vec<RuleRef>, rule: &RuleRef, what: &str) -> Result<()> {
    list.try_reserve(1).map_err(|e| BusPolicyError::oom(what, e))?;
    list.push(Arc::clone(rule));
    Ok(())
}

/// Reserve for the whole batch first so a failure appends nothing.
fn extend_refs(list: &mut Vec<RuleRef>, from: &[RuleRef], what: &str) -> Result<()> {
    list.try_reserve(from.len()).map_err(|e| BusPolicyError::oom(what, e))?;
    list.extend(from.iter().cloned());
    Ok(())
}

fn bucket<'a, K>(map: &'a mut HashMap<K, Vec<RuleRef>>, id: K, what: &str) -> Result<&'a mut Vec<RuleRef>>
where
    K: std::hash::Hash + Eq,
{
    if !map.contains_key(&id) {
        map.try_reserve(1).map_err(|e| BusPolicyError::oom(what, e))?;
    }
    Ok(map.entry(id).or_default())
}

fn merge_buckets(
    dest: &mut HashMap<u32, Vec<RuleRef>>,
    from: &HashMap<u32, Vec<RuleRef>>,
    what: &str,
) -> Result<()> {
    for (id, list) in from {
        let target = bucket(dest, *id, what)?;
        extend_refs(target, list, what)?;
    }
    Ok(())
}

fn list_allows_user(def: bool, list: &[RuleRef], uid: Uid, group_ids: &[Gid]) -> bool {
    list.iter()
        .filter(|r| r.matches_identity(uid, group_ids))
        .fold(def, |_, r| r.allow())
}
