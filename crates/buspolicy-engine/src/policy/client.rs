//! Per-connection compiled policy.

use buspolicy_core::error::{BusPolicyError, Result};
use buspolicy_core::{Gid, RuleRef, Uid};

use super::optimize::optimize;
use super::store::PolicyStore;
use crate::identity::IdentityResolver;

/// Ordered rule list for one authenticated connection.
///
/// Compiled once at accept time and immutable afterwards, so it can be read
/// from several evaluation contexts without locking. Holds its own handle to
/// every rule, so it outlives a store swap.
#[derive(Debug, Default, Clone)]
pub struct ClientPolicy {
    rules: Vec<RuleRef>,
}

impl ClientPolicy {
    /// Compile the policy for a connection running as `uid`.
    ///
    /// Precedence, lowest first: default rules, per-group buckets (in the
    /// order `identity` reports the groups), the uid bucket, mandatory rules.
    /// Groups are only resolved when the store has group buckets; a failed
    /// group lookup is treated as no groups. A missing uid is a hard error.
    pub fn compile(
        store: &PolicyStore,
        uid: Option<Uid>,
        identity: &dyn IdentityResolver,
    ) -> Result<Self> {
        let uid = uid.ok_or_else(|| {
            BusPolicyError::IdentityUnavailable(
                "no user id known for connection, cannot determine security policy".into(),
            )
        })?;

        let group_ids = if store.gid_bucket_count() > 0 {
            identity.groups_of(uid).unwrap_or_else(|e| {
                tracing::warn!(uid, error = %e, "group lookup failed; compiling without group rules");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Self::compile_resolved(store, uid, &group_ids)
    }

    /// Compile with an already-resolved group list.
    pub fn compile_resolved(store: &PolicyStore, uid: Uid, group_ids: &[Gid]) -> Result<Self> {
        let mut rules = Vec::new();

        add_per_connection(&mut rules, store.default_rules())?;

        if store.gid_bucket_count() > 0 {
            for gid in group_ids {
                if let Some(list) = store.rules_for_gid(*gid) {
                    add_per_connection(&mut rules, list)?;
                }
            }
        }

        if let Some(list) = store.rules_for_uid(uid) {
            add_per_connection(&mut rules, list)?;
        }

        add_per_connection(&mut rules, store.mandatory_rules())?;

        let before = rules.len();
        let rules = optimize(rules);
        tracing::debug!(uid, groups = group_ids.len(), before, after = rules.len(), "client policy compiled");

        Ok(Self { rules })
    }

    /// Wrap an ordered list as-is, without pruning.
    pub fn from_rules(rules: Vec<RuleRef>) -> Self {
        Self { rules }
    }

    /// Same policy with dead rules pruned.
    pub fn optimized(self) -> Self {
        Self { rules: optimize(self.rules) }
    }

    pub fn rules(&self) -> &[RuleRef] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Append the Send/Receive/Own entries of `list`. On failure the partially
/// built `rules` is dropped by the caller, releasing every handle taken.
fn add_per_connection(rules: &mut Vec<RuleRef>, list: &[RuleRef]) -> Result<()> {
    let extra = list.iter().filter(|r| r.kind().is_per_connection()).count();
    rules
        .try_reserve(extra)
        .map_err(|e| BusPolicyError::oom("client policy", e))?;
    rules.extend(list.iter().filter(|r| r.kind().is_per_connection()).cloned());
    Ok(())
}
