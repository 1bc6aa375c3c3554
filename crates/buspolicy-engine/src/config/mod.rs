//! Policy config loader (strict parsing).
//!
//! Turns already-validated YAML into rules and feeds them through the store's
//! append APIs. Several files compose by merging, in the order given.

pub mod schema;

use std::fs;
use std::path::Path;

use buspolicy_core::error::{BusPolicyError, Result};

use crate::identity::StaticUserDatabase;
use crate::policy::PolicyStore;

pub use schema::{BusPolicyConfig, PolicySection, RuleConfig, SectionTarget, UserEntry};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<BusPolicyConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        BusPolicyError::Internal(format!("read config failed ({}): {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<BusPolicyConfig> {
    let cfg: BusPolicyConfig = serde_yaml::from_str(s)
        .map_err(|e| BusPolicyError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Build a fresh store from one validated config.
pub fn build_store(cfg: &BusPolicyConfig) -> Result<PolicyStore> {
    let mut store = PolicyStore::new();
    for section in &cfg.policies {
        let target = section.target()?;
        for rc in &section.rules {
            let rule = rc.to_rule()?.into_ref();
            match target {
                SectionTarget::Default => store.append_default(&rule)?,
                SectionTarget::Mandatory => store.append_mandatory(&rule)?,
                SectionTarget::User(uid) => store.append_for_uid(uid, &rule)?,
                SectionTarget::Group(gid) => store.append_for_gid(gid, &rule)?,
            }
        }
    }
    Ok(store)
}

/// Store plus the user database assembled from one or more config files.
#[derive(Debug, Default)]
pub struct LoadedPolicy {
    pub store: PolicyStore,
    pub users: StaticUserDatabase,
}

/// Load and compose several config files. Later files' rules come after
/// earlier ones in every container, and later `users` entries replace
/// earlier ones for the same uid.
pub fn load_policy_files<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedPolicy> {
    let mut loaded = LoadedPolicy::default();
    for path in paths {
        let cfg = load_from_file(path)?;
        let store = build_store(&cfg)?;
        loaded.store.merge(&store)?;
        for u in &cfg.users {
            loaded.users.insert(u.uid, u.groups.clone());
        }
        tracing::debug!(path = %path.as_ref().display(), "policy file merged");
    }
    Ok(loaded)
}
