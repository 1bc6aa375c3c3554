//! Identity collaborator: uid -> group list.

use std::collections::HashMap;

use buspolicy_core::error::{BusPolicyError, Result};
use buspolicy_core::{Gid, Uid};

use crate::config::UserEntry;

/// Resolves the group membership of a local user.
pub trait IdentityResolver: Send + Sync {
    fn groups_of(&self, uid: Uid) -> Result<Vec<Gid>>;
}

/// In-memory user database, usually loaded from the `users` config section.
#[derive(Debug, Default, Clone)]
pub struct StaticUserDatabase {
    users: HashMap<Uid, Vec<Gid>>,
}

impl StaticUserDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[UserEntry]) -> Self {
        let mut db = Self::new();
        for u in entries {
            db.insert(u.uid, u.groups.clone());
        }
        db
    }

    /// Replaces any previous group list for `uid`.
    pub fn insert(&mut self, uid: Uid, groups: Vec<Gid>) {
        self.users.insert(uid, groups);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityResolver for StaticUserDatabase {
    fn groups_of(&self, uid: Uid) -> Result<Vec<Gid>> {
        self.users
            .get(&uid)
            .cloned()
            .ok_or_else(|| BusPolicyError::GroupResolution(format!("unknown uid {uid}")))
    }
}
