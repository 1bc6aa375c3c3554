//! Shared bus state for policy decisions.
//!
//! Holds the current store, the user database, the service table, and the
//! compiled policy of every accepted connection. Reload replaces the store
//! wholesale; connections accepted earlier keep the policy compiled for
//! them, since it holds its own rule handles.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use buspolicy_core::error::{BusPolicyError, Result};
use buspolicy_core::{ConnectionId, MessageView, Uid};

use crate::identity::IdentityResolver;
use crate::policy::{ClientPolicy, PolicyStore};
use crate::registry::ServiceTable;

#[derive(Clone)]
pub struct BusContext {
    inner: Arc<BusContextInner>,
}

struct BusContextInner {
    store: RwLock<Arc<PolicyStore>>,
    identity: Arc<dyn IdentityResolver>,
    services: ServiceTable,
    connections: DashMap<ConnectionId, Arc<ClientPolicy>>,
}

impl BusContext {
    pub fn new(store: PolicyStore, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            inner: Arc::new(BusContextInner {
                store: RwLock::new(Arc::new(store)),
                identity,
                services: ServiceTable::new(),
                connections: DashMap::new(),
            }),
        }
    }

    /// Snapshot of the current store.
    pub fn store(&self) -> Arc<PolicyStore> {
        // Poisoning only means a writer panicked mid-swap; the Arc inside is still whole.
        match self.inner.store.read() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a freshly built store. In-flight evaluations keep the old one.
    pub fn reload(&self, store: PolicyStore) {
        let store = Arc::new(store);
        match self.inner.store.write() {
            Ok(mut g) => *g = store,
            Err(poisoned) => *poisoned.into_inner() = store,
        }
        tracing::info!(connections = self.inner.connections.len(), "policy store reloaded");
    }

    pub fn services(&self) -> &ServiceTable {
        &self.inner.services
    }

    /// Gate the uid, then compile and record the connection's policy.
    pub fn accept_connection(&self, conn: ConnectionId, uid: Option<Uid>) -> Result<Arc<ClientPolicy>> {
        let store = self.store();
        let identity = self.inner.identity.as_ref();

        let uid_known = uid.ok_or_else(|| {
            BusPolicyError::IdentityUnavailable(format!("no user id known for connection {}", conn.0))
        })?;
        if !store.allow_user(identity, uid_known) {
            tracing::info!(conn = conn.0, uid = uid_known, "connection rejected by user policy");
            return Err(BusPolicyError::AccessDenied(format!("uid {uid_known} may not connect")));
        }

        let policy = Arc::new(ClientPolicy::compile(&store, uid, identity)?);
        self.inner.connections.insert(conn, Arc::clone(&policy));
        tracing::debug!(conn = conn.0, uid = uid_known, rules = policy.len(), "connection accepted");
        Ok(policy)
    }

    /// Drop the connection's policy and every service it held.
    pub fn close_connection(&self, conn: ConnectionId) {
        self.inner.connections.remove(&conn);
        let released = self.inner.services.release_all(conn);
        tracing::debug!(conn = conn.0, released = released.len(), "connection closed");
    }

    pub fn client_policy(&self, conn: ConnectionId) -> Option<Arc<ClientPolicy>> {
        self.inner.connections.get(&conn).map(|p| Arc::clone(p.value()))
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Full routing check for one message.
    ///
    /// `None` on either side stands for the bus itself, which is not subject
    /// to policy. A connection id with no recorded policy is denied.
    pub fn check_security_policy(
        &self,
        sender: Option<ConnectionId>,
        receiver: Option<ConnectionId>,
        message: &dyn MessageView,
    ) -> bool {
        let services = &self.inner.services;

        if let Some(s) = sender {
            let Some(policy) = self.client_policy(s) else {
                tracing::debug!(conn = s.0, "sender has no policy");
                return false;
            };
            if !policy.check_can_send(services, receiver, message) {
                tracing::debug!(conn = s.0, "send denied by sender policy");
                return false;
            }
        }

        if let Some(r) = receiver {
            let Some(policy) = self.client_policy(r) else {
                tracing::debug!(conn = r.0, "receiver has no policy");
                return false;
            };
            if !policy.check_can_receive(services, sender, message) {
                tracing::debug!(conn = r.0, "receive denied by receiver policy");
                return false;
            }
        }

        true
    }

    /// Policy check, then ownership. Returns true when `conn` is now the primary owner.
    pub fn request_name(&self, conn: ConnectionId, service: &str) -> Result<bool> {
        let policy = self
            .client_policy(conn)
            .ok_or(BusPolicyError::UnknownConnection(conn.0))?;
        if !policy.check_can_own(conn, service) {
            return Err(BusPolicyError::AccessDenied(format!(
                "connection {} is not allowed to own {service}",
                conn.0
            )));
        }
        Ok(self.inner.services.acquire(service, conn))
    }

    pub fn check_can_own(&self, conn: ConnectionId, service: &str) -> bool {
        self.client_policy(conn)
            .map(|p| p.check_can_own(conn, service))
            .unwrap_or(false)
    }
}
