//! Service registry collaborator.
//!
//! The policy engine only asks two questions of it; [`ServiceTable`] is the
//! in-process implementation the bus context uses.

use dashmap::DashMap;

use buspolicy_core::ConnectionId;

/// Read-only view of service ownership.
pub trait ServiceRegistry {
    /// Is `service` currently registered on the bus?
    fn is_registered(&self, service: &str) -> bool;
    /// Is `conn` one of the owners of `service`?
    fn has_owner(&self, service: &str, conn: ConnectionId) -> bool;
}

/// Service table:
/// - `service name -> owner queue` (front is the primary owner)
///
/// A service exists while its owner queue is non-empty.
#[derive(Default)]
pub struct ServiceTable {
    services: DashMap<String, Vec<ConnectionId>>,
}

impl ServiceTable {
    pub fn new() -> Self {
        Self { services: DashMap::new() }
    }

    /// Queue `conn` as an owner of `service`.
    /// Returns true when `conn` is now the primary owner.
    pub fn acquire(&self, service: &str, conn: ConnectionId) -> bool {
        let mut owners = self.services.entry(service.to_owned()).or_default();
        if !owners.contains(&conn) {
            owners.push(conn);
        }
        owners.first() == Some(&conn)
    }

    /// Remove `conn` from the owner queue; drops the service when the queue empties.
    /// Returns false when `conn` was not an owner.
    pub fn release(&self, service: &str, conn: ConnectionId) -> bool {
        let Some(mut owners) = self.services.get_mut(service) else { return false; };
        let before = owners.len();
        owners.retain(|c| *c != conn);
        let removed = owners.len() != before;
        let empty = owners.is_empty();
        drop(owners);

        if empty {
            self.services.remove_if(service, |_, o| o.is_empty());
        }
        removed
    }

    /// Drop `conn` from every service. Returns the names it owned or queued for.
    pub fn release_all(&self, conn: ConnectionId) -> Vec<String> {
        let names: Vec<String> = self
            .services
            .iter()
            .filter(|e| e.value().contains(&conn))
            .map(|e| e.key().clone())
            .collect();

        for name in &names {
            self.release(name, conn);
        }
        names
    }

    pub fn primary_owner(&self, service: &str) -> Option<ConnectionId> {
        self.services.get(service).and_then(|o| o.first().copied())
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl ServiceRegistry for ServiceTable {
    fn is_registered(&self, service: &str) -> bool {
        self.services.get(service).map(|o| !o.is_empty()).unwrap_or(false)
    }

    fn has_owner(&self, service: &str, conn: ConnectionId) -> bool {
        self.services.get(service).map(|o| o.contains(&conn)).unwrap_or(false)
    }
}
