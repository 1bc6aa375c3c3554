//! Send/receive/own checks over a compiled client policy.
//!
//! Rules are in configuration order, so the last rule that applies wins.
//! Every scan runs to the end of the list and starts from deny.

use buspolicy_core::{ConnectionId, MessageView, RuleMatch};

use super::client::ClientPolicy;
use crate::registry::ServiceRegistry;

impl ClientPolicy {
    /// May this connection send `message`?
    ///
    /// `receiver` is `None` when the message is addressed to the bus itself;
    /// destination selectors are then compared against the message's declared
    /// destination text instead of live service ownership.
    pub fn check_can_send(
        &self,
        registry: &dyn ServiceRegistry,
        receiver: Option<ConnectionId>,
        message: &dyn MessageView,
    ) -> bool {
        let mut allowed = false;

        for rule in self.rules() {
            let RuleMatch::Send { message_name, destination } = rule.matcher() else {
                continue;
            };

            if let Some(name) = message_name {
                if !message.has_name(name) {
                    tracing::trace!(rule = %rule, "skipping rule for different message name");
                    continue;
                }
            }

            if let Some(dest) = destination {
                let hit = match receiver {
                    None => message.has_destination(dest),
                    Some(conn) => peer_owns(registry, dest, conn),
                };
                if !hit {
                    tracing::trace!(rule = %rule, dest = %dest, "skipping rule for different destination");
                    continue;
                }
            }

            allowed = rule.allow();
            tracing::trace!(rule = %rule, allowed, "used rule");
        }

        allowed
    }

    /// May this connection receive `message`?
    ///
    /// `sender` is `None` for messages the bus itself emits; origin selectors
    /// are then compared against the message's declared sender text.
    pub fn check_can_receive(
        &self,
        registry: &dyn ServiceRegistry,
        sender: Option<ConnectionId>,
        message: &dyn MessageView,
    ) -> bool {
        let mut allowed = false;

        for rule in self.rules() {
            let RuleMatch::Receive { message_name, origin } = rule.matcher() else {
                continue;
            };

            if let Some(name) = message_name {
                if !message.has_name(name) {
                    tracing::trace!(rule = %rule, "skipping rule for different message name");
                    continue;
                }
            }

            if let Some(origin) = origin {
                let hit = match sender {
                    None => message.has_sender(origin),
                    Some(conn) => peer_owns(registry, origin, conn),
                };
                if !hit {
                    tracing::trace!(rule = %rule, origin = %origin, "skipping rule for different origin");
                    continue;
                }
            }

            allowed = rule.allow();
            tracing::trace!(rule = %rule, allowed, "used rule");
        }

        allowed
    }

    /// May `candidate` take ownership of `service_name`?
    pub fn check_can_own(&self, candidate: ConnectionId, service_name: &str) -> bool {
        let mut allowed = false;

        for rule in self.rules() {
            let RuleMatch::Own { service_name: wanted } = rule.matcher() else {
                continue;
            };
            if wanted.as_deref().is_some_and(|w| w != service_name) {
                continue;
            }
            allowed = rule.allow();
        }

        tracing::trace!(conn = candidate.0, service = %service_name, allowed, "own check");
        allowed
    }
}

/// Service must exist and `conn` must be among its owners.
fn peer_owns(registry: &dyn ServiceRegistry, service: &str, conn: ConnectionId) -> bool {
    if !registry.is_registered(service) {
        tracing::trace!(service = %service, "service does not exist");
        return false;
    }
    registry.has_owner(service, conn)
}
