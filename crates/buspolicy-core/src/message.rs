//! Message accessor contract.
//!
//! The engine never parses wire messages. It only needs the raw textual
//! header fields a rule can select on, independent of any resolved
//! connection identity.

use serde::Deserialize;

/// Opaque identity of a live connection on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Raw header fields of a candidate message.
pub trait MessageView {
    /// Declared message name.
    fn name(&self) -> Option<&str>;
    /// Declared destination service.
    fn destination(&self) -> Option<&str>;
    /// Declared sender service.
    fn sender(&self) -> Option<&str>;

    /// An absent field never matches.
    fn has_name(&self, name: &str) -> bool {
        self.name() == Some(name)
    }
    fn has_destination(&self, service: &str) -> bool {
        self.destination() == Some(service)
    }
    fn has_sender(&self, service: &str) -> bool {
        self.sender() == Some(service)
    }
}

/// Plain header struct, useful for callers that already decoded a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageHeader {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub sender: Option<String>,
}

impl MessageHeader {
    pub fn named(name: &str) -> Self {
        Self { name: Some(name.to_owned()), ..Self::default() }
    }

    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.to_owned());
        self
    }

    pub fn with_sender(mut self, sender: &str) -> Self {
        self.sender = Some(sender.to_owned());
        self
    }
}

impl MessageView for MessageHeader {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
    fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }
}
