//! Policy rules: one allow/deny decision plus type-specific match criteria.
//!
//! A rule is built once by the configuration front-end and then shared by
//! reference ([`RuleRef`]) between every container that lists it: the store
//! sequences, per-identity buckets, merged stores, and compiled client
//! policies. Payload is immutable once the rule is wrapped; the reference
//! count is the `Arc` strong count.

use std::fmt;
use std::sync::Arc;

/// Local user id.
pub type Uid = u32;
/// Local group id.
pub type Gid = u32;

/// Shared handle to an immutable rule.
pub type RuleRef = Arc<Rule>;

/// Rule kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    User,
    Group,
    Send,
    Receive,
    Own,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::User => "user",
            RuleKind::Group => "group",
            RuleKind::Send => "send",
            RuleKind::Receive => "receive",
            RuleKind::Own => "own",
        }
    }

    /// Send/Receive/Own rules end up in compiled client policies.
    /// User/Group rules only gate whether a uid may connect at all.
    pub fn is_per_connection(self) -> bool {
        matches!(self, RuleKind::Send | RuleKind::Receive | RuleKind::Own)
    }
}

/// Match criteria. `None` in any field is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    Send {
        message_name: Option<String>,
        destination: Option<String>,
    },
    Receive {
        message_name: Option<String>,
        origin: Option<String>,
    },
    Own {
        service_name: Option<String>,
    },
    User {
        uid: Option<Uid>,
    },
    Group {
        gid: Option<Gid>,
    },
}

impl RuleMatch {
    /// Fully wildcarded payload for `kind`.
    pub fn any(kind: RuleKind) -> Self {
        match kind {
            RuleKind::Send => RuleMatch::Send { message_name: None, destination: None },
            RuleKind::Receive => RuleMatch::Receive { message_name: None, origin: None },
            RuleKind::Own => RuleMatch::Own { service_name: None },
            RuleKind::User => RuleMatch::User { uid: None },
            RuleKind::Group => RuleMatch::Group { gid: None },
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleMatch::Send { .. } => RuleKind::Send,
            RuleMatch::Receive { .. } => RuleKind::Receive,
            RuleMatch::Own { .. } => RuleKind::Own,
            RuleMatch::User { .. } => RuleKind::User,
            RuleMatch::Group { .. } => RuleKind::Group,
        }
    }
}

/// One allow/deny decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    allow: bool,
    matcher: RuleMatch,
}

impl Rule {
    /// Rule of `kind` with every selector wildcarded.
    pub fn new(kind: RuleKind, allow: bool) -> Self {
        Self { allow, matcher: RuleMatch::any(kind) }
    }

    pub fn from_match(allow: bool, matcher: RuleMatch) -> Self {
        Self { allow, matcher }
    }

    pub fn send(allow: bool, message_name: Option<&str>, destination: Option<&str>) -> Self {
        Self::from_match(
            allow,
            RuleMatch::Send {
                message_name: message_name.map(str::to_owned),
                destination: destination.map(str::to_owned),
            },
        )
    }

    pub fn receive(allow: bool, message_name: Option<&str>, origin: Option<&str>) -> Self {
        Self::from_match(
            allow,
            RuleMatch::Receive {
                message_name: message_name.map(str::to_owned),
                origin: origin.map(str::to_owned),
            },
        )
    }

    pub fn own(allow: bool, service_name: Option<&str>) -> Self {
        Self::from_match(allow, RuleMatch::Own { service_name: service_name.map(str::to_owned) })
    }

    pub fn user(allow: bool, uid: Option<Uid>) -> Self {
        Self::from_match(allow, RuleMatch::User { uid })
    }

    pub fn group(allow: bool, gid: Option<Gid>) -> Self {
        Self::from_match(allow, RuleMatch::Group { gid })
    }

    /// Wrap into a shared handle (reference count 1).
    pub fn into_ref(self) -> RuleRef {
        Arc::new(self)
    }

    pub fn kind(&self) -> RuleKind {
        self.matcher.kind()
    }

    pub fn allow(&self) -> bool {
        self.allow
    }

    pub fn matcher(&self) -> &RuleMatch {
        &self.matcher
    }

    /// True when every selector field is a wildcard.
    pub fn is_blanket(&self) -> bool {
        match &self.matcher {
            RuleMatch::Send { message_name, destination } => {
                message_name.is_none() && destination.is_none()
            }
            RuleMatch::Receive { message_name, origin } => {
                message_name.is_none() && origin.is_none()
            }
            RuleMatch::Own { service_name } => service_name.is_none(),
            RuleMatch::User { uid } => uid.is_none(),
            RuleMatch::Group { gid } => gid.is_none(),
        }
    }

    /// Identity match for User/Group rules. Other kinds never match.
    pub fn matches_identity(&self, uid: Uid, group_ids: &[Gid]) -> bool {
        match &self.matcher {
            RuleMatch::User { uid: None } | RuleMatch::Group { gid: None } => true,
            RuleMatch::User { uid: Some(want) } => *want == uid,
            RuleMatch::Group { gid: Some(want) } => group_ids.contains(want),
            _ => false,
        }
    }
}

fn field(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("*")
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = if self.allow { "allow" } else { "deny" };
        match &self.matcher {
            RuleMatch::Send { message_name, destination } => write!(
                f,
                "{effect} send(name={}, destination={})",
                field(message_name),
                field(destination)
            ),
            RuleMatch::Receive { message_name, origin } => write!(
                f,
                "{effect} receive(name={}, origin={})",
                field(message_name),
                field(origin)
            ),
            RuleMatch::Own { service_name } => {
                write!(f, "{effect} own(service={})", field(service_name))
            }
            RuleMatch::User { uid: Some(uid) } => write!(f, "{effect} user({uid})"),
            RuleMatch::User { uid: None } => write!(f, "{effect} user(*)"),
            RuleMatch::Group { gid: Some(gid) } => write!(f, "{effect} group({gid})"),
            RuleMatch::Group { gid: None } => write!(f, "{effect} group(*)"),
        }
    }
}
