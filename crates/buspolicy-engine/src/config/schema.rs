use serde::Deserialize;
use buspolicy_core::error::{BusPolicyError, Result};
use buspolicy_core::{Gid, Rule, Uid};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusPolicyConfig {
    pub version: u32,

    #[serde(default)]
    pub users: Vec<UserEntry>,

    #[serde(default)]
    pub policies: Vec<PolicySection>,
}

impl BusPolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BusPolicyError::UnsupportedVersion);
        }
        for (i, section) in self.policies.iter().enumerate() {
            section
                .validate()
                .map_err(|e| BusPolicyError::BadConfig(format!("policies[{i}]: {e}")))?;
        }
        Ok(())
    }
}

/// Static user database entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub uid: Uid,
    #[serde(default)]
    pub groups: Vec<Gid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyContext {
    Default,
    Mandatory,
}

/// Where a section's rules land in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTarget {
    Default,
    Mandatory,
    User(Uid),
    Group(Gid),
}

/// One `policies` entry: exactly one of `context`, `user`, `group`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    #[serde(default)]
    pub context: Option<PolicyContext>,
    #[serde(default)]
    pub user: Option<Uid>,
    #[serde(default)]
    pub group: Option<Gid>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl PolicySection {
    pub fn target(&self) -> Result<SectionTarget> {
        match (self.context, self.user, self.group) {
            (Some(PolicyContext::Default), None, None) => Ok(SectionTarget::Default),
            (Some(PolicyContext::Mandatory), None, None) => Ok(SectionTarget::Mandatory),
            (None, Some(uid), None) => Ok(SectionTarget::User(uid)),
            (None, None, Some(gid)) => Ok(SectionTarget::Group(gid)),
            _ => Err(BusPolicyError::BadConfig(
                "section needs exactly one of context, user, group".into(),
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let target = self.target()?;
        for (i, rule) in self.rules.iter().enumerate() {
            let built = rule
                .to_rule()
                .map_err(|e| BusPolicyError::BadConfig(format!("rules[{i}]: {e}")))?;

            // user/group rules gate connections, not messages
            let scoped = matches!(target, SectionTarget::User(_) | SectionTarget::Group(_));
            if scoped && !built.kind().is_per_connection() {
                return Err(BusPolicyError::BadConfig(format!(
                    "rules[{i}]: {} rules are only valid in default or mandatory context",
                    built.kind().as_str()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// One rule: an effect plus exactly one selector.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub effect: Effect,
    #[serde(default)]
    pub send: Option<SendSelector>,
    #[serde(default)]
    pub receive: Option<ReceiveSelector>,
    #[serde(default)]
    pub own: Option<OwnSelector>,
    #[serde(default)]
    pub user: Option<IdSelector>,
    #[serde(default)]
    pub group: Option<IdSelector>,
}

impl RuleConfig {
    pub fn to_rule(&self) -> Result<Rule> {
        let allow = self.effect == Effect::Allow;
        let set = [
            self.send.is_some(),
            self.receive.is_some(),
            self.own.is_some(),
            self.user.is_some(),
            self.group.is_some(),
        ];
        if set.iter().filter(|s| **s).count() != 1 {
            return Err(BusPolicyError::BadConfig(
                "rule needs exactly one of send, receive, own, user, group".into(),
            ));
        }

        if let Some(s) = &self.send {
            let name = non_empty("send.message_name", &s.message_name)?;
            let dest = non_empty("send.destination", &s.destination)?;
            return Ok(Rule::send(allow, name, dest));
        }
        if let Some(r) = &self.receive {
            let name = non_empty("receive.message_name", &r.message_name)?;
            let origin = non_empty("receive.origin", &r.origin)?;
            return Ok(Rule::receive(allow, name, origin));
        }
        if let Some(o) = &self.own {
            return Ok(Rule::own(allow, non_empty("own.service_name", &o.service_name)?));
        }
        if let Some(u) = &self.user {
            return Ok(Rule::user(allow, u.id("user")?));
        }
        match &self.group {
            Some(g) => Ok(Rule::group(allow, g.id("group")?)),
            None => Err(BusPolicyError::Internal("selector vanished".into())),
        }
    }
}

fn non_empty<'a>(field: &str, v: &'a Option<String>) -> Result<Option<&'a str>> {
    match v.as_deref() {
        Some("") => Err(BusPolicyError::BadConfig(format!("{field} must not be empty"))),
        other => Ok(other),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendSelector {
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiveSelector {
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnSelector {
    #[serde(default)]
    pub service_name: Option<String>,
}

/// `"*"` or a numeric id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdSelector {
    Id(u32),
    Any(String),
}

impl IdSelector {
    fn id(&self, field: &str) -> Result<Option<u32>> {
        match self {
            IdSelector::Id(id) => Ok(Some(*id)),
            IdSelector::Any(s) if s == "*" => Ok(None),
            IdSelector::Any(s) => Err(BusPolicyError::BadConfig(format!(
                "{field} must be \"*\" or a numeric id, got {s:?}"
            ))),
        }
    }
}
