#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use buspolicy_core::{RuleKind, RuleMatch};
use buspolicy_engine::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
policies:
  - context: default
    rules:
      - effect: allow
        send: { mesage_name: "Hello" } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "org.freedesktop.DBus.Error.InvalidArgs");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.policies.is_empty());
    let store = config::build_store(&cfg).unwrap();
    assert!(store.default_rules().is_empty());
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert!(matches!(err, buspolicy_core::BusPolicyError::UnsupportedVersion));
}

#[test]
fn section_needs_exactly_one_target() {
    let bad = r#"
version: 1
policies:
  - context: default
    user: 1000
    rules: []
"#;
    assert!(config::load_from_str(bad).is_err());

    let none = r#"
version: 1
policies:
  - rules: []
"#;
    assert!(config::load_from_str(none).is_err());
}

#[test]
fn rule_needs_exactly_one_selector() {
    let two = r#"
version: 1
policies:
  - context: default
    rules:
      - effect: allow
        send: {}
        own: {}
"#;
    assert!(config::load_from_str(two).is_err());

    let zero = r#"
version: 1
policies:
  - context: default
    rules:
      - effect: deny
"#;
    assert!(config::load_from_str(zero).is_err());
}

#[test]
fn user_rules_only_in_context_sections() {
    let bad = r#"
version: 1
policies:
  - group: 100
    rules:
      - effect: allow
        user: "*"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("default or mandatory"));
}

#[test]
fn id_selector_rejects_non_star_strings() {
    let bad = r#"
version: 1
policies:
  - context: default
    rules:
      - effect: allow
        user: "root"
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn empty_selector_strings_rejected() {
    let bad = r#"
version: 1
policies:
  - context: default
    rules:
      - effect: allow
        own: { service_name: "" }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn build_store_routes_sections() {
    let yaml = r#"
version: 1
users:
  - uid: 1000
    groups: [100]
policies:
  - context: default
    rules:
      - effect: deny
        user: "*"
      - effect: deny
        send: {}
  - user: 1000
    rules:
      - effect: allow
        send: { destination: "org.example.Echo" }
  - group: 100
    rules:
      - effect: allow
        own: { service_name: "org.example.Echo" }
  - context: mandatory
    rules:
      - effect: allow
        group: 100
"#;
    let cfg = config::load_from_str(yaml).unwrap();
    assert_eq!(cfg.users[0].groups, vec![100]);

    let store = config::build_store(&cfg).unwrap();
    assert_eq!(store.default_rules().len(), 2);
    assert_eq!(store.default_rules()[0].kind(), RuleKind::User);
    assert!(store.default_rules()[1].is_blanket());
    assert_eq!(store.mandatory_rules().len(), 1);

    let uid_rules = store.rules_for_uid(1000).unwrap();
    assert_eq!(
        uid_rules[0].matcher(),
        &RuleMatch::Send { message_name: None, destination: Some("org.example.Echo".into()) }
    );
    assert_eq!(store.rules_for_gid(100).unwrap().len(), 1);
    assert!(store.rules_for_uid(0).is_none());
}

#[test]
fn load_policy_files_merges_in_order() {
    let dir = std::env::temp_dir().join(format!("buspolicy-cfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let base = dir.join("base.yaml");
    let local = dir.join("local.yaml");

    std::fs::write(
        &base,
        r#"
version: 1
users:
  - uid: 1000
    groups: [100]
policies:
  - context: default
    rules:
      - effect: allow
        send: {}
  - user: 1000
    rules:
      - effect: allow
        own: { service_name: "a.b.c" }
"#,
    )
    .unwrap();
    std::fs::write(
        &local,
        r#"
version: 1
users:
  - uid: 1000
    groups: [100, 200]
policies:
  - context: default
    rules:
      - effect: deny
        send: { message_name: "Shutdown" }
  - user: 1000
    rules:
      - effect: deny
        own: { service_name: "a.b.c" }
"#,
    )
    .unwrap();

    let loaded = config::load_policy_files(&[&base, &local]).unwrap();
    let defaults = loaded.store.default_rules();
    assert_eq!(defaults.len(), 2);
    assert!(defaults[0].allow());
    assert!(!defaults[1].allow());

    let owns = loaded.store.rules_for_uid(1000).unwrap();
    assert_eq!(owns.len(), 2);
    assert!(!owns[1].allow());

    use buspolicy_engine::IdentityResolver;
    assert_eq!(loaded.users.groups_of(1000).unwrap(), vec![100, 200]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_an_error() {
    let err = config::load_from_file("/nonexistent/buspolicy.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "org.freedesktop.DBus.Error.Failed");
}
