#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use buspolicy_core::{Rule, RuleKind};
use buspolicy_engine::{PolicyStore, StaticUserDatabase};

fn users() -> StaticUserDatabase {
    let mut db = StaticUserDatabase::new();
    db.insert(1000, vec![100, 27]);
    db.insert(1001, vec![101]);
    db
}

#[test]
fn append_retains_without_copying() {
    let rule = Rule::send(true, Some("Hello"), None).into_ref();
    let mut store = PolicyStore::new();

    store.append_default(&rule).unwrap();
    assert_eq!(store.default_rules().len(), 1);
    assert_eq!(Arc::strong_count(&rule), 2);

    store.append_mandatory(&rule).unwrap();
    store.append_for_uid(1000, &rule).unwrap();
    store.append_for_gid(100, &rule).unwrap();
    assert_eq!(Arc::strong_count(&rule), 5);
    assert!(Arc::ptr_eq(&store.default_rules()[0], &rule));
    assert!(Arc::ptr_eq(&store.rules_for_gid(100).unwrap()[0], &rule));

    drop(store);
    assert_eq!(Arc::strong_count(&rule), 1);
}

#[test]
fn buckets_created_lazily_and_keep_order() {
    let mut store = PolicyStore::new();
    assert_eq!(store.uid_bucket_count(), 0);
    assert!(store.rules_for_uid(1000).is_none());

    let a = Rule::own(true, Some("a")).into_ref();
    let b = Rule::own(false, Some("b")).into_ref();
    store.append_for_uid(1000, &a).unwrap();
    store.append_for_uid(1000, &b).unwrap();
    store.append_for_gid(7, &a).unwrap();

    assert_eq!(store.uid_bucket_count(), 1);
    assert_eq!(store.gid_bucket_count(), 1);
    let list = store.rules_for_uid(1000).unwrap();
    assert!(Arc::ptr_eq(&list[0], &a));
    assert!(Arc::ptr_eq(&list[1], &b));
}

#[test]
fn merge_shares_rules_and_appends_after_own() {
    let mine = Rule::send(true, None, None).into_ref();
    let theirs = Rule::send(false, Some("X"), None).into_ref();
    let scoped = Rule::own(true, Some("a.b.c")).into_ref();

    let mut base = PolicyStore::new();
    base.append_default(&mine).unwrap();
    base.append_for_uid(1000, &mine).unwrap();

    let mut other = PolicyStore::new();
    other.append_default(&theirs).unwrap();
    other.append_mandatory(&theirs).unwrap();
    other.append_for_uid(1000, &scoped).unwrap();
    other.append_for_uid(2000, &scoped).unwrap();
    other.append_for_gid(50, &scoped).unwrap();

    base.merge(&other).unwrap();

    assert_eq!(base.default_rules().len(), 2);
    assert!(Arc::ptr_eq(&base.default_rules()[1], &theirs));
    assert_eq!(base.mandatory_rules().len(), 1);
    let uid_rules = base.rules_for_uid(1000).unwrap();
    assert!(Arc::ptr_eq(&uid_rules[0], &mine));
    assert!(Arc::ptr_eq(&uid_rules[1], &scoped));
    assert!(base.rules_for_uid(2000).is_some());
    assert!(base.rules_for_gid(50).is_some());

    // 1 local + 2 in other + 2 in base
    assert_eq!(Arc::strong_count(&theirs), 5);
    drop(other);
    assert_eq!(Arc::strong_count(&theirs), 3);
}

#[test]
fn allow_user_on_empty_store_denies() {
    assert!(!PolicyStore::new().allow_user(&users(), 1000));
}

#[test]
fn allow_user_mandatory_group_overrides_default_deny() {
    let mut store = PolicyStore::new();
    store.append_default(&Rule::new(RuleKind::User, false).into_ref()).unwrap();
    store.append_mandatory(&Rule::group(true, Some(100)).into_ref()).unwrap();

    let db = users();
    assert!(store.allow_user(&db, 1000));
    assert!(!store.allow_user(&db, 1001));
}

#[test]
fn allow_user_last_match_wins_and_ignores_message_rules() {
    let mut store = PolicyStore::new();
    store.append_default(&Rule::user(true, None).into_ref()).unwrap();
    store.append_default(&Rule::user(false, Some(1001)).into_ref()).unwrap();
    store.append_default(&Rule::send(false, None, None).into_ref()).unwrap();

    let db = users();
    assert!(store.allow_user(&db, 1000));
    assert!(!store.allow_user(&db, 1001));
}

#[test]
fn allow_user_fails_closed_on_unknown_uid() {
    let mut store = PolicyStore::new();
    store.append_default(&Rule::user(true, None).into_ref()).unwrap();
    assert!(!store.allow_user(&users(), 4242));
}
