//! Field slots through the runtime: compute once, freeze errors and nulls.

use crate::common::*;
use factgraph_core::{Error, Value};
use factgraph_engine::{Resource, SlotState};
use std::sync::Arc;

#[test]
fn test_field_computed_once() {
    let (rt, conn) = runtime();
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();

    for _ in 0..3 {
        assert_eq!(user.shell(&rt).data.as_deref(), Some("/bin/bash"));
    }
    assert_eq!(conn.accesses(), 1);
}

#[test]
fn test_group_fills_sibling_fields() {
    let (rt, conn) = runtime();
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();

    assert_eq!(user.home(&rt).data.as_deref(), Some("/home/alice"));
    assert_eq!(user.shell(&rt).data.as_deref(), Some("/bin/bash"));
    assert_eq!(user.passwd_runs(), 1);
    assert_eq!(conn.accesses(), 1);
}

#[test]
fn test_error_is_cached_without_retry() {
    let conn = Arc::new(FlakyConnection::default());
    let rt = runtime_with(conn.clone());
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();

    let first = user.shell(&rt);
    assert!(first.is_error());
    assert_eq!(first.state, SlotState::Set);

    conn.heal();
    let second = user.shell(&rt);
    assert_eq!(second, first);
    assert_eq!(conn.calls(), 1);

    // the sibling field shares the group's cached failure
    assert!(user.home(&rt).is_error());
    assert_eq!(conn.calls(), 1);
}

#[test]
fn test_compute_error_names_failing_field() {
    let conn = Arc::new(FlakyConnection::default());
    let rt = runtime_with(conn);
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();

    match user.profile(&rt).error {
        Some(Error::Compute {
            resource,
            field,
            message,
        }) => {
            assert_eq!(resource, "user");
            assert_eq!(field, "home");
            assert!(message.contains("connection reset"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_input_freezes_null() {
    let (rt, conn) = runtime();
    let user = rt.new_typed::<User>(user_args("nouid")).unwrap();

    let group = user.group(&rt);
    assert_eq!(group.state, SlotState::SetAndNull);
    assert!(group.is_null());

    let res = rt.get_data(&*user, "group");
    let data = res.data.unwrap();
    assert_eq!(data.value, Value::Null);
    assert_eq!(conn.accesses(), 0);
}

#[test]
fn test_reference_resolves_to_registered_resource() {
    let (rt, _) = runtime();
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();
    rt.set_data(&*user, "uid", factgraph_core::RawData::int(1000))
        .unwrap();

    let reference = user.group(&rt).data.unwrap();
    assert_eq!(reference.name, "group");
    assert_eq!(reference.id, "1000");

    let group = rt.resolve::<Group>(&reference).unwrap();
    assert_eq!(group.name(&rt).data.as_deref(), Some("staff"));
    assert!(rt.lookup("group", "1000").is_some());
}

#[test]
fn test_dependent_field_uses_cached_dependency() {
    let (rt, conn) = runtime();
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();

    assert_eq!(user.profile(&rt).data.as_deref(), Some("export EDITOR=vi\n"));
    assert_eq!(user.home(&rt).data.as_deref(), Some("/home/alice"));
    // one getent call, one file read
    assert_eq!(conn.accesses(), 2);
    assert_eq!(user.id(), "alice");
}
