//! Construction pipeline: memo, init, identity, registry.

use crate::common::*;
use factgraph_core::{Error, RawData};
use factgraph_engine::{Resource, ID_ARG};
use std::sync::Arc;

#[test]
fn test_same_args_return_same_instance() {
    let (rt, _) = runtime();
    let first = rt.new_resource("user", user_args("ana")).unwrap();
    let second = rt.new_resource("user", user_args("ana")).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(init_calls("ana"), 1);
    assert_eq!(rt.registry().len(), 1);
}

#[test]
fn test_different_args_same_identity_converge() {
    let (rt, _) = runtime();
    let plain = rt.new_resource("user", user_args("carol")).unwrap();
    let with_uid = rt
        .new_resource(
            "user",
            args(&[("name", RawData::string("carol")), ("uid", RawData::int(7))]),
        )
        .unwrap();

    assert!(Arc::ptr_eq(&plain, &with_uid));
    assert_eq!(rt.registry().len(), 1);
    // the second argument set was never applied to the registered instance
    assert_eq!(as_user(with_uid).uid(&rt).data, None);
}

#[test]
fn test_unknown_type() {
    let (rt, _) = runtime();
    let err = rt.new_resource("dns.record", user_args("x")).unwrap_err();
    assert_eq!(
        err,
        Error::UnknownResource {
            resource: "dns.record".into()
        }
    );
}

#[test]
fn test_identity_failure_registers_nothing() {
    let (rt, _) = runtime();
    let err = rt
        .new_resource("user", args(&[("uid", RawData::int(1))]))
        .unwrap_err();
    assert!(matches!(err, Error::Identity { ref resource, .. } if resource == "user"));
    assert!(rt.registry().is_empty());

    // a later call with usable arguments succeeds
    assert!(rt.new_resource("user", user_args("retry")).is_ok());
}

#[test]
fn test_type_mismatch_registers_nothing() {
    let (rt, _) = runtime();
    let err = rt
        .new_resource("user", args(&[("name", RawData::int(5))]))
        .unwrap_err();
    match err {
        Error::TypeMismatch {
            resource,
            field,
            expected,
            actual,
        } => {
            assert_eq!(resource, "user");
            assert_eq!(field, "name");
            assert_eq!(expected, "string");
            assert_eq!(actual, "int");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(rt.registry().is_empty());
}

#[test]
fn test_explicit_id_skips_identity() {
    let (rt, _) = runtime();
    let res = rt
        .create_resource("user", args(&[(ID_ARG, RawData::string("u-17"))]))
        .unwrap();
    assert_eq!(res.id(), "u-17");
    assert!(rt.lookup("user", "u-17").is_some());
}

#[test]
fn test_create_resource_skips_init() {
    let (rt, _) = runtime();
    rt.create_resource("user", user_args("dave")).unwrap();
    assert_eq!(init_calls("dave"), 0);

    // the registered instance is reused by the full pipeline
    let again = rt.new_resource("user", user_args("dave")).unwrap();
    assert_eq!(init_calls("dave"), 1);
    assert_eq!(rt.registry().len(), 1);
    assert_eq!(again.id(), "dave");
}

#[test]
fn test_init_can_resolve_the_resource() {
    let (rt, _) = runtime();
    let wheel = rt
        .new_resource("group", args(&[("alias", RawData::string("wheel"))]))
        .unwrap();
    assert_eq!(wheel.type_name(), "group");
    assert_eq!(wheel.id(), "0");

    let by_gid = rt
        .new_resource("group", args(&[("gid", RawData::int(0))]))
        .unwrap();
    assert!(Arc::ptr_eq(&wheel, &by_gid));
}

#[test]
fn test_init_errors_propagate() {
    let (rt, _) = runtime();
    let err = rt
        .new_resource("group", args(&[("alias", RawData::string("nobody"))]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "alias"));
    assert!(rt.registry().is_empty());
}

#[test]
fn test_typed_construction() {
    let (rt, _) = runtime();
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();
    assert_eq!(user.name(&rt).data.as_deref(), Some("alice"));
    assert_eq!(user.home(&rt).data.as_deref(), Some("/home/alice"));
}

#[test]
fn test_same_id_across_types_stays_distinct() {
    let (rt, _) = runtime();
    rt.create_resource("user", args(&[(ID_ARG, RawData::string("X"))]))
        .unwrap();
    rt.create_resource("group", args(&[(ID_ARG, RawData::string("X"))]))
        .unwrap();

    assert_eq!(rt.registry().len(), 2);
    assert_eq!(rt.lookup("user", "X").unwrap().type_name(), "user");
    assert_eq!(rt.lookup("group", "X").unwrap().type_name(), "group");
}

#[test]
fn test_separate_runtimes_do_not_share_resources() {
    let (a, _) = runtime();
    let (b, _) = runtime();
    a.new_resource("user", user_args("alice")).unwrap();
    assert!(b.lookup("user", "alice").is_none());
}
