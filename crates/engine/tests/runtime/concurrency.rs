//! Concurrent construction and first reads.

use crate::common::*;
use factgraph_engine::Resource;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

#[test]
fn test_concurrent_construction_converges() {
    let (rt, _conn) = runtime();
    let rt = Arc::new(rt);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let rt = Arc::clone(&rt);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                rt.new_resource("user", user_args("alice")).unwrap()
            })
        })
        .collect();

    let built: Vec<Arc<dyn Resource>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for resource in &built[1..] {
        assert!(Arc::ptr_eq(&built[0], resource));
    }
    assert_eq!(rt.registry().len(), 1);
}

#[test]
fn test_concurrent_first_reads_compute_once() {
    let (rt, conn) = runtime();
    let rt = Arc::new(rt);
    let user = rt.new_typed::<User>(user_args("alice")).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let rt = Arc::clone(&rt);
            let user = Arc::clone(&user);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // half the readers go through the sibling field of the same group
                if i % 2 == 0 {
                    user.shell(&rt).data
                } else {
                    user.home(&rt).data
                }
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let expected = if i % 2 == 0 { "/bin/bash" } else { "/home/alice" };
        assert_eq!(h.join().unwrap().as_deref(), Some(expected));
    }
    assert_eq!(user.passwd_runs(), 1);
    assert_eq!(conn.accesses(), 1);
}

#[test]
fn test_concurrent_dispatch_reads_agree() {
    let (rt, conn) = runtime();
    let rt = Arc::new(rt);
    let user = rt.new_resource("user", user_args("alice")).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let rt = Arc::clone(&rt);
            let user = Arc::clone(&user);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                rt.get_data(&*user, "profile").into_result().unwrap()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap().value.as_str(), Some("export EDITOR=vi\n"));
    }
    // passwd once, .profile once
    assert_eq!(conn.accesses(), 2);
}
