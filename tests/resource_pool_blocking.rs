//! Blocking and capacity behaviour of the resource pool under contention

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use xref_archive::ResourcePool;

#[test]
fn test_max_two_with_three_renters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = Arc::clone(&calls);
    let pool = ResourcePool::new(
        move || Ok(factory_calls.fetch_add(1, Ordering::SeqCst)),
        2,
    )
    .unwrap();

    let (acquired_tx, acquired_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = parking_lot::Mutex::new(release_rx);

    std::thread::scope(|scope| {
        for renter in 0..3 {
            let acquired_tx = acquired_tx.clone();
            let pool = &pool;
            let release_rx = &release_rx;
            scope.spawn(move || {
                let lease = pool.rent().unwrap();
                acquired_tx.send(renter).unwrap();
                // hold the lease until told to let go
                release_rx.lock().recv().unwrap();
                drop(lease);
            });
        }

        // exactly two renters get through right away
        acquired_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        acquired_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(acquired_rx.recv_timeout(Duration::from_millis(200)).is_err());

        // one release lets the third through
        release_tx.send(()).unwrap();
        acquired_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
    });

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(pool.stats().idle, 2);
    assert_eq!(pool.stats().leased, 0);
}

#[test]
fn test_churn_never_exceeds_max() {
    const MAX: usize = 3;

    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = Arc::clone(&calls);
    let pool = ResourcePool::new(
        move || {
            factory_calls.fetch_add(1, Ordering::SeqCst);
            // slow construction widens the window for over-allocation
            std::thread::sleep(Duration::from_millis(5));
            Ok(())
        },
        MAX,
    )
    .unwrap();

    let in_use = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let _lease = pool.rent().unwrap();
                    let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::yield_now();
                    in_use.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert!(peak.load(Ordering::SeqCst) <= MAX);
    assert!(calls.load(Ordering::SeqCst) <= MAX);
    assert_eq!(pool.stats().created, calls.load(Ordering::SeqCst));
    assert_eq!(pool.stats().leased, 0);
}

#[test]
fn test_failing_factory_under_contention() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let factory_attempts = Arc::clone(&attempts);
    let pool = ResourcePool::new(
        move || {
            // every other construction fails
            if factory_attempts.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Err("flaky".into())
            } else {
                Ok(String::from("resource"))
            }
        },
        2,
    )
    .unwrap();

    let successes = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..20 {
                    if let Ok(lease) = pool.rent() {
                        assert_eq!(lease.as_str(), "resource");
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert!(successes.load(Ordering::SeqCst) > 0);
    assert!(pool.stats().created <= 2);
}
