//! Multi-threaded transaction tests.

use inmemdb_core::{CoreError, Database, KeyValueStore, TransactionState, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

#[test]
fn disjoint_transactions_all_commit() {
    let db = Arc::new(Database::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..25 {
                    db.run_transaction(|txn| {
                        txn.put(format!("t{t}-k{i}"), Value::from(format!("{t}:{i}")))
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.store().len().unwrap(), THREADS * 25);
    assert_eq!(db.transaction_manager().active_transaction_count(), 0);
}

#[test]
fn same_key_last_writer_wins() {
    let db = Arc::new(Database::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let txn = db.begin_transaction();
                txn.put("shared".to_string(), Value::Long(t as i64)).unwrap();
                barrier.wait();
                txn.commit().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let winner = db.get("shared").unwrap().unwrap();
    let winner = winner.as_integer().unwrap();
    assert!((0..THREADS as i64).contains(&winner));
}

#[test]
fn read_modify_write_without_lock_can_lose_updates_but_never_corrupts() {
    let db = Arc::new(Database::new());
    db.set("counter", 0_i64).unwrap();
    let committed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let committed = Arc::clone(&committed);
            thread::spawn(move || {
                for _ in 0..10 {
                    db.run_transaction(|txn| {
                        let current = txn
                            .get(&"counter".to_string())?
                            .and_then(|v| v.as_integer())
                            .unwrap_or(0);
                        txn.put("counter".to_string(), Value::Long(current + 1))
                    })
                    .unwrap();
                    committed.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let total = db.get("counter").unwrap().unwrap().as_integer().unwrap();
    assert!(total >= 1);
    assert!(total as usize <= committed.load(Ordering::SeqCst));
}

#[test]
fn write_lock_serializes_read_modify_write() {
    let db = Arc::new(Database::new());
    db.set("counter", 0_i64).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for _ in 0..10 {
                    let tm = db.transaction_manager();
                    let guard = tm.acquire_write_lock();
                    tm.run_transaction(|txn| {
                        let current = txn
                            .get(&"counter".to_string())?
                            .and_then(|v| v.as_integer())
                            .unwrap_or(0);
                        txn.put("counter".to_string(), Value::Long(current + 1))
                    })
                    .unwrap();
                    tm.release_write_lock(guard);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        db.get("counter").unwrap(),
        Some(Value::Long((THREADS * 10) as i64))
    );
}

#[test]
fn readers_share_the_coordination_lock() {
    let db = Arc::new(Database::new());
    let barrier = Arc::new(Barrier::new(4));

    let guard = db.transaction_manager().acquire_read_lock();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let tm = db.transaction_manager();
                let guard = tm.acquire_read_lock();
                barrier.wait();
                tm.release_read_lock(guard);
            })
        })
        .collect();

    // all three readers get in while this thread still holds the lock
    barrier.wait();
    for handle in handles {
        handle.join().unwrap();
    }
    db.transaction_manager().release_read_lock(guard);
}

#[test]
fn writer_waits_for_reader() {
    let db = Arc::new(Database::new());
    let entered = Arc::new(AtomicUsize::new(0));

    let guard = db.transaction_manager().acquire_read_lock();
    let writer = {
        let db = Arc::clone(&db);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            let tm = db.transaction_manager();
            let guard = tm.acquire_write_lock();
            entered.store(1, Ordering::SeqCst);
            tm.release_write_lock(guard);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(entered.load(Ordering::SeqCst), 0);
    db.transaction_manager().release_read_lock(guard);

    writer.join().unwrap();
    assert_eq!(entered.load(Ordering::SeqCst), 1);
}

#[test]
fn failing_transactions_under_load_leave_no_registrations() {
    let db = Arc::new(Database::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..20 {
                    let result = db.run_transaction(|txn| {
                        txn.put(format!("t{t}-k{i}"), Value::Int(i))?;
                        if i % 2 == 0 {
                            return Err(CoreError::unsupported("even writes"));
                        }
                        Ok::<(), CoreError>(())
                    });
                    assert_eq!(result.is_err(), i % 2 == 0);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.store().len().unwrap(), THREADS * 10);
    assert_eq!(db.transaction_manager().active_transaction_count(), 0);
}

#[test]
fn commit_and_rollback_race_on_one_transaction() {
    const RACERS: usize = 8;

    for round in 0..50 {
        let db = Arc::new(Database::new());
        let txn = db.begin_transaction();
        txn.put("raced".to_string(), Value::Int(round)).unwrap();
        let barrier = Arc::new(Barrier::new(RACERS));

        let handles: Vec<_> = (0..RACERS)
            .map(|r| {
                let txn = Arc::clone(&txn);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if r % 2 == 0 {
                        Some(txn.commit())
                    } else {
                        txn.rollback();
                        None
                    }
                })
            })
            .collect();

        let commits: Vec<_> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap())
            .collect();
        let succeeded = commits.iter().filter(|result| result.is_ok()).count();
        for result in commits.iter().filter_map(|result| result.as_ref().err()) {
            assert!(result.is_not_active(), "unexpected error: {result}");
        }

        match txn.state() {
            TransactionState::Committed => {
                assert_eq!(succeeded, 1);
                assert_eq!(db.get("raced").unwrap(), Some(Value::Int(round)));
            }
            TransactionState::RolledBack => {
                assert_eq!(succeeded, 0);
                assert_eq!(db.get("raced").unwrap(), None);
            }
            other => panic!("unexpected state {other}"),
        }
        assert_eq!(txn.write_count(), 0);
    }
}
