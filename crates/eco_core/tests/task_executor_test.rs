//! Integration tests for the task executor.

use eco_core::{ExecutorConfig, ExecutorError, TaskError, TaskExecutor};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_single_worker_starts_in_submission_order() {
    let executor = TaskExecutor::with_config(&ExecutorConfig::serial()).unwrap();
    let started = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..200usize)
        .map(|i| {
            let started = Arc::clone(&started);
            executor
                .submit(move || started.lock().push(i))
                .unwrap()
        })
        .collect();
    executor.stop();

    for handle in handles {
        handle.wait().unwrap();
    }
    assert_eq!(*started.lock(), (0..200).collect::<Vec<_>>());
}

#[test]
fn test_no_lost_tasks_on_stop() {
    let executor = TaskExecutor::new(4).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));
    let task_count = 500;

    let handles: Vec<_> = (0..task_count)
        .map(|i| {
            let ran = Arc::clone(&ran);
            executor
                .submit(move || {
                    ran.fetch_add(1, Ordering::Relaxed);
                    assert!(i % 50 != 49, "task {i} failed on purpose");
                    i
                })
                .unwrap()
        })
        .collect();
    executor.stop();

    // Every handle is resolved the moment stop returns.
    let mut completed = 0;
    let mut failed = 0;
    for handle in &handles {
        match handle.try_wait() {
            Some(Ok(_)) => completed += 1,
            Some(Err(TaskError::Panicked { .. })) => failed += 1,
            other => panic!("unresolved handle: {other:?}"),
        }
    }
    assert_eq!(completed + failed, task_count);
    assert_eq!(failed, task_count / 50);
    assert_eq!(ran.load(Ordering::Relaxed), task_count);
    assert_eq!(executor.queue_size(), 0);
}

#[test]
fn test_failure_is_isolated_to_its_handle() {
    let executor = TaskExecutor::new(4).unwrap();
    let normal_count = 40u64;

    let mut normal = Vec::new();
    let mut failing = Vec::new();
    for i in 0..normal_count {
        normal.push((i, executor.submit(move || i * 3).unwrap()));
        if i % 10 == 5 {
            failing.push(
                executor
                    .submit(|| -> u64 { panic!("corrupt mesh") })
                    .unwrap(),
            );
        }
    }

    for (i, handle) in normal {
        assert_eq!(handle.wait(), Ok(i * 3));
    }
    for handle in failing {
        assert_eq!(
            handle.wait(),
            Err(TaskError::Panicked { message: "corrupt mesh".into() })
        );
    }

    // Workers are all still alive.
    let handles: Vec<_> = (0..8).map(|i| executor.submit(move || i).unwrap()).collect();
    let sum: i32 = handles.into_iter().map(|h| h.wait().unwrap()).sum();
    assert_eq!(sum, 28);
}

#[test]
fn test_two_workers_return_every_index_once() {
    let executor = TaskExecutor::new(2).unwrap();

    let handles: Vec<_> = (0..10usize)
        .map(|i| {
            executor
                .submit(move || {
                    thread::sleep(Duration::from_millis(5));
                    i
                })
                .unwrap()
        })
        .collect();

    let results: Vec<usize> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
    let unique: BTreeSet<usize> = results.iter().copied().collect();
    assert_eq!(results.len(), 10);
    assert_eq!(unique, (0..10).collect());
}

#[test]
fn test_tasks_run_in_parallel() {
    let executor = TaskExecutor::new(2).unwrap();
    let (a_tx, a_rx) = crossbeam_channel::bounded::<()>(1);
    let (b_tx, b_rx) = crossbeam_channel::bounded::<()>(1);

    // Each task only succeeds if the other is running at the same time.
    let a = executor
        .submit(move || {
            a_tx.send(()).unwrap();
            b_rx.recv_timeout(Duration::from_secs(5)).is_ok()
        })
        .unwrap();
    let b = executor
        .submit(move || {
            b_tx.send(()).unwrap();
            a_rx.recv_timeout(Duration::from_secs(5)).is_ok()
        })
        .unwrap();

    assert_eq!(a.wait(), Ok(true));
    assert_eq!(b.wait(), Ok(true));
}

#[test]
fn test_concurrent_producers() {
    let executor = Arc::new(TaskExecutor::new(3).unwrap());
    let producers = 4u64;
    let per_producer = 250u64;

    let totals: Vec<_> = (0..producers)
        .map(|p| {
            let executor = Arc::clone(&executor);
            thread::spawn(move || {
                let handles: Vec<_> = (0..per_producer)
                    .map(|i| executor.submit(move || p * 1000 + i).unwrap())
                    .collect();
                handles.into_iter().map(|h| h.wait().unwrap()).sum::<u64>()
            })
        })
        .collect();

    let total: u64 = totals.into_iter().map(|t| t.join().unwrap()).sum();
    let n = per_producer;
    let expected = producers * n * (n - 1) / 2 + 1000 * n * (0..producers).sum::<u64>();
    assert_eq!(total, expected);
}

#[test]
fn test_wait_timeout_then_value() {
    let executor = TaskExecutor::new(1).unwrap();
    let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);

    let handle = executor
        .submit(move || {
            go_rx.recv().unwrap();
            "telemetry flushed"
        })
        .unwrap();

    assert_eq!(handle.wait_timeout(Duration::from_millis(20)), None);
    assert!(!handle.is_done());

    go_tx.send(()).unwrap();
    assert_eq!(
        handle.wait_timeout(Duration::from_secs(5)),
        Some(Ok("telemetry flushed"))
    );
}

#[test]
fn test_drop_runs_pending_tasks() {
    let ran = Arc::new(AtomicUsize::new(0));
    {
        let executor = TaskExecutor::new(2).unwrap();
        for _ in 0..64 {
            let ran = Arc::clone(&ran);
            // Result intentionally discarded.
            let _ = executor.submit(move || {
                thread::sleep(Duration::from_micros(200));
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
    }
    assert_eq!(ran.load(Ordering::SeqCst), 64);
}

#[test]
fn test_stop_from_another_thread_rejects_submissions() {
    let executor = Arc::new(TaskExecutor::new(2).unwrap());
    let stopper = {
        let executor = Arc::clone(&executor);
        thread::spawn(move || executor.stop())
    };
    stopper.join().unwrap();

    assert!(executor.is_stopped());
    assert!(matches!(executor.submit(|| ()), Err(ExecutorError::Stopped)));
}

#[test]
fn test_concurrent_stop_waits_for_workers() {
    let executor = Arc::new(TaskExecutor::new(2).unwrap());
    let finished = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let finished = Arc::clone(&finished);
        let _ = executor.submit(move || {
            thread::sleep(Duration::from_millis(5));
            finished.fetch_add(1, Ordering::SeqCst);
        });
    }

    let stoppers: Vec<_> = (0..3)
        .map(|_| {
            let executor = Arc::clone(&executor);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                executor.stop();
                finished.load(Ordering::SeqCst)
            })
        })
        .collect();

    for stopper in stoppers {
        assert_eq!(stopper.join().unwrap(), 8);
    }
}

#[test]
fn test_named_workers() {
    let config = ExecutorConfig::with_workers(2)
        .thread_name("cad-export")
        .stack_size(512 * 1024);
    let executor = TaskExecutor::with_config(&config).unwrap();

    let name = executor
        .submit(|| thread::current().name().map(str::to_string))
        .unwrap()
        .wait()
        .unwrap();
    let name = name.unwrap();
    assert!(name == "cad-export-0" || name == "cad-export-1", "{name}");
}
