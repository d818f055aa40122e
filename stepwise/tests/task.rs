use stepwise::bridge;
use stepwise::{Discard, Error, Failure, StepOutcome, Task, TaskState, yield_now};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fib(start: usize, count: usize) -> Task<u64, Discard> {
    Task::generator(move |co| async move {
        let (mut n1, mut n2) = (0u64, 1u64);

        for _ in 1..start {
            (n1, n2) = (n2, n1 + n2);
        }

        for _ in 0..count {
            co.yield_value(n1).await;
            (n1, n2) = (n2, n1 + n2);
        }

        Ok(n1)
    })
}

#[test]
fn step_after_completion_is_a_noop() {
    init_logger();

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let task = Task::<usize>::new(async move {
        counter.fetch_add(1, Ordering::SeqCst);
        yield_now().await;
        Ok(7)
    });

    assert_eq!(task.step(), StepOutcome::StillSuspended);
    assert!(!task.is_complete());

    assert_eq!(task.step(), StepOutcome::ReturnToDriver);
    assert!(task.is_complete());

    for _ in 0..3 {
        assert_eq!(task.step(), StepOutcome::ReturnToDriver);
        assert!(task.is_complete());
        assert_eq!(task.state(), TaskState::Completed);
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(task.result(), Some(Ok(7)));
}

#[test]
fn result_before_anything_is_produced_is_empty() {
    let task = Task::<u8>::new(async { Ok(1) });

    assert_eq!(task.result(), None);
    assert!(task.is_launched_directly());
    assert!(task.caller().is_none());
}

#[test]
fn failure_keeps_message_and_code() {
    let task = Task::<i32>::new(async { Err(Failure::from(Error::with_code(1, "IO Error."))) });
    task.run_to_completion();

    let err = task.take_result().unwrap().unwrap_err();
    assert_eq!(err.message(), "IO Error.");
    assert_eq!(err.code(), Some(1));
}

#[test]
fn foreign_failure_becomes_canonical_error() {
    let task = Task::<i32>::new(async {
        let n: i32 = "forty-two".parse()?;
        Ok(n)
    });
    task.step();

    let err = task.result().unwrap().unwrap_err();
    assert_eq!(err.message(), "invalid digit found in string");
    assert_eq!(err.code(), None);
}

#[test]
fn panic_is_reported_as_failure() {
    let task = Task::<i32>::new(async {
        if task_should_panic() {
            panic!("kaboom");
        }
        Ok(1)
    });

    assert_eq!(task.step(), StepOutcome::ReturnToDriver);
    assert!(task.is_complete());

    let err = task.result().unwrap().unwrap_err();
    assert_eq!(err.message(), "task panicked: kaboom");
}

fn task_should_panic() -> bool {
    true
}

#[test]
fn fibonacci_generator() {
    let values: Vec<u64> = fib(1, 30).into_iter().collect();

    assert_eq!(values.len(), 30);
    assert_eq!(&values[..8], &[0, 1, 1, 2, 3, 5, 8, 13]);
    assert_eq!(values[29], 514_229);

    let halved: Vec<u64> = values
        .iter()
        .filter(|n| *n % 2 == 1)
        .map(|n| (n - 1) / 2)
        .collect();

    assert_eq!(
        halved,
        vec![
            0, 0, 1, 2, 6, 10, 27, 44, 116, 188, 493, 798, 2090, 3382, 8855, 14328, 37512, 60696,
            158905, 257114,
        ]
    );
}

#[test]
fn fibonacci_from_later_index() {
    let values: Vec<u64> = fib(5, 4).iter().collect();
    assert_eq!(values, vec![3, 5, 8, 13]);
}

#[test]
fn iteration_is_single_pass() {
    let task = fib(1, 3);

    assert_eq!(task.iter().count(), 3);
    assert!(task.is_complete());
    assert_eq!(task.iter().next(), None);
}

#[test]
fn iteration_resumes_where_it_left_off() {
    let task = fib(1, 5);
    let mut values = task.iter();

    assert_eq!(values.next(), Some(0));
    assert_eq!(values.next(), Some(1));
    drop(values);

    assert_eq!(task.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn iteration_skips_plain_yields() {
    let task = Task::<u32, Discard>::generator(|co| async move {
        co.yield_value(1).await;
        yield_now().await;
        yield_now().await;
        co.yield_value(2).await;
        Ok(3)
    });

    assert_eq!(task.iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(task.result(), Some(3));
}

#[test]
fn discard_keeps_last_yield_on_failure() {
    let task = Task::<u32, Discard>::generator(|co| async move {
        co.yield_value(4).await;
        Err(Failure::from("lost"))
    });

    task.run_to_completion();

    assert!(task.is_complete());
    assert_eq!(task.result(), Some(4));
}

#[test]
fn concurrent_step_is_refused() {
    init_logger();

    let handle = bridge::create_handle::<i32>();
    let remote = handle.clone();

    let task = Task::<i32>::new(async move { Ok(remote.suspend()? + 1) });

    let driver = {
        let task = task.clone();
        thread::spawn(move || task.step())
    };

    while task.state() != TaskState::SuspendedOnExternalCallback {
        thread::yield_now();
    }

    assert_eq!(task.step(), StepOutcome::StillSuspended);
    assert!(!task.is_complete());

    handle.resume(41);

    assert_eq!(driver.join().unwrap(), StepOutcome::ReturnToDriver);
    assert_eq!(task.result(), Some(Ok(42)));
}

#[test]
fn dropping_last_handle_releases_the_body() {
    let marker = Arc::new(());
    let held = marker.clone();

    let task = Task::<(), Discard>::new(async move {
        let _held = held;
        yield_now().await;
        Ok(())
    });

    task.step();
    assert_eq!(Arc::strong_count(&marker), 2);

    drop(task);
    assert_eq!(Arc::strong_count(&marker), 1);
}
