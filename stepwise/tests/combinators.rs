use stepwise::{Discard, Scheduler, Task, all_of, any_of, yield_now};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generates `count` odd (or even) numbers from `start`, recording each one.
fn numbers(start: u32, count: usize, odd: bool, seen: Arc<Mutex<Vec<u32>>>) -> Task<u32, Discard> {
    Task::generator(move |co| async move {
        let mut n = if (start % 2 == 1) == odd { start } else { start + 1 };

        for _ in 0..count {
            seen.lock().unwrap().push(n);
            co.yield_value(n).await;
            n += 2;
        }

        Ok(n - 2)
    })
}

#[test]
fn all_of_waits_for_every_sequence() {
    init_logger();

    let scheduler = Scheduler::new();
    let odds_seen = Arc::new(Mutex::new(Vec::new()));
    let evens_seen = Arc::new(Mutex::new(Vec::new()));

    let odds = numbers(0, 5, true, odds_seen.clone());
    let evens = numbers(0, 15, false, evens_seen.clone());

    let joint = all_of(&scheduler, vec![odds.clone(), evens.clone()]);
    joint.run_to_completion();

    assert_eq!(joint.result(), Some(Ok(())));
    assert!(odds.is_complete());
    assert!(evens.is_complete());

    assert_eq!(*odds_seen.lock().unwrap(), vec![1, 3, 5, 7, 9]);
    assert_eq!(evens_seen.lock().unwrap().len(), 15);
    assert_eq!(evens_seen.lock().unwrap().last(), Some(&28));
}

#[test]
fn any_of_completes_with_the_first_finisher() {
    init_logger();

    let scheduler = Scheduler::new();
    let release = Arc::new(AtomicBool::new(false));

    let odds = numbers(0, 5, true, Arc::new(Mutex::new(Vec::new())));

    let evens = {
        let release = release.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = numbers(0, 15, false, seen);

        Task::<u32, Discard>::new(async move {
            while !release.load(Ordering::Acquire) {
                yield_now().await;
            }
            Ok(inner.await)
        })
    };

    let joint = any_of(&scheduler, vec![evens.clone(), odds.clone()]);
    joint.run_to_completion();

    assert_eq!(joint.result(), Some(Ok(1)));
    assert!(odds.is_complete());
    assert!(!evens.is_complete());

    release.store(true, Ordering::Release);
    scheduler.schedule(&evens, true).unwrap();
    assert_eq!(evens.result(), Some(28));
}

#[test]
fn combinators_compose_as_tasks() {
    let scheduler = Scheduler::new();

    let quick = numbers(1, 2, true, Arc::new(Mutex::new(Vec::new())));
    let slow = numbers(0, 8, false, Arc::new(Mutex::new(Vec::new())));

    let first = any_of(&scheduler, vec![quick.clone(), slow.clone()]);
    let both = all_of(&scheduler, vec![quick.clone(), slow.clone()]);

    let outer = Task::<usize>::new(async move {
        let winner = first.await?;
        both.await?;
        Ok(winner)
    });

    outer.run_to_completion();

    assert_eq!(outer.result(), Some(Ok(0)));
    assert!(quick.is_complete() && slow.is_complete());
}

#[test]
fn combinator_on_the_worker_yields_cooperatively() {
    let scheduler = Arc::new(Scheduler::new());

    let a = numbers(0, 3, true, Arc::new(Mutex::new(Vec::new())));
    let b = numbers(0, 6, false, Arc::new(Mutex::new(Vec::new())));

    let joint = all_of(&scheduler, vec![a.clone(), b.clone()]);
    scheduler.schedule(&joint, true).unwrap();

    assert_eq!(joint.result(), Some(Ok(())));
    assert!(a.is_complete() && b.is_complete());
}
