use stepwise::{Discard, Error, ErrorSet, Failure, Set, Task};

use std::num::ParseIntError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("permission denied: {0}")]
struct PermissionDenied(String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("not found")]
struct NotFound;

#[derive(Debug, Clone, PartialEq, thiserror::Error, ErrorSet)]
enum LookupError {
    #[error(transparent)]
    Denied(PermissionDenied),
    #[error(transparent)]
    Missing(NotFound),
    #[error(transparent)]
    Parse(ParseIntError),
    #[fallback]
    #[error(transparent)]
    Other(Error),
}

type Lookup<T> = Task<T, Set<LookupError>>;

fn lookup(key: &'static str) -> Lookup<u32> {
    Task::new(async move {
        match key {
            "secret" => Err(Failure::from(PermissionDenied(key.into()))),
            "ghost" => Err(Failure::from(NotFound)),
            "legacy" => Err(Failure::from(Error::with_code(3, "backend offline"))),
            "io" => Err(Failure::from(std::io::Error::other("disk unplugged"))),
            number => Ok(number.parse()?),
        }
    })
}

#[test]
fn single_channel_wraps_value() {
    let task = Task::<&str>::new(async { Ok("ok") });
    task.step();

    assert_eq!(task.result(), Some(Ok("ok")));
}

#[test]
fn single_channel_carries_the_message() {
    let task = Task::<&str>::new(async { Err(Failure::from("connection reset")) });
    task.step();

    let err = task.result().unwrap().unwrap_err();
    assert_eq!(err.message(), "connection reset");
    assert_eq!(err.to_string(), "connection reset");
}

#[test]
fn declared_kind_keeps_its_payload() {
    let task = lookup("secret");
    task.step();

    assert_eq!(
        task.result(),
        Some(Err(LookupError::Denied(PermissionDenied("secret".into()))))
    );

    let task = lookup("ghost");
    task.step();

    assert_eq!(task.result(), Some(Err(LookupError::Missing(NotFound))));
}

#[test]
fn question_mark_conversion_is_classified() {
    let task = lookup("12x");
    task.step();

    let Some(Err(LookupError::Parse(err))) = task.result() else {
        panic!("expected a parse error");
    };
    assert_eq!(err.to_string(), "invalid digit found in string");
}

#[test]
fn undeclared_kind_falls_back() {
    let task = lookup("io");
    task.step();

    let err = task.take_result().unwrap().unwrap_err();
    assert!(err.is_fallback());
    assert_eq!(err, LookupError::Other(Error::new("disk unplugged")));
}

#[test]
fn canonical_error_falls_back_with_its_code() {
    let task = lookup("legacy");
    task.step();

    let Some(Err(LookupError::Other(err))) = task.result() else {
        panic!("expected the fallback kind");
    };
    assert_eq!(err.code(), Some(3));
}

#[test]
fn success_passes_through() {
    let task = lookup("42");
    task.step();

    assert_eq!(task.result(), Some(Ok(42)));
}

#[test]
fn tagged_union_threads_through_awaits() {
    let outer = Lookup::<u32>::new(async {
        let first = lookup("1").await?;
        let second = lookup("secret").await?;
        Ok(first + second)
    });

    outer.run_to_completion();

    assert_eq!(
        outer.result(),
        Some(Err(LookupError::Denied(PermissionDenied("secret".into()))))
    );
}

#[test]
fn set_failure_through_single_keeps_the_message() {
    let outer = Task::<u32>::new(async {
        let value = lookup("ghost").await?;
        Ok(value)
    });

    outer.step();

    let err = outer.result().unwrap().unwrap_err();
    assert_eq!(err.message(), "not found");
}

#[test]
fn discard_reports_default_when_nothing_was_produced() {
    let task = Task::<u32, Discard>::new(async { Err(Failure::from("ignored")) });
    task.step();

    assert!(task.is_complete());
    assert_eq!(task.result(), None);

    let outer = Task::<u32, Discard>::new(async move { Ok(task.await + 1) });
    outer.step();

    assert_eq!(outer.result(), Some(1));
}
