// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bookcrawl::browser::BrowserError;
use bookcrawl::retry::{
    run_with_retry, snapshot_on_failure, DiagnosticCapture, NoCapture, RetryError, RetryHooks,
    RetryPolicy,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// 记录全部钩子触发的测试替身
#[derive(Default)]
struct RecordingHooks {
    successes: Mutex<Vec<u32>>,
    retries: Mutex<Vec<(u32, u64)>>,
    failures: Mutex<Vec<(u32, Option<PathBuf>)>>,
}

impl RetryHooks for RecordingHooks {
    fn on_success(&self, _operation: &str, attempt: u32) {
        self.successes.lock().unwrap().push(attempt);
    }

    fn on_retry(&self, _operation: &str, attempt: u32, delay: Duration, _error: &anyhow::Error) {
        self.retries
            .lock()
            .unwrap()
            .push((attempt, delay.as_millis() as u64));
    }

    fn on_final_failure(
        &self,
        _operation: &str,
        attempts: u32,
        _error: &anyhow::Error,
        snapshot: Option<&Path>,
    ) {
        self.failures
            .lock()
            .unwrap()
            .push((attempts, snapshot.map(|p| p.to_path_buf())));
    }
}

struct FakeCapture {
    path: PathBuf,
}

#[async_trait]
impl DiagnosticCapture for FakeCapture {
    async fn capture(&self, _operation: &str) -> anyhow::Result<PathBuf> {
        Ok(self.path.clone())
    }
}

/// 记录调用次数的捕获测试替身
struct CountingCapture {
    calls: AtomicU32,
    path: PathBuf,
}

impl CountingCapture {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            path: path.into(),
        }
    }
}

#[async_trait]
impl DiagnosticCapture for CountingCapture {
    async fn capture(&self, _operation: &str) -> anyhow::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.path.clone())
    }
}

struct FailingCapture;

#[async_trait]
impl DiagnosticCapture for FailingCapture {
    async fn capture(&self, _operation: &str) -> anyhow::Result<PathBuf> {
        anyhow::bail!("screenshot failed")
    }
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_transient_failures() {
    let hooks = RecordingHooks::default();
    let policy = RetryPolicy::standard();
    let calls = AtomicU32::new(0);
    let started = Instant::now();

    let value = run_with_retry(&policy, &hooks, &NoCapture, "flaky-fetch", || {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if call <= 2 {
                anyhow::bail!("NetworkError")
            }
            Ok(42)
        }
    })
    .await
    .expect("third attempt succeeds");

    assert_eq!(value, 42);
    // Success reported exactly once, with the attempt that produced it.
    assert_eq!(*hooks.successes.lock().unwrap(), vec![3]);
    // Two retries, with strictly increasing attempt numbers and the
    // default exponential delays.
    assert_eq!(*hooks.retries.lock().unwrap(), vec![(1, 1000), (2, 2000)]);
    assert!(hooks.failures.lock().unwrap().is_empty());
    // The two backoffs alone account for 3000ms.
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success_sleeps_never() {
    let hooks = RecordingHooks::default();
    let started = Instant::now();

    let value = run_with_retry(
        &RetryPolicy::standard(),
        &hooks,
        &NoCapture,
        "steady-fetch",
        || async { Ok("ok") },
    )
    .await
    .unwrap();

    assert_eq!(value, "ok");
    assert_eq!(*hooks.successes.lock().unwrap(), vec![1]);
    assert!(hooks.retries.lock().unwrap().is_empty());
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_surfaces_last_error() {
    let hooks = RecordingHooks::default();
    let policy = RetryPolicy::standard();
    let calls = AtomicU32::new(0);

    let result: Result<(), RetryError> =
        run_with_retry(&policy, &hooks, &NoCapture, "doomed-fetch", || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { anyhow::bail!("boom #{call}") }
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.attempts(), 3);
    // The wrapped error carries the identity of the final failure.
    assert!(error.last_cause().to_string().contains("boom #3"));

    assert!(hooks.successes.lock().unwrap().is_empty());
    assert_eq!(hooks.retries.lock().unwrap().len(), 2);
    let failures = hooks.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 3);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_path_reaches_hook_and_error() {
    let hooks = RecordingHooks::default();
    let capture = FakeCapture {
        path: PathBuf::from("final-error-doomed-20250825.png"),
    };

    let result: Result<(), RetryError> = run_with_retry(
        &RetryPolicy::standard(),
        &hooks,
        &capture,
        "doomed-fetch",
        || async { anyhow::bail!("boom") },
    )
    .await;

    let failures = hooks.failures.lock().unwrap();
    assert_eq!(
        failures[0].1.as_deref(),
        Some(Path::new("final-error-doomed-20250825.png"))
    );
    match result.unwrap_err() {
        RetryError::Exhausted { snapshot, .. } => {
            assert_eq!(
                snapshot.as_deref(),
                Some(Path::new("final-error-doomed-20250825.png"))
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_never_masks_operation_error() {
    let hooks = RecordingHooks::default();

    let result: Result<(), RetryError> = run_with_retry(
        &RetryPolicy::standard(),
        &hooks,
        &FailingCapture,
        "doomed-fetch",
        || async { anyhow::bail!("original failure") },
    )
    .await;

    let error = result.unwrap_err();
    assert!(error.last_cause().to_string().contains("original failure"));
    // A failed capture simply yields no snapshot.
    let failures = hooks.failures.lock().unwrap();
    assert_eq!(failures[0].1, None);
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_fails_immediately() {
    let hooks = RecordingHooks::default();
    let started = Instant::now();

    let result: Result<(), RetryError> = run_with_retry(
        &RetryPolicy::standard(),
        &hooks,
        &NoCapture,
        "bad-selector",
        || async {
            Err(anyhow::Error::from(BrowserError::Page(
                "card index out of range".to_string(),
            )))
        },
    )
    .await;

    // Attempts remained, but a non-retryable error ends the run at once.
    assert_eq!(result.unwrap_err().attempts(), 1);
    assert!(hooks.retries.lock().unwrap().is_empty());
    assert_eq!(hooks.failures.lock().unwrap().len(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_snapshot_on_failure_captures_plain_errors() {
    let capture = CountingCapture::new("final-error-collect-catalog-20250825.png");
    let error = anyhow::Error::from(BrowserError::Timeout("grid never appeared".to_string()));

    let snapshot = snapshot_on_failure(&capture, "collect-catalog", &error).await;

    assert_eq!(
        snapshot.as_deref(),
        Some(Path::new("final-error-collect-catalog-20250825.png"))
    );
    assert_eq!(capture.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_snapshot_on_failure_reuses_exhaustion_snapshot() {
    let capture = CountingCapture::new("should-not-be-written.png");
    let error = anyhow::Error::new(RetryError::Exhausted {
        operation: "load-catalog".to_string(),
        attempts: 3,
        snapshot: Some(PathBuf::from("final-error-load-catalog-20250825.png")),
        source: anyhow::anyhow!("NetworkError"),
    });

    let snapshot = snapshot_on_failure(&capture, "collect-catalog", &error).await;

    // The executor already captured on the exhaustion path; no second shot.
    assert_eq!(
        snapshot.as_deref(),
        Some(Path::new("final-error-load-catalog-20250825.png"))
    );
    assert_eq!(capture.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_snapshot_on_failure_tolerates_capture_failure() {
    let error = anyhow::anyhow!("collection loop failed");

    let snapshot = snapshot_on_failure(&FailingCapture, "collect-catalog", &error).await;

    assert_eq!(snapshot, None);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_never_retries() {
    let hooks = RecordingHooks::default();
    let policy = RetryPolicy {
        max_attempts: 1,
        ..RetryPolicy::standard()
    };

    let result: Result<(), RetryError> = run_with_retry(
        &policy,
        &hooks,
        &NoCapture,
        "one-shot",
        || async { anyhow::bail!("boom") },
    )
    .await;

    assert_eq!(result.unwrap_err().attempts(), 1);
    assert!(hooks.retries.lock().unwrap().is_empty());
    assert_eq!(hooks.failures.lock().unwrap().len(), 1);
}
