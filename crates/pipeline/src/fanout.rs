//! Concurrent fan-out under a time budget and a cancellation token
//!
//! Every task gets its own timeout. All tasks share one token; cancelling it
//! resolves every pending task to `Error::Cancelled` and drops the in-flight
//! request futures.

use futures::future::{join_all, BoxFuture};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use voice_tutor_core::{Error, Result};

/// Run `fut` until it completes, `budget` elapses, or `cancel` fires
pub async fn guarded<T, F>(budget: Duration, cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        outcome = tokio::time::timeout(budget, fut) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(budget)),
        },
    }
}

/// One unit of fan-out work
pub struct FanOutTask<'a, T> {
    /// Name used in logs
    pub label: &'static str,
    pub budget: Duration,
    pub future: BoxFuture<'a, Result<T>>,
}

impl<'a, T> FanOutTask<'a, T> {
    pub fn new(label: &'static str, budget: Duration, future: BoxFuture<'a, Result<T>>) -> Self {
        Self {
            label,
            budget,
            future,
        }
    }
}

/// Run every task concurrently and return their results in input order
pub async fn fan_out<'a, T>(
    tasks: Vec<FanOutTask<'a, T>>,
    cancel: &CancellationToken,
) -> Vec<Result<T>> {
    join_all(tasks.into_iter().map(|task| async move {
        let start = Instant::now();
        let result = guarded(task.budget, cancel, task.future).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(task = task.label, elapsed_ms, "Fan-out task finished"),
            Err(e) => tracing::debug!(
                task = task.label,
                elapsed_ms,
                error = %e,
                "Fan-out task failed"
            ),
        }
        result
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let cancel = CancellationToken::new();
        let tasks = vec![
            FanOutTask::new(
                "slow",
                Duration::from_secs(1),
                async {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok::<_, Error>("slow")
                }
                .boxed(),
            ),
            FanOutTask::new("fast", Duration::from_secs(1), async { Ok::<_, Error>("fast") }.boxed()),
        ];

        let results = fan_out(tasks, &cancel).await;
        assert_eq!(results, vec![Ok("slow"), Ok("fast")]);
    }

    #[tokio::test]
    async fn test_runs_concurrently() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let tasks: Vec<FanOutTask<'_, ()>> = (0..2)
            .map(|_| {
                FanOutTask::new(
                    "sleep",
                    Duration::from_secs(1),
                    async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok::<_, Error>(())
                    }
                    .boxed(),
                )
            })
            .collect();

        fan_out(tasks, &cancel).await;
        assert!(start.elapsed() < Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_timeout_is_per_task() {
        let cancel = CancellationToken::new();
        let tasks = vec![
            FanOutTask::new(
                "hangs",
                Duration::from_millis(20),
                futures::future::pending::<Result<u8>>().boxed(),
            ),
            FanOutTask::new("ok", Duration::from_millis(20), async { Ok::<_, Error>(7) }.boxed()),
        ];

        let results = fan_out(tasks, &cancel).await;
        assert_eq!(results[0], Err(Error::Timeout(Duration::from_millis(20))));
        assert_eq!(results[1], Ok(7));
    }

    #[tokio::test]
    async fn test_cancellation_stops_pending_tasks() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let tasks = vec![
            FanOutTask::new(
                "a",
                Duration::from_secs(10),
                futures::future::pending::<Result<u8>>().boxed(),
            ),
            FanOutTask::new(
                "b",
                Duration::from_secs(10),
                futures::future::pending::<Result<u8>>().boxed(),
            ),
        ];

        let start = Instant::now();
        let results = fan_out(tasks, &cancel).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(results.iter().all(|r| *r == Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_passes_errors_through() {
        let cancel = CancellationToken::new();
        let result: Result<()> = guarded(Duration::from_secs(1), &cancel, async {
            Err(Error::provider(500, "down"))
        })
        .await;
        assert_eq!(result, Err(Error::provider(500, "down")));
    }
}
