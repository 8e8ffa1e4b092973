use crate::agents::runtime::RuntimeError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default upper bound on a single framework execution.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of framework jobs allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Failure of a job submitted to the [`JobExecutor`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Execution timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Executor is shut down")]
    Closed,
}

/// Concurrency limit plus timeout wrapper for framework jobs.
///
/// A job holds its slot only while its future is alive. On timeout the
/// future is dropped, which frees the slot and drops whatever the job owns,
/// including its framework process.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl Default for JobExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTION_TIMEOUT, DEFAULT_MAX_CONCURRENT)
    }
}

impl JobExecutor {
    /// Create an executor; `max_concurrent` is clamped to at least one.
    pub fn new(timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Jobs that could start right now without waiting.
    pub fn idle_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` once a slot is free, bounded by the timeout.
    ///
    /// Waiting for a free slot counts against the timeout.
    pub async fn run<T, F>(&self, job: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T, RuntimeError>>,
    {
        let work = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ExecutionError::Closed)?;

            job.await.map_err(ExecutionError::from)
        };

        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| ExecutionError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_job_value() {
        let executor = JobExecutor::default();

        let value = executor
            .run(async { Ok::<_, RuntimeError>(21 * 2) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(executor.idle_slots(), DEFAULT_MAX_CONCURRENT);
    }

    #[tokio::test]
    async fn test_run_propagates_runtime_error() {
        let executor = JobExecutor::default();

        let err = executor
            .run(async { Err::<(), _>(RuntimeError::Failed("quota exceeded".to_string())) })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_run_times_out_and_frees_slot() {
        let executor = JobExecutor::new(Duration::from_millis(50), 1);

        let err = executor
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, RuntimeError>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err, ExecutionError::Timeout(Duration::from_millis(50)));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(executor.idle_slots(), 1);

        let value = executor
            .run(async { Ok::<_, RuntimeError>("next") })
            .await
            .unwrap();
        assert_eq!(value, "next");
    }

    #[tokio::test]
    async fn test_waiting_for_slot_counts_against_timeout() {
        let executor = JobExecutor::new(Duration::from_millis(200), 1);
        let busy = executor.clone();

        let holder = tokio::spawn(async move {
            busy.run(async {
                tokio::time::sleep(Duration::from_millis(120)).await;
                Ok::<_, RuntimeError>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = executor
            .run(async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                Ok::<_, RuntimeError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Timeout(_)));
        assert!(holder.await.unwrap().is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let executor = JobExecutor::new(Duration::from_secs(1), 0);
        assert_eq!(executor.idle_slots(), 1);
    }
}
