// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Context, Result};
use rayon::ThreadPool;
use std::fmt::Debug;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinHandle, time::sleep};
use tracing::{debug, error, warn};

/// Runs CPU bound compute jobs off the async runtime.
///
/// At most `max_tasks` jobs are in flight; further callers wait for a permit.
#[derive(Debug, Clone)]
pub struct ComputePool {
    semaphore: Arc<Semaphore>,
    thread_pool: Arc<ThreadPool>,
}

impl ComputePool {
    /// `threads` of `None` sizes the pool to the CPU count.
    pub fn new(threads: Option<usize>, max_tasks: usize) -> Result<ComputePool> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("privagator-compute-{i}"))
            .panic_handler(|payload| {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("Compute job panicked: {msg}");
            })
            .build()
            .context("Failed to build compute thread pool")?;

        Ok(Self {
            thread_pool: Arc::new(thread_pool),
            semaphore: Arc::new(Semaphore::new(max_tasks)),
        })
    }

    pub fn threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    /// Run `op` on the pool and wait for its output.
    ///
    /// The permit and the long job timer belong to the job, not to the
    /// caller: dropping the returned future leaves both held until `op`
    /// finishes.
    pub async fn spawn<OP, T: Debug + Send + 'static>(&self, task_name: String, op: OP) -> Result<T>
    where
        OP: FnOnce() -> T + Send + 'static,
    {
        // Limit the requests and get them to block
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("compute pool closed before '{task_name}' could start"))?;

        let timer = LongJobTimer::start(task_name);
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.thread_pool.spawn(move || {
            let output = op();
            drop(timer);
            drop(permit);
            if tx.send(output).is_err() {
                debug!("Compute job finished after its caller went away");
            }
        });

        rx.await
            .context("compute job panicked before returning a result")
    }
}

/// Logs jobs that run for too long. The timer stops when dropped.
struct LongJobTimer(JoinHandle<()>);

impl LongJobTimer {
    fn start(task_name: String) -> Self {
        Self(tokio::spawn(async move {
            sleep(Duration::from_secs(10)).await;
            warn!("Job '{}' has been running for more than 10 seconds", task_name);
            sleep(Duration::from_secs(20)).await;
            error!("Job '{}' has been running for more than 30 seconds", task_name);
        }))
    }
}

impl Drop for LongJobTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_runs_job_off_runtime() -> Result<()> {
        let pool = ComputePool::new(Some(2), 4)?;
        assert_eq!(pool.threads(), 2);
        let name = pool
            .spawn("name".to_string(), || {
                std::thread::current().name().map(str::to_string)
            })
            .await?;
        assert!(name.unwrap_or_default().starts_with("privagator-compute-"));
        Ok(())
    }

    #[tokio::test]
    async fn test_limits_in_flight_jobs() -> Result<()> {
        let pool = ComputePool::new(Some(4), 1)?;
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..4).map(|i| {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            async move {
                pool.spawn(format!("job-{i}"), move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    i
                })
                .await
            }
        });
        let results: Vec<usize> = spawn_all(jobs).await?;

        assert_eq!(results, vec![0, 1, 2, 3]);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_panicking_job_is_an_error() -> Result<()> {
        let pool = ComputePool::new(Some(1), 1)?;
        let result = pool
            .spawn("panics".to_string(), || -> u8 { panic!("boom") })
            .await;
        assert!(result.is_err());

        // the pool keeps working afterwards
        assert_eq!(pool.spawn("after".to_string(), || 5u8).await?, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_abandoned_job_keeps_its_permit() -> Result<()> {
        let pool = ComputePool::new(Some(1), 1)?;
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let call = pool.spawn("abandoned".to_string(), move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
        });
        let outcome = tokio::time::timeout(Duration::from_millis(50), call).await;
        assert!(outcome.is_err());

        // the caller is gone but the job is still running
        started_rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(pool.semaphore.available_permits(), 0);

        release_tx.send(())?;
        for _ in 0..200 {
            if pool.semaphore.available_permits() == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(pool.semaphore.available_permits(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_timer_stops_when_dropped() {
        let timer = LongJobTimer::start("short".to_string());
        let handle = timer.0.abort_handle();
        drop(timer);
        for _ in 0..200 {
            if handle.is_finished() {
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        assert!(handle.is_finished());
    }

    async fn spawn_all<F, T>(jobs: impl Iterator<Item = F>) -> Result<Vec<T>>
    where
        F: std::future::Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = jobs.map(tokio::spawn).collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.await??);
        }
        Ok(out)
    }
}
