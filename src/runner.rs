//! Bounded concurrent scheduling of host workers.
//!
//! A [`Runner`] owns a counting semaphore sized to the configured
//! concurrency, the set of hosts it has already dispatched, and the sending
//! half of a bounded result queue. Every dispatched host becomes one tokio
//! task that holds a permit until its [`Finding`] has been accepted by the
//! queue, so a consumer that stops draining eventually stalls dispatch
//! instead of letting results pile up.
//!
//! The queue closes when the runner is [finished](Runner::finish) (or
//! dropped) and the last task has published its finding.

use crate::config::RunnerConfig;
use crate::error::Result;
use crate::util::{Visited, launch_delay};
use crate::worker::{Finding, Worker};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

/// Streaming scheduler for host workers.
///
/// # Example
///
/// ```rust,no_run
/// use dnsgrab::{Runner, RunnerConfig};
///
/// # async fn run() -> dnsgrab::Result<()> {
/// let (mut runner, mut findings) = Runner::new(RunnerConfig::default())?;
///
/// let consumer = tokio::spawn(async move {
///     while let Some(finding) = findings.next().await {
///         if !finding.is_empty() {
///             println!("{finding}");
///         }
///     }
/// });
///
/// runner.dispatch(["example.com", "example.org"]).await;
/// runner.dispatch(["example.net"]).await;
/// runner.finish().await;
/// consumer.await.ok();
/// # Ok(())
/// # }
/// ```
pub struct Runner {
    worker: Arc<Worker>,
    permits: Arc<Semaphore>,
    visited: Visited,
    results: mpsc::Sender<Finding>,
    tasks: JoinSet<()>,
}

/// Receiving half of a runner's result queue.
#[derive(Debug)]
pub struct Findings {
    rx: mpsc::Receiver<Finding>,
}

impl Findings {
    /// Waits for the next finding. Returns `None` once every dispatched
    /// host has been processed and the runner is finished.
    pub async fn next(&mut self) -> Option<Finding> {
        self.rx.recv().await
    }

    /// Drains the queue until it closes.
    pub async fn collect(mut self) -> Vec<Finding> {
        let mut findings = Vec::new();
        while let Some(finding) = self.rx.recv().await {
            findings.push(finding);
        }
        findings
    }

    /// Returns the underlying receiver.
    #[must_use]
    pub fn into_inner(self) -> mpsc::Receiver<Finding> {
        self.rx
    }
}

impl Runner {
    /// Creates a runner with the default network backends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// config does not validate.
    pub fn new(config: RunnerConfig) -> Result<(Self, Findings)> {
        Self::from_worker(Worker::new(config))
    }

    /// Creates a runner around an existing worker, bounded by the worker's
    /// configured concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// worker's config does not validate.
    pub fn from_worker(worker: Worker) -> Result<(Self, Findings)> {
        worker.config().validate()?;
        let limit = worker.config().concurrency;
        Ok(Self::with_limit(worker, limit))
    }

    fn with_limit(worker: Worker, limit: usize) -> (Self, Findings) {
        let (results, rx) = mpsc::channel(limit);
        let runner = Self {
            worker: Arc::new(worker),
            permits: Arc::new(Semaphore::new(limit)),
            visited: Visited::default(),
            results,
            tasks: JoinSet::new(),
        };
        (runner, Findings { rx })
    }

    /// Returns the runner's configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        self.worker.config()
    }

    /// Number of distinct hosts dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.visited.len()
    }

    /// Launches a worker for every host not seen before by this runner.
    ///
    /// Returns once the last host has been launched, not when it finishes.
    /// Each launch is preceded by the configured delay plus jitter and
    /// waits for a free concurrency permit. May be called repeatedly; all
    /// findings go to the same [`Findings`] queue.
    pub async fn dispatch<I, S>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for host in hosts {
            let host = host.as_ref();
            if !self.visited.insert(host) {
                tracing::debug!(host = %host, "Host already dispatched, skipping");
                continue;
            }

            let config = self.worker.config();
            let pause = launch_delay(config.delay, config.jitter);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            // The semaphore is never closed.
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                return;
            };

            let worker = Arc::clone(&self.worker);
            let results = self.results.clone();
            let host = host.to_string();
            self.tasks.spawn(async move {
                let finding = worker.work(&host).await;
                if results.send(finding).await.is_err() {
                    tracing::debug!(host = %host, "Findings receiver dropped");
                }
                drop(permit);
            });

            self.reap();
        }
    }

    /// Waits for every dispatched host to finish, then closes the queue.
    pub async fn finish(self) {
        let Self {
            mut tasks, results, ..
        } = self;
        drop(results);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Worker task failed");
            }
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Worker task failed");
            }
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", self.config())
            .field("dispatched", &self.visited.len())
            .field("in_flight", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

/// Processes one host with the default config and backends.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
/// default config does not validate.
pub async fn single(host: &str) -> Result<Finding> {
    single_with(&Worker::new(RunnerConfig::default()), host).await
}

/// Processes one host with `worker`, concurrency forced to 1.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
/// worker's config does not validate.
pub async fn single_with(worker: &Worker, host: &str) -> Result<Finding> {
    let config = worker.config().clone().with_concurrency(1);
    config.validate()?;
    Ok(worker.reconfigured(config).work(host).await)
}

/// Processes `hosts` concurrently with the default config and backends.
///
/// Duplicate host strings are dropped through the runner's visited set,
/// so the result can hold fewer findings than there were inputs.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
/// default config does not validate.
pub async fn multiple<I, S>(hosts: I) -> Result<Vec<Finding>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    multiple_with(&Worker::new(RunnerConfig::default()), hosts).await
}

/// Processes `hosts` with `worker` and returns every finding once all are
/// done. Concurrency is `min(configured, hosts.len())`. Finding order is
/// unspecified.
///
/// Each distinct host string is processed once. Repeats are dropped through
/// the visited set and yield no finding of their own, so the result can be
/// shorter than `hosts`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
/// worker's config does not validate.
pub async fn multiple_with<I, S>(worker: &Worker, hosts: I) -> Result<Vec<Finding>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    worker.config().validate()?;
    let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
    if hosts.is_empty() {
        return Ok(Vec::new());
    }

    let limit = worker.config().concurrency.min(hosts.len());
    let config = worker.config().clone().with_concurrency(limit);
    let (mut runner, findings) = Runner::with_limit(worker.reconfigured(config), limit);

    let produce = async move {
        runner.dispatch(&hosts).await;
        runner.finish().await;
    };
    let ((), findings) = tokio::join!(produce, findings.collect());
    Ok(findings)
}
