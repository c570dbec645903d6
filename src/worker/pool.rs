//! Worker pool management.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};

use crate::crypto::KeyDeriver;
use crate::identity::{Identity, IdentityPipeline};
use crate::matcher::Pattern;

use super::cpu::{CpuWorker, WorkerStats};
use super::throughput::{rate, Throughput};

/// Upper bound on how long the pool blocks before re-checking stop sources.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The identity that matched.
#[derive(Debug, Clone)]
pub struct VanityResult {
    pub identity: Identity,
    /// The ID of the worker that found this result
    pub worker_id: usize,
    /// Attempts made across all workers when the match was claimed
    pub attempts: u64,
}

/// Stop conditions of a search, checked between waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchBudget {
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u64>,
}

/// Why a search ended without a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop flag raised from outside, e.g. Ctrl-C
    Interrupted,
    TimedOut,
    AttemptsExhausted,
    /// A worker hit an error it could not skip
    Aborted,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found {
        result: VanityResult,
        elapsed: Duration,
    },
    Stopped {
        reason: StopReason,
        attempts: u64,
        elapsed: Duration,
    },
}

/// Manages a pool of workers searching for a matching identity.
pub struct WorkerPool {
    num_workers: usize,
    pattern: Pattern,
    budget: SearchBudget,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<VanityResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `num_workers` workers. They start searching immediately.
    pub fn new(
        num_workers: usize,
        pipeline: IdentityPipeline,
        pattern: Pattern,
        budget: SearchBudget,
    ) -> io::Result<Self> {
        let curve = pipeline.curve();
        Self::with_derivers(num_workers, pipeline, pattern, budget, move || {
            curve.deriver()
        })
    }

    /// Like [`WorkerPool::new`], with each worker's deriver built by
    /// `make_deriver`.
    pub fn with_derivers<F>(
        num_workers: usize,
        pipeline: IdentityPipeline,
        pattern: Pattern,
        budget: SearchBudget,
        make_deriver: F,
    ) -> io::Result<Self>
    where
        F: Fn() -> Box<dyn KeyDeriver>,
    {
        // Only the winning worker ever sends.
        let (result_tx, result_rx) = bounded(1);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let handles = Self::spawn_workers(
            num_workers,
            Arc::new(pipeline),
            &make_deriver,
            &pattern,
            result_tx,
            &stop_flag,
            &stats,
            budget.max_attempts,
        )?;

        Ok(Self {
            num_workers,
            pattern,
            budget,
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
        })
    }

    fn spawn_workers(
        num_workers: usize,
        pipeline: Arc<IdentityPipeline>,
        make_deriver: &dyn Fn() -> Box<dyn KeyDeriver>,
        pattern: &Pattern,
        result_tx: Sender<VanityResult>,
        stop_flag: &Arc<AtomicBool>,
        stats: &Arc<WorkerStats>,
        max_attempts: Option<u64>,
    ) -> io::Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                pipeline.clone(),
                make_deriver(),
                pattern.clone(),
                result_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
                max_attempts,
            );

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Relaxed);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        Ok(handles)
    }

    /// Waits for a result with timeout.
    ///
    /// Returns `Some(result)` if a match is found, `None` if timeout expires.
    pub fn wait_for_result(&self, timeout: Duration) -> Option<VanityResult> {
        self.result_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until the search ends, logging throughput once per
    /// `report_interval`. Workers are joined before a stop is reported.
    pub fn run(&mut self, report_interval: Duration) -> SearchOutcome {
        let mut throughput = Throughput::starting_at(report_interval, self.start_time);
        let deadline = self.budget.timeout.map(|t| self.start_time + t);

        loop {
            let now = Instant::now();
            let mut wait = throughput.remaining(now).min(POLL_INTERVAL);
            if let Some(deadline) = deadline {
                wait = wait.min(deadline.saturating_duration_since(now));
            }

            if let Some(result) = self.wait_for_result(wait) {
                return self.found(result);
            }

            let now = Instant::now();
            if let Some(rate) = throughput.tick(self.total_attempts(), now) {
                info!(
                    "{:.2} attempts/s over the last {}s ({} total)",
                    rate,
                    throughput.window().as_secs(),
                    self.total_attempts()
                );
            }

            let timed_out = deadline.is_some_and(|deadline| now >= deadline);
            if timed_out || self.is_stopped() {
                self.join_workers();
                if let Some(outcome) = self.drain_match() {
                    return outcome;
                }
                let reason = if timed_out {
                    StopReason::TimedOut
                } else {
                    self.stop_reason()
                };
                info!(?reason, "search stopped");
                return self.stopped(reason);
            }
        }
    }

    /// A match claimed while the pool was stopping. Only valid once the
    /// workers are joined, since a claimed match is sent before the
    /// winner exits.
    fn drain_match(&self) -> Option<SearchOutcome> {
        self.result_rx
            .try_recv()
            .ok()
            .map(|result| self.found(result))
    }

    fn stop_reason(&self) -> StopReason {
        if self.stats.is_aborted() {
            return StopReason::Aborted;
        }
        match self.budget.max_attempts {
            Some(max) if self.total_attempts() >= max => StopReason::AttemptsExhausted,
            _ => StopReason::Interrupted,
        }
    }

    fn found(&self, result: VanityResult) -> SearchOutcome {
        let elapsed = self.elapsed();
        info!(
            worker = result.worker_id,
            attempts = result.attempts,
            "match found in {:.2}s",
            elapsed.as_secs_f64()
        );
        SearchOutcome::Found { result, elapsed }
    }

    fn stopped(&self, reason: StopReason) -> SearchOutcome {
        SearchOutcome::Stopped {
            reason,
            attempts: self.total_attempts(),
            elapsed: self.elapsed(),
        }
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops and waits for all workers to complete.
    pub fn join(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
            debug!("all workers joined");
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Attempts made across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    /// Iterations skipped because the derived key was invalid for the curve.
    pub fn derivation_failures(&self) -> u64 {
        self.stats.derivation_failures()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average rate since the pool was created.
    pub fn attempts_per_second(&self) -> f64 {
        rate(self.total_attempts(), self.elapsed())
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use crate::account::{ChainId, ChainRegistry};
    use crate::crypto::{Curve, PrivateKey, PublicKey, Secp256k1Deriver};
    use crate::error::{Error, Result};
    use crate::mnemonic::Language;

    fn pipeline() -> IdentityPipeline {
        IdentityPipeline::new(Language::English, "", &ChainRegistry::default(), "MC", Curve::Secp256k1)
            .unwrap()
    }

    // Odds of 58^-9 per attempt, out of reach within any test budget.
    fn unreachable() -> Pattern {
        Pattern::public_key("zzzzzzzzz", 9).unwrap()
    }

    fn any_address() -> Pattern {
        Pattern::address("MC", ChainId::BASE, Curve::Secp256k1, 9).unwrap()
    }

    /// Fails the first calls shared across all its clones, then derives
    /// normally.
    struct FlakyDeriver {
        failures_left: Arc<AtomicUsize>,
        inner: Secp256k1Deriver,
    }

    impl KeyDeriver for FlakyDeriver {
        fn curve(&self) -> Curve {
            Curve::Secp256k1
        }

        fn derive_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey> {
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(Error::KeyDerivationFailed(self.curve().name()));
            }
            self.inner.derive_public_key(private_key)
        }
    }

    struct BrokenDeriver;

    impl KeyDeriver for BrokenDeriver {
        fn curve(&self) -> Curve {
            Curve::Secp256k1
        }

        fn derive_public_key(&self, _: &PrivateKey) -> Result<PublicKey> {
            Err(Error::PublicKeyMissing)
        }
    }

    #[test]
    fn test_fixed_prefix_matches_first_attempt() {
        let mut pool = WorkerPool::new(2, pipeline(), any_address(), SearchBudget::default()).unwrap();

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Found { result, .. } => {
                assert!(result.identity.address().to_string().starts_with("MC112n"));
                assert!(result.identity.is_mnemonic_valid());
                assert!(result.attempts >= 1);
                assert!(result.worker_id < 2);
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert!(pool.is_stopped());
        pool.join();
    }

    #[test]
    fn test_derivation_failures_are_skipped() {
        const FAILURES: usize = 3;
        let failures_left = Arc::new(AtomicUsize::new(FAILURES));
        let shared = failures_left.clone();

        let mut pool = WorkerPool::with_derivers(
            1,
            pipeline(),
            any_address(),
            SearchBudget::default(),
            move || {
                Box::new(FlakyDeriver {
                    failures_left: shared.clone(),
                    inner: Secp256k1Deriver::new(),
                })
            },
        )
        .unwrap();

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Found { result, .. } => {
                assert_eq!(result.attempts, FAILURES as u64 + 1);
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert_eq!(pool.derivation_failures(), FAILURES as u64);
        assert_eq!(failures_left.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unexpected_error_aborts_search() {
        let mut pool = WorkerPool::with_derivers(
            2,
            pipeline(),
            any_address(),
            SearchBudget::default(),
            || Box::new(BrokenDeriver),
        )
        .unwrap();

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Stopped { reason, .. } => assert_eq!(reason, StopReason::Aborted),
            other => panic!("expected an abort, got {other:?}"),
        }
        assert_eq!(pool.derivation_failures(), 0);
    }

    #[test]
    fn test_attempt_budget_stops_search() {
        let budget = SearchBudget {
            timeout: None,
            max_attempts: Some(3),
        };
        let mut pool = WorkerPool::new(2, pipeline(), unreachable(), budget).unwrap();

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Stopped {
                reason, attempts, ..
            } => {
                assert_eq!(reason, StopReason::AttemptsExhausted);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected budget stop, got {other:?}"),
        }
    }

    #[test]
    fn test_time_budget_stops_search() {
        let budget = SearchBudget {
            timeout: Some(Duration::from_millis(200)),
            max_attempts: None,
        };
        let mut pool = WorkerPool::new(1, pipeline(), unreachable(), budget).unwrap();

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Stopped { reason, .. } => assert_eq!(reason, StopReason::TimedOut),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(pool.is_stopped());
    }

    #[test]
    fn test_external_stop() {
        let mut pool = WorkerPool::new(1, pipeline(), unreachable(), SearchBudget::default()).unwrap();
        pool.stop_flag_clone().store(true, Ordering::Relaxed);

        match pool.run(Duration::from_secs(30)) {
            SearchOutcome::Stopped { reason, .. } => assert_eq!(reason, StopReason::Interrupted),
            other => panic!("expected interruption, got {other:?}"),
        }
    }
}
