//! CPU worker running the vanity search loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, error};

use crate::crypto::KeyDeriver;
use crate::error::Error;
use crate::identity::IdentityPipeline;
use crate::matcher::Pattern;
use crate::mnemonic::{Entropy, STANDARD_ENTROPY_LEN};

use super::VanityResult;

/// Counters shared by all workers of a search.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Identities derived, or attempted
    attempts: AtomicU64,
    /// Iterations whose key derivation failed
    derivation_failures: AtomicU64,
    /// Set by the single worker that claims the match
    found: AtomicBool,
    /// Set when a worker quit on an error it cannot skip
    aborted: AtomicBool,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn derivation_failures(&self) -> u64 {
        self.derivation_failures.load(Ordering::Relaxed)
    }

    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Counts one attempt, unless `budget` attempts were already made.
    fn reserve_attempt(&self, budget: Option<u64>) -> bool {
        self.attempts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| match budget {
                Some(max) if n >= max => None,
                _ => Some(n + 1),
            })
            .is_ok()
    }

    /// First caller wins.
    fn claim_match(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// A CPU worker that derives identities and tests them against the pattern.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    pipeline: Arc<IdentityPipeline>,
    deriver: Box<dyn KeyDeriver>,
    /// The pattern to match against
    pattern: Pattern,
    /// Channel to send the match
    result_tx: Sender<VanityResult>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    max_attempts: Option<u64>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        pipeline: Arc<IdentityPipeline>,
        deriver: Box<dyn KeyDeriver>,
        pattern: Pattern,
        result_tx: Sender<VanityResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
        max_attempts: Option<u64>,
    ) -> Self {
        Self {
            id,
            pipeline,
            deriver,
            pattern,
            result_tx,
            stop_flag,
            stats,
            max_attempts,
        }
    }

    /// Runs the worker loop until:
    /// - this or another worker claims a match
    /// - the stop flag is set
    /// - the shared attempt budget is spent
    ///
    /// The stop flag is checked once per iteration. Every iteration costs a
    /// full key stretch, so batching buys nothing here.
    pub fn run(&self) {
        let mut rng = rand::thread_rng();
        debug!(worker = self.id, "worker started");

        while !self.stop_flag.load(Ordering::Relaxed) {
            if !self.stats.reserve_attempt(self.max_attempts) {
                debug!(worker = self.id, "attempt budget spent");
                self.stop_flag.store(true, Ordering::Relaxed);
                break;
            }

            let identity = match Entropy::random(&mut rng, STANDARD_ENTROPY_LEN)
                .and_then(|entropy| self.pipeline.derive_with(entropy, self.deriver.as_ref()))
            {
                Ok(identity) => identity,
                Err(Error::KeyDerivationFailed(curve)) => {
                    self.stats
                        .derivation_failures
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(worker = self.id, curve, "key derivation failed, skipping");
                    continue;
                }
                Err(e) => {
                    error!(worker = self.id, "search aborted: {e}");
                    self.stats.aborted.store(true, Ordering::Release);
                    self.stop_flag.store(true, Ordering::Relaxed);
                    break;
                }
            };

            if !self.pattern.matches(&identity).is_match() {
                continue;
            }

            if self.stats.claim_match() {
                let result = VanityResult {
                    identity,
                    worker_id: self.id,
                    attempts: self.stats.total_attempts(),
                };
                self.stop_flag.store(true, Ordering::Relaxed);
                // Receiver gone means the pool is shutting down.
                let _ = self.result_tx.send(result);
            }
            break;
        }

        debug!(worker = self.id, "worker stopped");
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.id
    }
}
