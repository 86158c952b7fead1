use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::hash::{compute_hash, meets_difficulty};
use super::DEFAULT_PROGRESS_INTERVAL;
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};

/// How many attempts a worker makes between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// The block fields a seal commits to, borrowed from the block being sealed.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    pub position: u64,
    pub previous_hash: &'a str,
    pub payload: &'a str,
    pub timestamp: i64,
}

impl Header<'_> {
    /// Hash of these fields at the given nonce.
    pub fn hash_with(&self, nonce: u64) -> String {
        compute_hash(
            self.position,
            self.previous_hash,
            self.payload,
            self.timestamp,
            nonce,
        )
    }
}

/// Winning nonce and the hash it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    pub nonce: u64,
    pub hash: String,
}

/// Parallel proof-of-work search over the nonce space.
///
/// Worker `k` of `W` tries nonces `k, k + W, k + 2W, ...`. The first worker
/// to hit a qualifying hash publishes it into a single-assignment slot and
/// raises the shared stop flag; its peers notice the flag before their next
/// hash and exit.
#[derive(Debug, Clone)]
pub struct Sealer {
    workers: usize,
    progress_interval: u64,
}

impl Default for Sealer {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl Sealer {
    /// Create a sealer with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.workers).with_progress_interval(config.progress_interval)
    }

    /// Emit a progress trace every `interval` attempts per worker.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Search until a nonce meeting `difficulty` is found. Blocks the caller
    /// and never returns if the difficulty is unreachable.
    pub fn seal(&self, header: &Header<'_>, difficulty: u32) -> Seal {
        loop {
            if let Some(seal) = self.search(header, difficulty, None) {
                return seal;
            }
        }
    }

    /// Like [`Sealer::seal`], but gives up once `budget` has elapsed.
    pub fn seal_within(
        &self,
        header: &Header<'_>,
        difficulty: u32,
        budget: Duration,
    ) -> Result<Seal> {
        let deadline = Instant::now() + budget;
        self.search(header, difficulty, Some(deadline)).ok_or_else(|| {
            warn!(
                "seal timed out: position={} difficulty={} budget={:?}",
                header.position, difficulty, budget
            );
            ChainError::SealTimeout {
                difficulty,
                budget_ms: budget.as_millis(),
            }
        })
    }

    /// Seal with an optional budget: bounded when `Some`, unbounded otherwise.
    pub fn seal_with_budget(
        &self,
        header: &Header<'_>,
        difficulty: u32,
        budget: Option<Duration>,
    ) -> Result<Seal> {
        match budget {
            Some(budget) => self.seal_within(header, difficulty, budget),
            None => Ok(self.seal(header, difficulty)),
        }
    }

    /// One round of the parallel search. Returns `None` only when the
    /// deadline elapsed first.
    fn search(
        &self,
        header: &Header<'_>,
        difficulty: u32,
        deadline: Option<Instant>,
    ) -> Option<Seal> {
        if difficulty == 0 {
            return Some(Seal {
                nonce: 0,
                hash: header.hash_with(0),
            });
        }

        debug!(
            "sealing position={} difficulty={} workers={}",
            header.position, difficulty, self.workers
        );

        let found = AtomicBool::new(false);
        let winner: OnceLock<Seal> = OnceLock::new();

        thread::scope(|scope| {
            for worker in 0..self.workers {
                let found = &found;
                let winner = &winner;
                scope.spawn(move || {
                    self.run_worker(worker, header, difficulty, deadline, found, winner)
                });
            }
        });

        let seal = winner.into_inner()?;
        debug!(
            "sealed position={} nonce={} hash={}",
            header.position, seal.nonce, seal.hash
        );
        Some(seal)
    }

    fn run_worker(
        &self,
        worker: usize,
        header: &Header<'_>,
        difficulty: u32,
        deadline: Option<Instant>,
        found: &AtomicBool,
        winner: &OnceLock<Seal>,
    ) {
        let stride = self.workers as u64;
        let mut nonce = worker as u64;
        let mut attempts: u64 = 0;

        while !found.load(Ordering::Acquire) {
            let hash = header.hash_with(nonce);
            attempts += 1;

            if meets_difficulty(&hash, difficulty) {
                // Only the first proposal is accepted; later ones are dropped.
                if winner.set(Seal { nonce, hash }).is_ok() {
                    trace!("worker {worker} won with nonce {nonce} after {attempts} attempts");
                }
                found.store(true, Ordering::Release);
                return;
            }

            if attempts % self.progress_interval == 0 {
                trace!("worker {worker}: {attempts} attempts, nonce {nonce}");
            }
            if attempts % DEADLINE_CHECK_INTERVAL == 0
                && deadline.is_some_and(|deadline| Instant::now() >= deadline)
            {
                return;
            }

            nonce = nonce.wrapping_add(stride);
        }
    }
}
