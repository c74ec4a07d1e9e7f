// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded pool for CPU-bound rendering.
//
// Each job holds a semaphore permit for as long as it runs on a blocking
// worker, so at most `workers` documents render at once and the async
// runtime stays free for verification traffic.

use std::sync::Arc;

use docguard_core::error::{DocguardError, Result};
use tokio::sync::Semaphore;
use tracing::debug;

/// Limits how many render jobs run concurrently.
#[derive(Clone)]
pub struct RenderPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl RenderPool {
    /// A pool of `workers` slots (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking worker once a slot is free.
    ///
    /// Dropping the returned future before the job starts gives the slot
    /// back; once started the job runs to completion and its output is
    /// discarded.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| DocguardError::Rendering("render pool closed".into()))?;
        debug!(available = self.available(), "render slot acquired");

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| DocguardError::Rendering(format!("render worker failed: {e}")))?
    }
}
