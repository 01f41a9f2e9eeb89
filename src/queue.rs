//! Bounded concurrency queue for outbound Spotify requests.
//!
//! Work items are admitted up to a fixed ceiling; the rest wait in FIFO order
//! on a fair [`Semaphore`]. There is no priority, cancellation or
//! deduplication, and a failing item only affects its own caller.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::sync::Semaphore;

#[derive(Debug)]
struct Inner {
    permits: Semaphore,
    limit: usize,
    running: AtomicUsize,
    waiting: AtomicUsize,
}

/// Cheap to clone; clones share the same admission counter.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONCURRENCY)
    }
}

impl RequestQueue {
    pub const DEFAULT_CONCURRENCY: usize = 3;

    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            inner: Arc::new(Inner {
                permits: Semaphore::new(limit),
                limit,
                running: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
            }),
        }
    }

    /// Runs `task` once a slot is free and returns its output.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.inner.waiting.fetch_add(1, Ordering::SeqCst);
        // the semaphore is never closed, so acquiring cannot fail
        let _permit = self.inner.permits.acquire().await.ok();
        self.inner.waiting.fetch_sub(1, Ordering::SeqCst);

        // dropped before the permit, so `running` never overshoots the limit
        let _slot = Slot::enter(&self.inner.running);
        task.await
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Items currently admitted.
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Items waiting for admission.
    pub fn waiting(&self) -> usize {
        self.inner.waiting.load(Ordering::SeqCst)
    }
}

/// Keeps the running counter correct even if the task panics.
struct Slot<'a>(&'a AtomicUsize);

impl<'a> Slot<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Slot(counter)
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
