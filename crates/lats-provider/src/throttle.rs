//! Outbound request throttling.
//!
//! [`Throttler`] is an admission-control queue: submitted calls wait in FIFO
//! order, are admitted in batches of at most `max_concurrent`, and each
//! admitted call pauses for `inter_request_delay` before it reaches the store.
//! The next batch is only admitted once every call of the current one has
//! finished, successfully or not. A failing call never cancels its siblings
//! and never stalls the queue.
//!
//! [`ThrottledStore`] routes every [`RemoteStore`] call through a throttler.

use std::{
  collections::VecDeque,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use lats_core::store::{Filter, RemoteStore, Row, Rows, Select, StoreError};
use tokio::sync::oneshot;
use tracing::trace;

use crate::config::ThrottleConfig;

// ─── Throttler ───────────────────────────────────────────────────────────────

/// Held by an admitted call. Dropping it tells the dispatcher the call has
/// finished, whether it completed, failed, or was cancelled.
struct Slot {
  _done: oneshot::Sender<()>,
}

#[derive(Default)]
struct Queue {
  waiting:    VecDeque<oneshot::Sender<Slot>>,
  processing: bool,
}

struct Inner {
  max_concurrent: usize,
  delay:          Duration,
  queue:          Mutex<Queue>,
}

/// A shared admission-control queue. Cloning is cheap and clones share the
/// same queue.
#[derive(Clone)]
pub struct Throttler {
  inner: Option<Arc<Inner>>,
}

impl Throttler {
  pub fn new(config: &ThrottleConfig) -> Self {
    Self {
      inner: Some(Arc::new(Inner {
        max_concurrent: config.max_concurrent.max(1),
        delay:          config.inter_request_delay(),
        queue:          Mutex::new(Queue::default()),
      })),
    }
  }

  /// A throttler that admits everything immediately, for tests and tools.
  pub fn passthrough() -> Self { Self { inner: None } }

  /// Number of calls waiting for admission.
  pub fn pending(&self) -> usize {
    self
      .inner
      .as_ref()
      .map_or(0, |inner| inner.lock().waiting.len())
  }

  /// Run `task` once admitted and return its output unchanged.
  pub async fn execute<F, Fut, T>(&self, task: F) -> T
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
  {
    let Some(inner) = &self.inner else {
      return task().await;
    };

    let (admit, admitted) = oneshot::channel();
    let start_dispatcher = {
      let mut queue = inner.lock();
      queue.waiting.push_back(admit);
      !std::mem::replace(&mut queue.processing, true)
    };
    if start_dispatcher {
      tokio::spawn(Arc::clone(inner).dispatch());
    }

    // The dispatcher only drops a waiter after handing it a slot, so a
    // closed channel means it is gone; run unthrottled rather than hang.
    let slot = admitted.await.ok();
    tokio::time::sleep(inner.delay).await;
    let output = task().await;
    drop(slot);
    output
  }
}

impl Inner {
  fn lock(&self) -> std::sync::MutexGuard<'_, Queue> {
    self.queue.lock().unwrap_or_else(PoisonError::into_inner)
  }

  async fn dispatch(self: Arc<Self>) {
    loop {
      let batch: Vec<_> = {
        let mut queue = self.lock();
        if queue.waiting.is_empty() {
          queue.processing = false;
          return;
        }
        let n = self.max_concurrent.min(queue.waiting.len());
        queue.waiting.drain(..n).collect()
      };

      trace!(size = batch.len(), "admitting batch");
      let mut in_flight = Vec::with_capacity(batch.len());
      for admit in batch {
        let (done, finished) = oneshot::channel();
        // A waiter that went away before admission simply loses its turn.
        if admit.send(Slot { _done: done }).is_ok() {
          in_flight.push(finished);
        }
      }
      for finished in in_flight {
        let _ = finished.await;
      }
    }
  }
}

// ─── ThrottledStore ──────────────────────────────────────────────────────────

/// A [`RemoteStore`] decorator that sends every call through a [`Throttler`].
pub struct ThrottledStore<S> {
  inner:     S,
  throttler: Throttler,
}

impl<S> ThrottledStore<S> {
  pub fn new(inner: S, throttler: Throttler) -> Self { Self { inner, throttler } }

  pub fn inner(&self) -> &S { &self.inner }

  pub fn throttler(&self) -> &Throttler { &self.throttler }

  pub fn set_throttler(&mut self, throttler: Throttler) { self.throttler = throttler; }
}

impl<S: RemoteStore> RemoteStore for ThrottledStore<S> {
  async fn select(&self, table: &str, query: &Select) -> Result<Rows, StoreError> {
    self
      .throttler
      .execute(|| self.inner.select(table, query))
      .await
  }

  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
    self
      .throttler
      .execute(|| self.inner.insert(table, rows))
      .await
  }

  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
    self
      .throttler
      .execute(|| self.inner.update(table, patch, filters))
      .await
  }

  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
    self
      .throttler
      .execute(|| self.inner.delete(table, filters))
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
  };

  use futures::future::join_all;

  use super::*;

  fn throttler(max_concurrent: usize, delay_ms: u64) -> Throttler {
    Throttler::new(&ThrottleConfig {
      max_concurrent,
      inter_request_delay_ms: delay_ms,
    })
  }

  #[tokio::test]
  async fn never_exceeds_max_concurrent_and_paces_batches() {
    let t         = throttler(2, 20);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak      = Arc::new(AtomicUsize::new(0));
    let k         = 7;

    let started = Instant::now();
    let tasks = (0..k).map(|i| {
      let t         = t.clone();
      let in_flight = Arc::clone(&in_flight);
      let peak      = Arc::clone(&peak);
      async move {
        t.execute(|| async move {
          let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
          peak.fetch_max(now, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(5)).await;
          in_flight.fetch_sub(1, Ordering::SeqCst);
          i
        })
        .await
      }
    });
    let results = join_all(tasks).await;

    assert_eq!(results, (0..k).collect::<Vec<_>>());
    assert!(peak.load(Ordering::SeqCst) <= 2);
    // ceil(7 / 2) batches, each paying the delay at least once.
    assert!(started.elapsed() >= Duration::from_millis(4 * 20));
  }

  #[tokio::test]
  async fn failing_task_does_not_stall_the_queue() {
    let t = throttler(2, 1);
    let outcomes = join_all((0..5).map(|i| {
      let t = t.clone();
      async move {
        t.execute(|| async move { if i == 1 { Err(i) } else { Ok(i) } })
          .await
      }
    }))
    .await;

    assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 4);
    assert_eq!(t.pending(), 0);
  }

  #[tokio::test]
  async fn cancelled_waiter_loses_its_turn() {
    let t = throttler(1, 10);
    let blocked = t.clone();
    let first = tokio::spawn(async move { blocked.execute(|| async { 1 }).await });

    // Give up on a queued call before it is admitted.
    let abandoned = tokio::time::timeout(
      Duration::from_millis(1),
      t.execute(|| async { 2 }),
    )
    .await;
    assert!(abandoned.is_err());

    assert_eq!(first.await.unwrap(), 1);
    assert_eq!(t.execute(|| async { 3 }).await, 3);
  }

  #[tokio::test]
  async fn passthrough_runs_immediately() {
    let t = Throttler::passthrough();
    let started = Instant::now();
    assert_eq!(t.execute(|| async { 42 }).await, 42);
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(t.pending(), 0);
  }
}
