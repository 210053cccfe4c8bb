//! Compensating-action sagas over the non-transactional store.
//!
//! A [`Saga`] records a compensation for every forward step that succeeds.
//! When a later step fails, the recorded compensations run newest first and
//! the original failure is handed back to the caller. A compensation that
//! itself fails is logged and skipped; it never replaces the original error.

use std::{fmt, future::Future, pin::Pin};

use lats_core::store::StoreError;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// Undo action for one completed forward step.
pub type Compensation<'a> = Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;

/// Where an orchestrated write currently is.
///
/// ```text
/// Validating → ParentWriting → ParentWritten → DependentsWriting → Committed
///      │             │                               │
///      └──── Failed ─┘                               └→ RollingBack → RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
  Validating,
  ParentWriting,
  ParentWritten,
  DependentsWriting,
  Committed,
  RollingBack,
  RolledBack,
  Failed,
}

impl WriteState {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
  }
}

impl fmt::Display for WriteState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Validating => "validating",
      Self::ParentWriting => "parent-writing",
      Self::ParentWritten => "parent-written",
      Self::DependentsWriting => "dependents-writing",
      Self::Committed => "committed",
      Self::RollingBack => "rolling-back",
      Self::RolledBack => "rolled-back",
      Self::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// One orchestrated multi-step write.
///
/// Dropping a saga without calling [`Saga::commit`] or [`Saga::fail`] leaves
/// its compensations unrun.
pub struct Saga<'a> {
  name:          &'static str,
  state:         WriteState,
  compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
  pub fn new(name: &'static str) -> Self {
    debug!(saga = name, state = %WriteState::Validating, "saga started");
    Self { name, state: WriteState::Validating, compensations: Vec::new() }
  }

  pub fn state(&self) -> WriteState { self.state }

  /// Move to `next`, logging the transition.
  pub fn enter(&mut self, next: WriteState) {
    debug!(saga = self.name, from = %self.state, to = %next, "saga transition");
    self.state = next;
  }

  /// Run a forward step. On success `undo` is asked for the compensation of
  /// what was just written; on failure the saga rolls back and the store
  /// error comes back labelled with `context`.
  pub async fn step<T, Fut, U>(&mut self, context: &'static str, forward: Fut, undo: U) -> Result<T>
  where
    Fut: Future<Output = Result<T, StoreError>>,
    U: FnOnce(&T) -> Compensation<'a>,
  {
    match forward.await {
      Ok(value) => {
        self.compensations.push((context, undo(&value)));
        Ok(value)
      }
      Err(source) => Err(self.fail(Error::Remote { context, source }).await),
    }
  }

  /// Run a forward step that needs no compensation of its own.
  pub async fn run<T, Fut>(&mut self, context: &'static str, forward: Fut) -> Result<T>
  where
    Fut: Future<Output = Result<T, StoreError>>,
  {
    match forward.await {
      Ok(value) => Ok(value),
      Err(source) => Err(self.fail(Error::Remote { context, source }).await),
    }
  }

  /// Register a compensation for work done outside [`Saga::step`].
  pub fn compensate(&mut self, label: &'static str, undo: Compensation<'a>) {
    self.compensations.push((label, undo));
  }

  /// Undo everything recorded so far, newest first, and return `err`.
  pub async fn fail(&mut self, err: Error) -> Error {
    if self.compensations.is_empty() {
      self.enter(WriteState::Failed);
      return err;
    }

    self.enter(WriteState::RollingBack);
    warn!(saga = self.name, error = %err, steps = self.compensations.len(), "rolling back");
    while let Some((label, undo)) = self.compensations.pop() {
      match undo.await {
        Ok(()) => debug!(saga = self.name, step = label, "compensated"),
        Err(e) => error!(
          saga = self.name,
          step = label,
          code = %e.code,
          "compensation failed: {}",
          e.message
        ),
      }
    }
    self.enter(WriteState::RolledBack);
    err
  }

  /// Finish successfully, discarding the recorded compensations.
  pub fn commit(mut self) {
    self.compensations.clear();
    self.enter(WriteState::Committed);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  type Log = Arc<Mutex<Vec<&'static str>>>;

  fn undo(log: &Log, label: &'static str, ok: bool) -> Compensation<'static> {
    let log = Arc::clone(log);
    Box::pin(async move {
      log.lock().unwrap().push(label);
      if ok { Ok(()) } else { Err(StoreError::unavailable("offline")) }
    })
  }

  #[tokio::test]
  async fn compensations_run_in_reverse() {
    let log = Log::default();
    let mut saga = Saga::new("test");
    saga.enter(WriteState::ParentWriting);

    saga
      .step("first", async { Ok::<_, StoreError>(1) }, |_| undo(&log, "undo first", true))
      .await
      .unwrap();
    saga
      .step("second", async { Ok::<_, StoreError>(2) }, |_| undo(&log, "undo second", true))
      .await
      .unwrap();
    let err = saga
      .run::<(), _>("third", async { Err(StoreError::unique_violation("dup")) })
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Remote { context: "third", .. }));
    assert_eq!(*log.lock().unwrap(), ["undo second", "undo first"]);
    assert_eq!(saga.state(), WriteState::RolledBack);
  }

  #[tokio::test]
  async fn failed_compensation_keeps_original_error() {
    let log = Log::default();
    let mut saga = Saga::new("test");
    saga
      .step("parent", async { Ok::<_, StoreError>(()) }, |_| undo(&log, "undo parent", false))
      .await
      .unwrap();

    let err = saga
      .run::<(), _>("children", async { Err(StoreError::permission_denied("rls")) })
      .await
      .unwrap_err();

    assert_eq!(err.store_error().map(|e| e.code.as_str()), Some("42501"));
    assert_eq!(*log.lock().unwrap(), ["undo parent"]);
  }

  #[tokio::test]
  async fn failure_before_any_write_is_terminal() {
    let mut saga = Saga::new("test");
    let err = saga
      .run::<(), _>("parent", async { Err(StoreError::unavailable("down")) })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Remote { .. }));
    assert_eq!(saga.state(), WriteState::Failed);
    assert!(saga.state().is_terminal());
  }

  #[tokio::test]
  async fn commit_discards_compensations() {
    let log = Log::default();
    let mut saga = Saga::new("test");
    saga
      .step("parent", async { Ok::<_, StoreError>(()) }, |_| undo(&log, "undo parent", true))
      .await
      .unwrap();
    saga.commit();
    assert!(log.lock().unwrap().is_empty());
  }
}
