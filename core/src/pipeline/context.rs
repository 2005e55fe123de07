// darkroom/src/pipeline/context.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state handed to every handler of a pipeline run.
///
/// Guards returned by [`read`](Self::read) and [`write`](Self::write) block and MUST be
/// dropped before the handler reaches an `.await`.
#[derive(Debug)]
pub struct StepContext<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> StepContext<T> {
  pub fn new(data: T) -> Self {
    StepContext(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Take the context data out once the run is over.
  ///
  /// Returns `Err(self)` while other clones (e.g. a handler still holding one) are alive.
  pub fn try_unwrap(self) -> Result<T, Self> {
    Arc::try_unwrap(self.0).map(RwLock::into_inner).map_err(StepContext)
  }
}

impl<T: Send + Sync + 'static> Clone for StepContext<T> {
  fn clone(&self) -> Self {
    StepContext(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for StepContext<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
