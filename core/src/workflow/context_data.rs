// grocer/src/workflow/context_data.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state threaded through every step of a workflow run.
///
/// Each handler receives a clone of the same `Arc`, so writes made by one step
/// are visible to the next.
///
/// IMPORTANT: guards returned by `read`/`write` are blocking `parking_lot`
/// guards. Drop them before any `.await`.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Moves an output slot out of the context, leaving `None` behind.
  pub fn take<U>(&self, slot: impl FnOnce(&mut T) -> &mut Option<U>) -> Option<U> {
    slot(&mut self.0.write()).take()
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Slots {
    out: Option<u32>,
  }

  #[test]
  fn take_empties_the_slot() {
    let ctx = ContextData::new(Slots::default());
    ctx.clone().write().out = Some(7);
    assert_eq!(ctx.take(|s| &mut s.out), Some(7));
    assert_eq!(ctx.take(|s| &mut s.out), None);
  }
}
