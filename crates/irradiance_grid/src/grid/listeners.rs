//! Transform change listeners keyed by registration token.

use std::collections::BTreeMap;

use crate::transform::GridTransform;

/// Returned by [`TransformListeners::register`]; pass it back to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

type Listener = Box<dyn FnMut(&GridTransform) + Send>;

/// Callbacks run whenever the grid transform changes, in registration order.
#[derive(Default)]
pub struct TransformListeners {
  next_id: u64,
  listeners: BTreeMap<u64, Listener>,
}

impl TransformListeners {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<F>(&mut self, listener: F) -> ListenerToken
  where
    F: FnMut(&GridTransform) + Send + 'static,
  {
    let id = self.next_id;
    self.next_id += 1;
    self.listeners.insert(id, Box::new(listener));
    ListenerToken(id)
  }

  /// Returns `false` if the token was already removed.
  pub fn unregister(&mut self, token: ListenerToken) -> bool {
    self.listeners.remove(&token.0).is_some()
  }

  pub fn notify(&mut self, transform: &GridTransform) {
    for listener in self.listeners.values_mut() {
      listener(transform);
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.listeners.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.listeners.is_empty()
  }
}

impl std::fmt::Debug for TransformListeners {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TransformListeners")
      .field("next_id", &self.next_id)
      .field("registered", &self.listeners.len())
      .finish()
  }
}
