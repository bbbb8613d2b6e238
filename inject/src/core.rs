//! Core, non-public data structures for the registry.

use crate::error::{Error, Result};
use crate::lifecycle::Injector;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Any type that can be registered and resolved.
///
/// Implemented for every `Send + Sync + 'static` type, sized or not, so a
/// trait object such as `dyn Greeter` qualifies as long as the trait itself
/// requires `Send + Sync`.
pub trait Service: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Service for T {}

/// Identifies a service type inside a registry.
#[derive(Clone, Copy)]
pub(crate) struct ServiceKey {
  type_id: TypeId,
  name: &'static str,
}

impl ServiceKey {
  pub(crate) fn of<S: ?Sized + 'static>() -> Self {
    Self {
      type_id: TypeId::of::<S>(),
      name: type_name::<S>(),
    }
  }

  pub(crate) fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for ServiceKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.name)
  }
}

/// Whether a resolution targets the single provider or the provider set.
///
/// The two are tracked separately so that a single provider may aggregate
/// the set registered under the same service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ResolutionTarget {
  Single,
  Set,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct StackFrame {
  registry: u64,
  key: ServiceKey,
  target: ResolutionTarget,
}

thread_local! {
  // Services currently being resolved on this thread. A frame that is
  // already present means a provider is trying to build itself.
  static RESOLVING_STACK: RefCell<HashSet<StackFrame>> = RefCell::new(HashSet::new());
}

/// An RAII marker for an in-progress resolution.
///
/// Entering a frame that is already on this thread's stack fails with
/// [`Error::CircularResolution`]. Dropping the guard pops the frame, also
/// when a provider panics.
pub(crate) struct ResolutionGuard {
  frame: StackFrame,
}

impl ResolutionGuard {
  pub(crate) fn enter(registry: u64, key: ServiceKey, target: ResolutionTarget) -> Result<Self> {
    let frame = StackFrame {
      registry,
      key,
      target,
    };
    // Without the stack (thread teardown) the resolution runs unguarded.
    let inserted = RESOLVING_STACK
      .try_with(|stack| stack.borrow_mut().insert(frame))
      .unwrap_or(true);
    if !inserted {
      return Err(Error::CircularResolution {
        service: key.name(),
      });
    }
    Ok(Self { frame })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    // The stack may already be gone if this runs during thread teardown.
    let _ = RESOLVING_STACK.try_with(|stack| {
      stack.borrow_mut().remove(&self.frame);
    });
  }
}

/// Everything registered for one service type.
pub(crate) struct Entry<S: ?Sized> {
  pub(crate) single: Option<Injector<S>>,
  pub(crate) set: Vec<Injector<S>>,
}

impl<S: ?Sized> Default for Entry<S> {
  fn default() -> Self {
    Self {
      single: None,
      set: Vec::new(),
    }
  }
}

/// Type-erased storage slot holding an `Entry<S>`.
pub(crate) type ErasedEntry = Box<dyn Any + Send + Sync>;
