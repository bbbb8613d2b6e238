//! Scoped handles returned by resolution.

use crate::lifecycle::{Injector, Lifecycle, ReleaseFn};
use std::any::type_name;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Deref, Index};
use std::slice;
use std::sync::Arc;
use tracing::trace;

/// One consumer's claim on a resolved provider.
///
/// The handle dereferences to the service. It is deliberately not `Clone`:
/// each consumption site resolves its own handle, and dropping it runs the
/// injector's release hook exactly once with the provider it resolved. When
/// the injector has no release hook (singletons, thread-locals, most custom
/// injectors), dropping the handle only drops its reference.
pub struct Instance<S: ?Sized + 'static> {
  // `None` only while `drop` runs.
  provider: Option<Arc<S>>,
  release: Option<ReleaseFn<S>>,
  lifecycle: Lifecycle,
}

impl<S: ?Sized + 'static> Instance<S> {
  pub(crate) fn acquire(injector: &Injector<S>) -> Self {
    Self {
      provider: Some(injector.acquire()),
      release: injector.release_hook(),
      lifecycle: injector.lifecycle(),
    }
  }

  fn provider(&self) -> &Arc<S> {
    match &self.provider {
      Some(provider) => provider,
      None => unreachable!("provider of {} read after release", type_name::<S>()),
    }
  }

  /// The shared pointer to the provider. Ownership is not transferred.
  pub fn as_arc(&self) -> &Arc<S> {
    self.provider()
  }

  /// The lifecycle of the injector this handle was resolved from.
  pub fn lifecycle(&self) -> Lifecycle {
    self.lifecycle
  }

  /// Returns `true` if both handles point at the same provider.
  pub fn ptr_eq(this: &Self, other: &Self) -> bool {
    Arc::ptr_eq(this.provider(), other.provider())
  }
}

impl<S: ?Sized + 'static> Deref for Instance<S> {
  type Target = S;

  fn deref(&self) -> &S {
    self.provider()
  }
}

impl<S: ?Sized + 'static> AsRef<S> for Instance<S> {
  fn as_ref(&self) -> &S {
    self.provider()
  }
}

impl<S: ?Sized + 'static> Drop for Instance<S> {
  fn drop(&mut self) {
    let Some(provider) = self.provider.take() else {
      return;
    };
    match self.release.take() {
      Some(release) => {
        trace!(service = type_name::<S>(), lifecycle = ?self.lifecycle, "releasing provider");
        release(provider);
      }
      None => drop(provider),
    }
  }
}

impl<S: ?Sized + 'static> fmt::Debug for Instance<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Instance")
      .field("service", &type_name::<S>())
      .field("lifecycle", &self.lifecycle)
      .field("has_release", &self.release.is_some())
      .finish()
  }
}

/// The resolved providers of a service set, in registration order.
///
/// Dropping the set releases each element in that same order.
pub struct InstanceSet<S: ?Sized + 'static> {
  instances: Vec<Instance<S>>,
}

impl<S: ?Sized + 'static> InstanceSet<S> {
  pub(crate) fn acquire(injectors: &[Injector<S>]) -> Self {
    Self {
      instances: injectors.iter().map(Instance::acquire).collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.instances.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instances.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&S> {
    self.instances.get(index).map(|instance| &**instance)
  }

  /// The underlying handles, for pointer identity or lifecycle checks.
  pub fn instances(&self) -> &[Instance<S>] {
    &self.instances
  }

  /// Iterates the providers front to back; use `.rev()` for back to front.
  pub fn iter(&self) -> Iter<'_, S> {
    Iter {
      inner: self.instances.iter(),
    }
  }
}

impl<S: ?Sized + 'static> Index<usize> for InstanceSet<S> {
  type Output = S;

  fn index(&self, index: usize) -> &S {
    &self.instances[index]
  }
}

impl<'a, S: ?Sized + 'static> IntoIterator for &'a InstanceSet<S> {
  type Item = &'a S;
  type IntoIter = Iter<'a, S>;

  fn into_iter(self) -> Iter<'a, S> {
    self.iter()
  }
}

impl<S: ?Sized + 'static> Drop for InstanceSet<S> {
  fn drop(&mut self) {
    for instance in self.instances.drain(..) {
      drop(instance);
    }
  }
}

impl<S: ?Sized + 'static> fmt::Debug for InstanceSet<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.instances.iter()).finish()
  }
}

/// Iterator over the providers of an [`InstanceSet`].
pub struct Iter<'a, S: ?Sized + 'static> {
  inner: slice::Iter<'a, Instance<S>>,
}

impl<'a, S: ?Sized + 'static> Iterator for Iter<'a, S> {
  type Item = &'a S;

  fn next(&mut self) -> Option<&'a S> {
    self.inner.next().map(|instance| &**instance)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

impl<'a, S: ?Sized + 'static> DoubleEndedIterator for Iter<'a, S> {
  fn next_back(&mut self) -> Option<&'a S> {
    self.inner.next_back().map(|instance| &**instance)
  }
}

impl<S: ?Sized + 'static> ExactSizeIterator for Iter<'_, S> {}

impl<S: ?Sized + 'static> FusedIterator for Iter<'_, S> {}
