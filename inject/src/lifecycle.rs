//! Lifecycle policies and the injectors that implement them.

use crate::core::Service;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

pub(crate) type AcquireFn<S> = Arc<dyn Fn() -> Arc<S> + Send + Sync>;
pub(crate) type ReleaseFn<S> = Arc<dyn Fn(Arc<S>) + Send + Sync>;

/// How many provider instances exist and how long each one lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
  /// A new provider is constructed on every resolution and destroyed when
  /// the handle that resolved it is dropped.
  Transient,
  /// One provider is constructed on first resolution and shared by every
  /// later one for as long as the registration exists.
  Singleton,
  /// Like `Singleton`, but each thread gets its own provider.
  ThreadLocal,
  /// Acquisition and release are entirely caller-defined.
  Custom,
}

/// Which consumer API a registration serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsumerMode {
  /// Served by `Registry::resolve`. At most one per service.
  #[default]
  Single,
  /// Served by `Registry::resolve_all`. Appended in registration order.
  Set,
  /// Registered for both of the above.
  Both,
}

impl ConsumerMode {
  pub(crate) fn includes_single(self) -> bool {
    matches!(self, ConsumerMode::Single | ConsumerMode::Both)
  }

  pub(crate) fn includes_set(self) -> bool {
    matches!(self, ConsumerMode::Set | ConsumerMode::Both)
  }
}

/// A provider factory for the service `S`.
///
/// An injector pairs a mandatory `acquire` function, which hands out a
/// provider, with an optional `release` function, which is given that same
/// provider back when the consumer's handle goes out of scope.
///
/// The built-in lifecycles are available through [`Injector::transient`],
/// [`Injector::singleton`], [`Injector::thread_local`] and
/// [`Injector::instance`]. Anything else (pools, round robin, one provider
/// behind several interfaces) is a custom injector built with
/// [`Injector::new`] and, optionally, [`Injector::with_release`].
///
/// # Examples
///
/// ```
/// use fibre_inject::{Injector, Lifecycle};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///   fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///   fn now(&self) -> u64 {
///     42
///   }
/// }
///
/// let shared: Arc<dyn Clock> = Arc::new(FixedClock);
/// let injector = Injector::<dyn Clock>::new(move || Arc::clone(&shared))
///   .with_release(|clock| println!("returned clock at {}", clock.now()));
///
/// assert_eq!(injector.lifecycle(), Lifecycle::Custom);
/// assert!(injector.has_release());
/// ```
pub struct Injector<S: ?Sized> {
  acquire: AcquireFn<S>,
  release: Option<ReleaseFn<S>>,
  lifecycle: Lifecycle,
}

impl<S: ?Sized + Service> Injector<S> {
  /// Creates a custom injector from an acquire function, with no release hook.
  pub fn new(acquire: impl Fn() -> Arc<S> + Send + Sync + 'static) -> Self {
    Self {
      acquire: Arc::new(acquire),
      release: None,
      lifecycle: Lifecycle::Custom,
    }
  }

  /// Attaches a release hook, run once per resolved handle on drop.
  pub fn with_release(mut self, release: impl Fn(Arc<S>) + Send + Sync + 'static) -> Self {
    self.release = Some(Arc::new(release));
    self
  }

  /// Builds an injector that calls `constructor` on every resolution.
  pub fn transient(constructor: impl Fn() -> Arc<S> + Send + Sync + 'static) -> Self {
    Self {
      acquire: Arc::new(constructor),
      release: Some(Arc::new(|provider: Arc<S>| drop(provider))),
      lifecycle: Lifecycle::Transient,
    }
  }

  /// Builds an injector that constructs once and shares the result.
  ///
  /// Concurrent first resolutions are serialized; `constructor` runs exactly
  /// once per injector.
  pub fn singleton(constructor: impl Fn() -> Arc<S> + Send + Sync + 'static) -> Self {
    let cell: OnceCell<Arc<S>> = OnceCell::new();
    Self {
      acquire: Arc::new(move || Arc::clone(cell.get_or_init(&constructor))),
      release: None,
      lifecycle: Lifecycle::Singleton,
    }
  }

  /// Builds an injector that constructs once per thread.
  ///
  /// The per-thread providers live in the injector, so they are dropped
  /// with the registration, like a singleton.
  pub fn thread_local(constructor: impl Fn() -> Arc<S> + Send + Sync + 'static) -> Self {
    let providers: DashMap<ThreadId, Arc<S>> = DashMap::new();
    Self {
      acquire: Arc::new(move || thread_local_acquire(&providers, &constructor)),
      release: None,
      lifecycle: Lifecycle::ThreadLocal,
    }
  }

  /// Wraps an already constructed provider as a singleton.
  pub fn instance(provider: Arc<S>) -> Self {
    Self {
      acquire: Arc::new(move || Arc::clone(&provider)),
      release: None,
      lifecycle: Lifecycle::Singleton,
    }
  }

  /// Builds an injector for `lifecycle` around `constructor`.
  ///
  /// With [`Lifecycle::Custom`] the constructor becomes the acquire function
  /// as-is and no release hook is installed.
  pub fn with_lifecycle(
    lifecycle: Lifecycle,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Self {
    match lifecycle {
      Lifecycle::Transient => Self::transient(constructor),
      Lifecycle::Singleton => Self::singleton(constructor),
      Lifecycle::ThreadLocal => Self::thread_local(constructor),
      Lifecycle::Custom => Self::new(constructor),
    }
  }
}

impl<S: ?Sized> Injector<S> {
  /// The lifecycle this injector implements.
  pub fn lifecycle(&self) -> Lifecycle {
    self.lifecycle
  }

  /// Whether dropping a resolved handle runs a release hook.
  pub fn has_release(&self) -> bool {
    self.release.is_some()
  }

  pub(crate) fn acquire(&self) -> Arc<S> {
    (self.acquire)()
  }

  pub(crate) fn release_hook(&self) -> Option<ReleaseFn<S>> {
    self.release.clone()
  }
}

impl<S: ?Sized> Clone for Injector<S> {
  fn clone(&self) -> Self {
    Self {
      acquire: Arc::clone(&self.acquire),
      release: self.release.clone(),
      lifecycle: self.lifecycle,
    }
  }
}

impl<S: ?Sized> fmt::Debug for Injector<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Injector")
      .field("lifecycle", &self.lifecycle)
      .field("has_release", &self.release.is_some())
      .finish_non_exhaustive()
  }
}

fn thread_local_acquire<S: ?Sized + Service>(
  providers: &DashMap<ThreadId, Arc<S>>,
  constructor: &dyn Fn() -> Arc<S>,
) -> Arc<S> {
  let thread = thread::current().id();
  if let Some(provider) = providers.get(&thread) {
    return Arc::clone(provider.value());
  }

  // Constructed without holding a shard lock: the constructor may resolve
  // other thread-local services.
  let fresh = constructor();
  Arc::clone(providers.entry(thread).or_insert(fresh).value())
}
