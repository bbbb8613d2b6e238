//! The main `Registry` struct, its builder and associated methods.

use crate::core::{Entry, ErasedEntry, ResolutionGuard, ResolutionTarget, Service, ServiceKey};
use crate::error::{Error, Result};
use crate::instance::{Instance, InstanceSet};
use crate::lifecycle::{ConsumerMode, Injector, Lifecycle};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

/// A builder for [`Registry`] instances.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
  name: Option<String>,
  detect_cycles: bool,
}

impl Default for RegistryBuilder {
  fn default() -> Self {
    Self {
      name: None,
      detect_cycles: true,
    }
  }
}

impl RegistryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Labels the registry in log events and `Debug` output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Enables or disables circular resolution detection. Enabled by default.
  ///
  /// With detection off, a provider that resolves itself recurses until the
  /// stack overflows (or, for singletons, until the lazy cell deadlocks).
  pub fn detect_cycles(mut self, enabled: bool) -> Self {
    self.detect_cycles = enabled;
    self
  }

  pub fn build(self) -> Registry {
    Registry {
      id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
      name: self.name,
      detect_cycles: self.detect_cycles,
      entries: DashMap::new(),
    }
  }
}

/// A lifecycle-managed dependency registry.
///
/// A registry maps each service type to at most one injector consumed by
/// [`resolve`](Registry::resolve) and to an ordered list of injectors consumed
/// by [`resolve_all`](Registry::resolve_all). It is an ordinary value: the
/// composition root creates it, registers providers, and hands it (or an
/// `Arc` of it) to whatever needs to resolve dependencies.
///
/// The registry is `Send + Sync`. Registration is meant to happen up front,
/// but concurrent registration and resolution are memory safe.
pub struct Registry {
  id: u64,
  name: Option<String>,
  detect_cycles: bool,
  entries: DashMap<ServiceKey, ErasedEntry>,
}

impl Default for Registry {
  fn default() -> Self {
    RegistryBuilder::default().build()
  }
}

impl Registry {
  /// Creates a new, empty, unnamed `Registry` with cycle detection on.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::new()
  }

  /// The label given through [`RegistryBuilder::name`], if any.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// Number of service types with at least one registration.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  // --- PRIVATE HELPERS ---

  fn label(&self) -> &str {
    self.name.as_deref().unwrap_or("unnamed")
  }

  fn entry_mut<S: ?Sized + Service>(&self, key: ServiceKey) -> RefMut<'_, ServiceKey, ErasedEntry> {
    self
      .entries
      .entry(key)
      .or_insert_with(|| Box::new(Entry::<S>::default()))
  }

  fn guard(&self, key: ServiceKey, target: ResolutionTarget) -> Result<Option<ResolutionGuard>> {
    if !self.detect_cycles {
      return Ok(None);
    }
    match ResolutionGuard::enter(self.id, key, target) {
      Ok(guard) => Ok(Some(guard)),
      Err(err) => {
        debug!(registry = self.label(), service = key.name(), "circular resolution detected");
        Err(err)
      }
    }
  }

  fn single_injector<S: ?Sized + Service>(&self, key: &ServiceKey) -> Option<Injector<S>> {
    self
      .entries
      .get(key)
      .and_then(|slot| slot.downcast_ref::<Entry<S>>().and_then(|entry| entry.single.clone()))
  }

  fn set_injectors<S: ?Sized + Service>(&self, key: &ServiceKey) -> Vec<Injector<S>> {
    self
      .entries
      .get(key)
      .and_then(|slot| slot.downcast_ref::<Entry<S>>().map(|entry| entry.set.clone()))
      .unwrap_or_default()
  }

  // --- PUBLIC API ---

  // --- Registration ---

  /// Registers `injector` for the service `S`.
  ///
  /// In [`ConsumerMode::Single`] (and `Both`) this fails with
  /// [`Error::DuplicateRegistration`] if `S` already has a single provider;
  /// the existing registration is left untouched and, for `Both`, nothing is
  /// appended to the set. [`ConsumerMode::Set`] always appends.
  pub fn register<S: ?Sized + Service>(&self, injector: Injector<S>, mode: ConsumerMode) -> Result<()> {
    let key = ServiceKey::of::<S>();
    let lifecycle = injector.lifecycle();
    let mut slot = self.entry_mut::<S>(key);
    let Some(entry) = slot.downcast_mut::<Entry<S>>() else {
      unreachable!("registry entry for {} holds a foreign type", key.name());
    };

    if mode.includes_single() {
      if entry.single.is_some() {
        debug!(registry = self.label(), service = key.name(), "duplicate registration rejected");
        return Err(Error::DuplicateRegistration {
          service: key.name(),
        });
      }
      entry.single = Some(injector.clone());
    }
    if mode.includes_set() {
      entry.set.push(injector);
    }

    debug!(
      registry = self.label(),
      service = key.name(),
      ?lifecycle,
      ?mode,
      set_len = entry.set.len(),
      "registered service provider"
    );
    Ok(())
  }

  /// Registers a single-consumer injector. See [`register`](Self::register).
  pub fn inject<S: ?Sized + Service>(&self, injector: Injector<S>) -> Result<()> {
    self.register(injector, ConsumerMode::Single)
  }

  /// Appends an injector to the service's set. Never fails.
  pub fn add<S: ?Sized + Service>(&self, injector: Injector<S>) -> Result<()> {
    self.register(injector, ConsumerMode::Set)
  }

  /// Builds an injector for `lifecycle` around `constructor` and registers it.
  ///
  /// Constructor arguments are whatever the closure captures.
  pub fn register_with_lifecycle<S: ?Sized + Service>(
    &self,
    lifecycle: Lifecycle,
    mode: ConsumerMode,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Injector::with_lifecycle(lifecycle, constructor), mode)
  }

  // --- Single-Consumer Shorthands ---
  pub fn inject_transient<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.inject(Injector::transient(constructor))
  }

  pub fn inject_singleton<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.inject(Injector::singleton(constructor))
  }

  pub fn inject_thread_local<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.inject(Injector::thread_local(constructor))
  }

  /// Registers an already constructed provider as the service's singleton.
  pub fn inject_instance<S: ?Sized + Service>(&self, provider: Arc<S>) -> Result<()> {
    self.inject(Injector::instance(provider))
  }

  // --- Set Shorthands ---
  pub fn add_transient<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.add(Injector::transient(constructor))
  }

  pub fn add_singleton<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.add(Injector::singleton(constructor))
  }

  pub fn add_thread_local<S: ?Sized + Service>(
    &self,
    constructor: impl Fn() -> Arc<S> + Send + Sync + 'static,
  ) -> Result<()> {
    self.add(Injector::thread_local(constructor))
  }

  // --- Resolution ---

  /// Resolves the single provider of `S`.
  ///
  /// Fails with [`Error::MissingProvider`] if none is registered, in which
  /// case no constructor runs. Providers may resolve other services from
  /// the same registry; resolving one that is already being built on this
  /// thread fails with [`Error::CircularResolution`] when cycle detection is
  /// enabled.
  pub fn resolve<S: ?Sized + Service>(&self) -> Result<Instance<S>> {
    let key = ServiceKey::of::<S>();
    let _guard = self.guard(key, ResolutionTarget::Single)?;

    // Cloned out so no map lock is held while the provider is built.
    let Some(injector) = self.single_injector::<S>(&key) else {
      debug!(registry = self.label(), service = key.name(), "no provider registered");
      return Err(Error::MissingProvider {
        service: key.name(),
      });
    };

    let instance = Instance::acquire(&injector);
    trace!(
      registry = self.label(),
      service = key.name(),
      lifecycle = ?instance.lifecycle(),
      "resolved service"
    );
    Ok(instance)
  }

  /// Resolves every provider in the set of `S`, in registration order.
  ///
  /// An empty set is an [`Error::MissingProvider`] unless `allow_empty` is
  /// `true`, in which case an empty [`InstanceSet`] is returned.
  pub fn resolve_all<S: ?Sized + Service>(&self, allow_empty: bool) -> Result<InstanceSet<S>> {
    let key = ServiceKey::of::<S>();
    let _guard = self.guard(key, ResolutionTarget::Set)?;

    let injectors = self.set_injectors::<S>(&key);
    if injectors.is_empty() && !allow_empty {
      debug!(registry = self.label(), service = key.name(), "no provider set registered");
      return Err(Error::MissingProvider {
        service: key.name(),
      });
    }

    let set = InstanceSet::acquire(&injectors);
    trace!(
      registry = self.label(),
      service = key.name(),
      count = set.len(),
      "resolved service set"
    );
    Ok(set)
  }

  // --- Inspection ---

  /// Whether `S` has a single-consumer provider.
  pub fn is_registered<S: ?Sized + Service>(&self) -> bool {
    self.single_injector::<S>(&ServiceKey::of::<S>()).is_some()
  }

  /// Number of providers in the set of `S`.
  pub fn registered_count<S: ?Sized + Service>(&self) -> usize {
    let key = ServiceKey::of::<S>();
    self
      .entries
      .get(&key)
      .and_then(|slot| slot.downcast_ref::<Entry<S>>().map(|entry| entry.set.len()))
      .unwrap_or(0)
  }

  // --- Test Support ---

  /// Forgets every registration of `S`, single and set.
  ///
  /// Intended for tests only. Handles resolved before the reset keep the
  /// release hook they were resolved with and still run it on drop, even
  /// though the registry no longer knows that injector.
  pub fn reset_for_testing<S: ?Sized + Service>(&self) {
    let key = ServiceKey::of::<S>();
    if self.entries.remove(&key).is_some() {
      debug!(registry = self.label(), service = key.name(), "registration reset");
    }
  }

  /// Forgets every registration of every service. Test-only, like
  /// [`reset_for_testing`](Self::reset_for_testing).
  pub fn clear(&self) {
    self.entries.clear();
    debug!(registry = self.label(), "all registrations cleared");
  }
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("name", &self.label())
      .field("services", &self.entries.len())
      .field("detect_cycles", &self.detect_cycles)
      .finish_non_exhaustive()
  }
}
