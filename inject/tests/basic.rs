use fibre_inject::{ConsumerMode, Error, Injector, Instance, Lifecycle, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

// The trait must be Send + Sync for the registry to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter {
  message: String,
}

impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    self.message.clone()
  }
}

// --- Basic Tests ---

#[test]
fn test_transient_greeter_end_to_end() {
  static DESTROYED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

  struct CountedGreeter {
    id: usize,
    message: String,
  }
  impl Greeter for CountedGreeter {
    fn greet(&self) -> String {
      self.message.clone()
    }
  }
  impl Drop for CountedGreeter {
    fn drop(&mut self) {
      DESTROYED.lock().unwrap().push(self.id);
    }
  }

  // Arrange
  let registry = Registry::new();
  let message = String::from("hello");
  let next_id = AtomicUsize::new(0);
  registry
    .register_with_lifecycle::<dyn Greeter>(Lifecycle::Transient, ConsumerMode::Single, move || {
      Arc::new(CountedGreeter {
        id: next_id.fetch_add(1, Ordering::SeqCst),
        message: message.clone(),
      })
    })
    .unwrap();

  // Act
  let first = registry.resolve::<dyn Greeter>().unwrap();
  let second = registry.resolve::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(first.greet(), "hello");
  assert_eq!(second.greet(), "hello");
  assert!(!Instance::ptr_eq(&first, &second));

  // Each handle destroys its own instance only.
  drop(second);
  assert_eq!(*DESTROYED.lock().unwrap(), vec![1]);
  assert_eq!(first.greet(), "hello");
  drop(first);
  assert_eq!(*DESTROYED.lock().unwrap(), vec![1, 0]);
}

#[test]
fn test_singleton_is_shared_and_never_destroyed_by_handles() {
  static DESTROYED: AtomicUsize = AtomicUsize::new(0);

  struct SharedGreeter;
  impl Greeter for SharedGreeter {
    fn greet(&self) -> String {
      "shared".to_string()
    }
  }
  impl Drop for SharedGreeter {
    fn drop(&mut self) {
      DESTROYED.fetch_add(1, Ordering::SeqCst);
    }
  }

  // Arrange
  let registry = Registry::new();
  registry
    .inject_singleton::<dyn Greeter>(|| Arc::new(SharedGreeter))
    .unwrap();

  // Act
  let handles: Vec<_> = (0..5)
    .map(|_| registry.resolve::<dyn Greeter>().unwrap())
    .collect();

  // Assert
  for handle in &handles {
    assert!(Instance::ptr_eq(&handles[0], handle));
    assert_eq!(handle.lifecycle(), Lifecycle::Singleton);
  }
  drop(handles);
  assert_eq!(DESTROYED.load(Ordering::SeqCst), 0);

  // The registration owns the singleton.
  drop(registry);
  assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_resolution_before_registration_fails_without_constructing() {
  static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

  let registry = Registry::new();
  registry
    .add_transient::<dyn Greeter>(|| {
      CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
      Arc::new(EnglishGreeter {
        message: "set only".to_string(),
      })
    })
    .unwrap();

  // Only a set provider exists; the single-consumer API must not use it.
  let err = registry.resolve::<dyn Greeter>().unwrap_err();

  assert!(matches!(err, Error::MissingProvider { .. }));
  assert!(err.service().contains("Greeter"));
  assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_single_registration_keeps_first() {
  let registry = Registry::new();
  registry
    .inject_transient::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "first".to_string(),
      })
    })
    .unwrap();

  let err = registry
    .inject_singleton::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "second".to_string(),
      })
    })
    .unwrap_err();

  assert!(matches!(err, Error::DuplicateRegistration { .. }));
  assert!(err.to_string().starts_with("Duplicate injection for"));
  let greeter = registry.resolve::<dyn Greeter>().unwrap();
  assert_eq!(greeter.greet(), "first");
  assert_eq!(greeter.lifecycle(), Lifecycle::Transient);
}

#[test]
fn test_inspection_has_no_side_effects() {
  static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

  let registry = Registry::new();
  assert!(!registry.is_registered::<dyn Greeter>());
  assert_eq!(registry.registered_count::<dyn Greeter>(), 0);

  registry
    .register_with_lifecycle::<dyn Greeter>(Lifecycle::Singleton, ConsumerMode::Both, || {
      CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
      Arc::new(EnglishGreeter {
        message: "both".to_string(),
      })
    })
    .unwrap();
  registry
    .add_transient::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "extra".to_string(),
      })
    })
    .unwrap();

  assert!(registry.is_registered::<dyn Greeter>());
  assert_eq!(registry.registered_count::<dyn Greeter>(), 2);
  assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
}

#[test]
fn test_both_mode_shares_one_singleton_across_apis() {
  let registry = Registry::new();
  registry
    .register_with_lifecycle::<dyn Greeter>(Lifecycle::Singleton, ConsumerMode::Both, || {
      Arc::new(EnglishGreeter {
        message: "both".to_string(),
      })
    })
    .unwrap();

  let single = registry.resolve::<dyn Greeter>().unwrap();
  let set = registry.resolve_all::<dyn Greeter>(false).unwrap();

  assert_eq!(set.len(), 1);
  assert!(Instance::ptr_eq(&single, &set.instances()[0]));
}

#[test]
fn test_reset_clears_state() {
  let registry = Registry::new();
  registry
    .inject_singleton::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "before".to_string(),
      })
    })
    .unwrap();
  registry
    .add_singleton::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "before set".to_string(),
      })
    })
    .unwrap();
  let before = registry.resolve::<dyn Greeter>().unwrap();

  registry.reset_for_testing::<dyn Greeter>();

  assert!(!registry.is_registered::<dyn Greeter>());
  assert_eq!(registry.registered_count::<dyn Greeter>(), 0);
  assert!(matches!(
    registry.resolve::<dyn Greeter>(),
    Err(Error::MissingProvider { .. })
  ));

  // A fresh cycle behaves as if nothing had been registered before.
  registry
    .inject_singleton::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "after".to_string(),
      })
    })
    .unwrap();
  let after = registry.resolve::<dyn Greeter>().unwrap();
  assert_eq!(after.greet(), "after");
  assert!(!Instance::ptr_eq(&before, &after));
  assert_eq!(before.greet(), "before");
}

#[test]
fn test_inject_instance_uses_prebuilt_provider() {
  let registry = Registry::new();
  let prebuilt: Arc<dyn Greeter> = Arc::new(EnglishGreeter {
    message: "prebuilt".to_string(),
  });
  registry.inject_instance(Arc::clone(&prebuilt)).unwrap();

  let resolved = registry.resolve::<dyn Greeter>().unwrap();
  assert!(Arc::ptr_eq(resolved.as_arc(), &prebuilt));
  assert!(matches!(
    registry.inject_instance(prebuilt),
    Err(Error::DuplicateRegistration { .. })
  ));
}

#[test]
fn test_custom_injector_release_runs_once_per_handle() {
  static ACQUIRED: AtomicUsize = AtomicUsize::new(0);
  static RELEASED: AtomicUsize = AtomicUsize::new(0);

  let registry = Registry::new();
  let injector = Injector::<dyn Greeter>::new(|| {
    ACQUIRED.fetch_add(1, Ordering::SeqCst);
    Arc::new(EnglishGreeter {
      message: "custom".to_string(),
    })
  })
  .with_release(|_greeter| {
    RELEASED.fetch_add(1, Ordering::SeqCst);
  });
  registry.inject(injector).unwrap();

  {
    let a = registry.resolve::<dyn Greeter>().unwrap();
    let _b = registry.resolve::<dyn Greeter>().unwrap();
    assert_eq!(a.lifecycle(), Lifecycle::Custom);
    assert_eq!(ACQUIRED.load(Ordering::SeqCst), 2);
    assert_eq!(RELEASED.load(Ordering::SeqCst), 0);
  }

  assert_eq!(RELEASED.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concrete_types_are_services_too() {
  #[derive(Debug, PartialEq)]
  struct Settings {
    retries: u32,
  }

  let registry = Registry::new();
  registry
    .inject_singleton(|| Arc::new(Settings { retries: 3 }))
    .unwrap();

  let settings = registry.resolve::<Settings>().unwrap();
  assert_eq!(*settings, Settings { retries: 3 });
}

#[test]
fn test_handle_released_once_after_reset() {
  static RELEASED: Mutex<Vec<String>> = Mutex::new(Vec::new());

  let registry = Registry::new();
  let injector = Injector::<dyn Greeter>::transient(|| {
    Arc::new(EnglishGreeter {
      message: "old".to_string(),
    })
  })
  .with_release(|greeter| RELEASED.lock().unwrap().push(greeter.greet()));
  registry.inject(injector).unwrap();

  let held = registry.resolve::<dyn Greeter>().unwrap();
  registry.reset_for_testing::<dyn Greeter>();
  registry
    .inject_transient::<dyn Greeter>(|| {
      Arc::new(EnglishGreeter {
        message: "new".to_string(),
      })
    })
    .unwrap();
  let fresh = registry.resolve::<dyn Greeter>().unwrap();
  assert!(RELEASED.lock().unwrap().is_empty());

  // The held handle still releases through the hook it was resolved with.
  drop(held);
  assert_eq!(*RELEASED.lock().unwrap(), vec!["old"]);
  drop(fresh);
  assert_eq!(*RELEASED.lock().unwrap(), vec!["old"]);
}

#[test]
fn test_thread_local_providers_drop_with_registration() {
  static CREATED: AtomicUsize = AtomicUsize::new(0);
  static DROPPED: AtomicUsize = AtomicUsize::new(0);

  struct LocalGreeter;
  impl Greeter for LocalGreeter {
    fn greet(&self) -> String {
      "local".to_string()
    }
  }
  impl Drop for LocalGreeter {
    fn drop(&mut self) {
      DROPPED.fetch_add(1, Ordering::SeqCst);
    }
  }
  fn build() -> Arc<dyn Greeter> {
    CREATED.fetch_add(1, Ordering::SeqCst);
    Arc::new(LocalGreeter)
  }

  // Dropping the registry drops the provider, like a singleton.
  let registry = Registry::new();
  registry.inject_thread_local::<dyn Greeter>(build).unwrap();
  drop(registry.resolve::<dyn Greeter>().unwrap());
  assert_eq!(DROPPED.load(Ordering::SeqCst), 0);
  drop(registry);
  assert_eq!(DROPPED.load(Ordering::SeqCst), 1);

  // Resetting drops it too, so repeated cycles do not accumulate providers.
  let registry = Registry::new();
  for _ in 0..100 {
    registry.inject_thread_local::<dyn Greeter>(build).unwrap();
    assert_eq!(registry.resolve::<dyn Greeter>().unwrap().greet(), "local");
    registry.reset_for_testing::<dyn Greeter>();
  }
  assert_eq!(CREATED.load(Ordering::SeqCst), 101);
  assert_eq!(DROPPED.load(Ordering::SeqCst), 101);
}
