//! Public macros for ergonomic service resolution.

/// Resolves the single provider of a service from a registry, panicking on
/// failure.
///
/// Use this where a missing provider can only mean a broken composition
/// root. For error handling, call [`Registry::resolve`](crate::Registry::resolve)
/// directly.
///
/// # Panics
///
/// Panics with the [`Error`](crate::Error) message if the service cannot be
/// resolved.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve, Registry};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let registry = Registry::new();
/// registry.inject_singleton::<dyn Greeter>(|| Arc::new(EnglishGreeter)).unwrap();
///
/// let greeter = resolve!(&registry, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
///
/// registry.inject_instance(Arc::new(String::from("hello"))).unwrap();
/// assert_eq!(*resolve!(&registry, String), "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  // Arm for resolving a trait object: resolve!(&registry, trait MyTrait)
  ($registry:expr, trait $trait_ident:ident) => {
    $registry
      .resolve::<dyn $trait_ident>()
      .unwrap_or_else(|err| panic!("Failed to resolve required trait service: {}", err))
  };

  // Arm for resolving any other type: resolve!(&registry, MyService)
  ($registry:expr, $type:ty) => {
    $registry
      .resolve::<$type>()
      .unwrap_or_else(|err| panic!("Failed to resolve required service: {}", err))
  };
}

/// Resolves the single provider of a service, returning `None` on failure.
#[macro_export]
macro_rules! maybe_resolve {
  ($registry:expr, trait $trait_ident:ident) => {
    $registry.resolve::<dyn $trait_ident>().ok()
  };

  ($registry:expr, $type:ty) => {
    $registry.resolve::<$type>().ok()
  };
}

/// Resolves the whole provider set of a service, panicking if it is empty.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve_all, Registry};
/// use std::sync::Arc;
///
/// trait Sink: Send + Sync { fn name(&self) -> &'static str; }
/// struct Console;
/// impl Sink for Console { fn name(&self) -> &'static str { "console" } }
/// struct File;
/// impl Sink for File { fn name(&self) -> &'static str { "file" } }
///
/// let registry = Registry::new();
/// registry.add_singleton::<dyn Sink>(|| Arc::new(Console)).unwrap();
/// registry.add_transient::<dyn Sink>(|| Arc::new(File)).unwrap();
///
/// let sinks = resolve_all!(&registry, trait Sink);
/// let names: Vec<_> = sinks.iter().map(|sink| sink.name()).collect();
/// assert_eq!(names, ["console", "file"]);
/// ```
#[macro_export]
macro_rules! resolve_all {
  ($registry:expr, trait $trait_ident:ident) => {
    $registry
      .resolve_all::<dyn $trait_ident>(false)
      .unwrap_or_else(|err| panic!("Failed to resolve required trait service set: {}", err))
  };

  ($registry:expr, $type:ty) => {
    $registry
      .resolve_all::<$type>(false)
      .unwrap_or_else(|err| panic!("Failed to resolve required service set: {}", err))
  };
}
