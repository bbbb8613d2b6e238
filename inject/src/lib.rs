//! # Fibre Inject
//!
//! A lifecycle-managed dependency injection registry for Rust.
//!
//! A [`Registry`] binds a service (usually a trait object such as
//! `dyn Greeter`) to the provider that implements it, and decides how many
//! provider instances exist and when they go away.
//!
//! ## Core Concepts
//!
//! - **Registry**: an explicit value owned by the composition root. Nothing
//!   is global; two registries never see each other's registrations.
//! - **Injector**: the provider factory, an `acquire` function with an
//!   optional `release` hook.
//! - **Lifecycle**: `Transient` (new provider per resolution), `Singleton`
//!   (one shared provider), `ThreadLocal` (one provider per thread) or
//!   `Custom` (caller-defined acquire/release).
//! - **Consumer mode**: a service has at most one provider for
//!   [`Registry::resolve`] and any number, in registration order, for
//!   [`Registry::resolve_all`].
//! - **Handles**: resolution returns an [`Instance`] (or [`InstanceSet`])
//!   that derefs to the service and runs the release hook when dropped.
//!
//! Misconfiguration (a missing provider, a duplicate single registration, a
//! provider that resolves itself) is reported as an [`Error`]; the registry
//! itself never panics on it.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Lifecycle, Registry};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.message.clone()
//!   }
//! }
//!
//! fn main() -> fibre_inject::Result<()> {
//!   let registry = Registry::builder().name("quick-start").build();
//!
//!   // Constructor arguments are captured by the closure.
//!   let message = String::from("hello");
//!   registry.inject_transient::<dyn Greeter>(move || {
//!     Arc::new(EnglishGreeter { message: message.clone() })
//!   })?;
//!
//!   let first = registry.resolve::<dyn Greeter>()?;
//!   let second = registry.resolve::<dyn Greeter>()?;
//!
//!   assert_eq!(first.greet(), "hello");
//!   assert_eq!(first.lifecycle(), Lifecycle::Transient);
//!   assert!(!fibre_inject::Instance::ptr_eq(&first, &second));
//!   Ok(())
//! }
//! ```

mod core;
mod error;
mod instance;
mod lifecycle;
mod macros;
mod registry;

pub use crate::core::Service;
pub use error::{Error, Result};
pub use instance::{Instance, InstanceSet, Iter};
pub use lifecycle::{ConsumerMode, Injector, Lifecycle};
pub use registry::{Registry, RegistryBuilder};
