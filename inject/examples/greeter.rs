use fibre_inject::{Instance, Registry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

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

impl Drop for EnglishGreeter {
  fn drop(&mut self) {
    println!("Destroying greeter saying '{}'", self.message);
  }
}

fn main() -> fibre_inject::Result<()> {
  // RUST_LOG=fibre_inject=trace shows registration, resolution and release.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let registry = Registry::builder().name("greeter-example").build();

  // --- Composition root ---
  let message = String::from("hello");
  registry.inject_transient::<dyn Greeter>(move || {
    println!("Creating TRANSIENT greeter...");
    Arc::new(EnglishGreeter {
      message: message.clone(),
    })
  })?;

  // --- Consumers ---
  let first = registry.resolve::<dyn Greeter>()?;
  let second = registry.resolve::<dyn Greeter>()?;
  println!("First says: {}, second says: {}", first.greet(), second.greet());
  assert!(
    !Instance::ptr_eq(&first, &second),
    "Transient instances should be different"
  );

  drop(first);
  drop(second);
  println!("Both handles dropped.");
  Ok(())
}
