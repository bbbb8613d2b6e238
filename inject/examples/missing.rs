use fibre_inject::{resolve, Error, Registry};
use std::panic;
use std::sync::Arc;

trait Unregistered: Send + Sync {}

trait Registered: Send + Sync {}
struct Provider;
impl Registered for Provider {}

fn main() {
  let registry = Registry::new();

  // --- Using the fallible `resolve()` method ---
  match registry.resolve::<dyn Unregistered>() {
    Ok(_) => panic!("Should not have found the service!"),
    Err(err @ Error::MissingProvider { .. }) => println!("Correctly received: {}", err),
    Err(err) => panic!("Unexpected error: {}", err),
  }

  // --- Duplicate single registration ---
  registry
    .inject_singleton::<dyn Registered>(|| Arc::new(Provider))
    .expect("first registration succeeds");
  let duplicate = registry.inject_transient::<dyn Registered>(|| Arc::new(Provider));
  println!("Second registration: {:?}", duplicate);

  // --- Using the panicking `resolve!` macro ---
  println!("\nAttempting to resolve with resolve!...");
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    let _service = resolve!(&registry, trait Unregistered);
  }));
  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");
}
