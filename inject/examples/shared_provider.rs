use fibre_inject::{Injector, Registry};
use std::sync::Arc;

trait Reader: Send + Sync {
  fn do_something(&self);
}

trait Writer: Send + Sync {
  fn do_something_else(&self);
}

// One provider serves both interfaces.
struct Storage;

impl Reader for Storage {
  fn do_something(&self) {
    println!("{:p}.do_something()", self);
  }
}

impl Writer for Storage {
  fn do_something_else(&self) {
    println!("{:p}.do_something_else()", self);
  }
}

fn main() -> fibre_inject::Result<()> {
  let storage = Arc::new(Storage);
  let registry = Registry::new();

  // Each interface gets its own injector handing out the same provider.
  let for_reader = Arc::clone(&storage);
  registry.inject(Injector::<dyn Reader>::new(move || {
    Arc::clone(&for_reader) as Arc<dyn Reader>
  }))?;
  let for_writer = Arc::clone(&storage);
  registry.inject(Injector::<dyn Writer>::new(move || {
    Arc::clone(&for_writer) as Arc<dyn Writer>
  }))?;

  // Both lines print the same address.
  registry.resolve::<dyn Reader>()?.do_something();
  registry.resolve::<dyn Writer>()?.do_something_else();
  Ok(())
}
