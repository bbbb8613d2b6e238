use fibre_inject::{Injector, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Worker: Send + Sync {
  fn work(&self);
}

struct IndexedWorker {
  index: usize,
}

impl Worker for IndexedWorker {
  fn work(&self) {
    println!("{:p}.work(), index={}", self, self.index);
  }
}

fn main() -> fibre_inject::Result<()> {
  // Three providers handed out in turn to whoever resolves the service.
  let pool: Vec<Arc<dyn Worker>> = (0..3)
    .map(|index| Arc::new(IndexedWorker { index }) as Arc<dyn Worker>)
    .collect();
  let round = AtomicUsize::new(0);

  let registry = Registry::new();
  registry.inject(
    Injector::<dyn Worker>::new(move || {
      let next = round.fetch_add(1, Ordering::Relaxed) % pool.len();
      Arc::clone(&pool[next])
    })
    .with_release(|_worker| println!("  worker handed back")),
  )?;

  println!("Note: 3 service provider instances in round robin");
  for _ in 0..6 {
    let worker = registry.resolve::<dyn Worker>()?;
    worker.work();
  }
  Ok(())
}
