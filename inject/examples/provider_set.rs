use fibre_inject::{resolve_all, Registry};
use std::sync::Arc;

trait Notifier: Send + Sync {
  fn notify(&self, message: &str);
}

struct EmailNotifier;
impl Notifier for EmailNotifier {
  fn notify(&self, message: &str) {
    println!("Emailing: {}", message);
  }
}

struct SmsNotifier {
  number: String,
}
impl Notifier for SmsNotifier {
  fn notify(&self, message: &str) {
    println!("Texting {}: {}", self.number, message);
  }
}

struct AuditNotifier;
impl Notifier for AuditNotifier {
  fn notify(&self, message: &str) {
    println!("Audit log: {}", message);
  }
}

fn main() -> fibre_inject::Result<()> {
  let registry = Registry::new();

  // Resolution order is registration order.
  registry.add_singleton::<dyn Notifier>(|| Arc::new(EmailNotifier))?;
  registry.add_transient::<dyn Notifier>(|| {
    Arc::new(SmsNotifier {
      number: "+34 600 000 000".to_string(),
    })
  })?;
  registry.add_thread_local::<dyn Notifier>(|| Arc::new(AuditNotifier))?;
  println!("{} notifiers registered", registry.registered_count::<dyn Notifier>());

  println!("--- Forward ---");
  let notifiers = resolve_all!(&registry, trait Notifier);
  for notifier in &notifiers {
    notifier.notify("subscription expiring soon");
  }

  println!("--- Reverse ---");
  for notifier in notifiers.iter().rev() {
    notifier.notify("second reminder");
  }

  // Nothing registered for this one; ask for an empty set explicitly.
  trait Unused: Send + Sync {}
  let none = registry.resolve_all::<dyn Unused>(true)?;
  println!("Unused service set is empty: {}", none.is_empty());
  Ok(())
}
