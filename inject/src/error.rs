use thiserror::Error;

/// Errors reported by a [`Registry`](crate::Registry).
///
/// Every variant means the composition root is broken: the registrations do
/// not match what consumers ask for. None of them is transient, so retrying
/// the same call always yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A service was resolved but no provider was ever registered for it.
  #[error("Service provider not found for {service}")]
  MissingProvider { service: &'static str },

  /// A second provider was registered in single-consumer mode.
  #[error("Duplicate injection for {service}")]
  DuplicateRegistration { service: &'static str },

  /// A provider (directly or indirectly) resolved the service it is building.
  #[error("Circular dependency detected while resolving service: {service}")]
  CircularResolution { service: &'static str },
}

impl Error {
  /// The type name of the service the error refers to.
  pub fn service(&self) -> &'static str {
    match self {
      Error::MissingProvider { service }
      | Error::DuplicateRegistration { service }
      | Error::CircularResolution { service } => service,
    }
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
