//! Error types for `amiga-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("vote not found: {0}")]
  VoteNotFound(Uuid),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Used as `.map_err(Error::store)` on every
  /// [`BuddyStore`](crate::store::BuddyStore) call.
  ///
  /// A domain error the backend raised itself (found anywhere in the source
  /// chain) is surfaced as that error rather than boxed.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
      if let Some(domain) = e.downcast_ref::<Self>().and_then(Self::duplicate) {
        return domain;
      }
      source = e.source();
    }
    Self::Store(Box::new(err))
  }

  fn duplicate(&self) -> Option<Self> {
    Some(match self {
      Self::UserNotFound(id) => Self::UserNotFound(*id),
      Self::VoteNotFound(id) => Self::VoteNotFound(*id),
      Self::PermissionDenied(m) => Self::PermissionDenied(m.clone()),
      Self::InvalidInput(m) => Self::InvalidInput(m.clone()),
      Self::Conflict(m) => Self::Conflict(m.clone()),
      Self::Store(_) => return None,
    })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  enum BackendError {
    #[error("core: {0}")]
    Core(#[from] Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
  }

  #[test]
  fn store_surfaces_wrapped_domain_errors() {
    let err = Error::store(BackendError::from(Error::Conflict("taken".into())));
    assert!(matches!(err, Error::Conflict(m) if m == "taken"));
  }

  #[test]
  fn store_boxes_backend_failures() {
    let io = std::io::Error::other("disk");
    assert!(matches!(Error::store(BackendError::from(io)), Error::Store(_)));
  }
}
