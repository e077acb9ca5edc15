//! Error type for `canvass-resolve`.

use canvass_core::access::Role;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The contact references a campaign that does not exist.
  #[error("campaign {0} not found")]
  CampaignNotFound(i64),

  #[error("no requesting user")]
  Unauthenticated,

  #[error("user {user_id} lacks {required} access to organization {organization_id}")]
  Forbidden {
    user_id:         i64,
    organization_id: i64,
    required:        Role,
  },
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
