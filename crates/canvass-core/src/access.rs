//! Organisation roles used by the access-control check.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A user's role within an organisation.
///
/// Variants are declared from least to most privileged so the derived `Ord`
/// expresses the hierarchy: a user holding a role satisfies every
/// requirement at or below it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Texter,
  Supervolunteer,
  Admin,
  Owner,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Texter => "TEXTER",
      Self::Supervolunteer => "SUPERVOLUNTEER",
      Self::Admin => "ADMIN",
      Self::Owner => "OWNER",
    }
  }

  /// Whether holding `self` is enough to satisfy `required`.
  pub fn satisfies(&self, required: Role) -> bool { *self >= required }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "TEXTER" => Ok(Self::Texter),
      "SUPERVOLUNTEER" => Ok(Self::Supervolunteer),
      "ADMIN" => Ok(Self::Admin),
      "OWNER" => Ok(Self::Owner),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}
