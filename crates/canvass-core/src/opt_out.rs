//! Opt-out resolution results.

use serde::{Deserialize, Serialize};

/// A phone number standing opted out within an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptOut {
  pub cell: String,
}

/// The outcome of resolving a contact's opt-out state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptOutStatus {
  Opted(OptOut),
  NotOpted,
}

impl OptOutStatus {
  pub fn opted(cell: impl Into<String>) -> Self {
    Self::Opted(OptOut { cell: cell.into() })
  }

  /// `Some` when opted out; `None` is an explicit "not opted out".
  pub fn into_opt_out(self) -> Option<OptOut> {
    match self {
      Self::Opted(opt_out) => Some(opt_out),
      Self::NotOpted => None,
    }
  }
}
