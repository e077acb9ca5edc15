//! Campaign contacts and the values batch queries may attach to them.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, message::Message};

// ─── Message status ──────────────────────────────────────────────────────────

/// Where a contact stands in its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageStatus {
  /// No message has been sent yet; nothing downstream exists for the contact.
  NeedsMessage,
  NeedsResponse,
  Convo,
  Messaged,
  Closed,
}

impl MessageStatus {
  /// The string stored in the `message_status` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NeedsMessage => "needsMessage",
      Self::NeedsResponse => "needsResponse",
      Self::Convo => "convo",
      Self::Messaged => "messaged",
      Self::Closed => "closed",
    }
  }
}

impl fmt::Display for MessageStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MessageStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "needsMessage" => Ok(Self::NeedsMessage),
      "needsResponse" => Ok(Self::NeedsResponse),
      "convo" => Ok(Self::Convo),
      "messaged" => Ok(Self::Messaged),
      "closed" => Ok(Self::Closed),
      other => Err(Error::UnknownMessageStatus(other.to_owned())),
    }
  }
}

// ─── Prefetched values ───────────────────────────────────────────────────────

/// A value an upstream batch query may already have computed for a contact.
///
/// `Unresolved` means the resolver has to compute it itself. A `Resolved`
/// value is authoritative even when it is "empty" (e.g. no messages).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Prefetched<T> {
  Resolved(T),
  #[default]
  Unresolved,
}

/// Values attached to a contact by batch query paths (conversation lists,
/// assignment views). None of them are stored on the contact row.
#[derive(Debug, Clone, Default)]
pub struct BatchHints {
  /// The contact's cell as found in the opt-out table by a joined query.
  /// Its presence alone means "opted out".
  pub opt_out_cell:    Prefetched<String>,
  pub is_opted_out:    Prefetched<bool>,
  pub organization_id: Prefetched<i64>,
  /// The full message history, ordered by `created_at`.
  pub messages:        Prefetched<Vec<Message>>,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A person being contacted within one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub id:              i64,
  pub campaign_id:     i64,
  pub assignment_id:   Option<i64>,
  pub first_name:      String,
  pub last_name:       String,
  pub cell:            String,
  pub zip:             String,
  pub external_id:     Option<String>,
  pub custom_fields:   serde_json::Value,
  pub message_status:  MessageStatus,
  /// Encoded `"<offset>_<hasDst>"` descriptor, e.g. `"-5_1"`.
  pub timezone_offset: Option<String>,
  pub city:            Option<String>,
  pub state:           Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      Option<DateTime<Utc>>,
  #[serde(skip)]
  pub hints:           BatchHints,
}

/// Input for creating a contact during campaign setup.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub campaign_id:     i64,
  pub assignment_id:   Option<i64>,
  pub first_name:      String,
  pub last_name:       String,
  pub cell:            String,
  pub zip:             String,
  pub external_id:     Option<String>,
  pub custom_fields:   serde_json::Value,
  pub message_status:  MessageStatus,
  pub timezone_offset: Option<String>,
  pub city:            Option<String>,
  pub state:           Option<String>,
}

impl NewContact {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(
    campaign_id: i64,
    cell: impl Into<String>,
    zip: impl Into<String>,
  ) -> Self {
    Self {
      campaign_id,
      assignment_id: None,
      first_name: String::new(),
      last_name: String::new(),
      cell: cell.into(),
      zip: zip.into(),
      external_id: None,
      custom_fields: serde_json::Value::Object(Default::default()),
      message_status: MessageStatus::NeedsMessage,
      timezone_offset: None,
      city: None,
      state: None,
    }
  }
}
