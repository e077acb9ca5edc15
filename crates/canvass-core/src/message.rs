//! Messages exchanged with a contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message. Older rows predate contact-keyed messages and are only
/// reachable through `(assignment_id, contact_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:                  i64,
  pub campaign_contact_id: Option<i64>,
  pub assignment_id:       Option<i64>,
  pub contact_number:      String,
  pub text:                String,
  pub is_from_contact:     bool,
  pub created_at:          DateTime<Utc>,
}

/// Input for recording a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub campaign_contact_id: Option<i64>,
  pub assignment_id:       Option<i64>,
  pub contact_number:      String,
  pub text:                String,
  pub is_from_contact:     bool,
  /// Defaults to now when `None`.
  pub created_at:          Option<DateTime<Utc>>,
}

impl NewMessage {
  /// An outgoing message keyed by contact.
  pub fn to_contact(
    campaign_contact_id: i64,
    contact_number: impl Into<String>,
    text: impl Into<String>,
  ) -> Self {
    Self {
      campaign_contact_id: Some(campaign_contact_id),
      assignment_id: None,
      contact_number: contact_number.into(),
      text: text.into(),
      is_from_contact: false,
      created_at: None,
    }
  }
}
