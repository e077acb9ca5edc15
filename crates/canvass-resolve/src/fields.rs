//! Plain field resolvers that need little or no I/O.

use canvass_core::{
  campaign::Campaign,
  contact::{Contact, MessageStatus, Prefetched},
};
use chrono::{DateTime, Utc};

use crate::{Backend, RequestContext, Result};

impl<S: Backend> RequestContext<S> {
  pub fn message_status(&self, contact: &Contact) -> MessageStatus {
    contact.message_status
  }

  /// The contact's campaign, via the request's campaign loader.
  pub async fn campaign(&self, contact: &Contact) -> Result<Option<Campaign>> {
    self.load_campaign(contact.campaign_id).await
  }

  /// When the contact last changed: the stored `updated_at`, else the newest
  /// prefetched message, else the creation time.
  pub fn updated_at(&self, contact: &Contact) -> DateTime<Utc> {
    if let Some(updated_at) = contact.updated_at {
      return updated_at;
    }
    if let Prefetched::Resolved(messages) = &contact.hints.messages
      && let Some(latest) = messages.last()
    {
      return latest.created_at;
    }
    contact.created_at
  }
}
