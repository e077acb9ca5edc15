//! Message history resolution.

use canvass_core::{
  contact::{Contact, MessageStatus, Prefetched},
  message::Message,
  store::ContactStore,
};

use crate::{Backend, BestEffort, Error, RequestContext, Result};

impl<S: Backend> RequestContext<S> {
  /// The contact's messages, oldest first.
  ///
  /// Prefetched messages are returned untouched. Otherwise messages are read
  /// by contact id; when that finds none although the contact has been
  /// messaged, the legacy `(assignment, cell)` keyed rows are read instead.
  pub async fn messages(&self, contact: &Contact) -> BestEffort<Vec<Message>> {
    if let Prefetched::Resolved(messages) = &contact.hints.messages {
      return BestEffort::ok(messages.clone());
    }
    BestEffort::from_result(self.fetch_messages(contact).await)
  }

  async fn fetch_messages(&self, contact: &Contact) -> Result<Vec<Message>> {
    let messages = self
      .store
      .contact_messages(contact.id)
      .await
      .map_err(Error::store)?;

    if !messages.is_empty() || contact.message_status == MessageStatus::NeedsMessage {
      return Ok(messages);
    }

    let Some(assignment_id) = contact.assignment_id else {
      return Ok(messages);
    };

    tracing::debug!(
      request_id = %self.request_id(),
      contact_id = contact.id,
      assignment_id,
      "no contact-keyed messages; reading legacy rows"
    );
    self
      .store
      .legacy_messages(assignment_id, &contact.cell)
      .await
      .map_err(Error::store)
  }
}
