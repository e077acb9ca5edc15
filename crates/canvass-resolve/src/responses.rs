//! Question-response resolvers.

use canvass_core::{
  contact::{Contact, MessageStatus},
  response::{QuestionResponseValue, ResolvedResponse, aggregate_responses},
  store::ContactStore,
};

use crate::{Backend, BestEffort, Error, RequestContext};

impl<S: Backend> RequestContext<S> {
  /// The contact's responses, each with the question it answered and that
  /// question's answer options, ordered by response id.
  ///
  /// A contact still awaiting its first message has no responses and is not
  /// queried.
  pub async fn question_responses(
    &self,
    contact: &Contact,
  ) -> BestEffort<Vec<ResolvedResponse>> {
    if contact.message_status == MessageStatus::NeedsMessage {
      return BestEffort::ok(Vec::new());
    }

    let rows = self
      .store
      .response_join_rows(contact.id)
      .await
      .map_err(Error::store);

    BestEffort::from_result(
      rows.map(|rows| aggregate_responses(rows).into_values().collect()),
    )
  }

  /// The contact's responses paired with their question only.
  pub async fn question_response_values(
    &self,
    contact: &Contact,
  ) -> BestEffort<Vec<QuestionResponseValue>> {
    if contact.message_status == MessageStatus::NeedsMessage {
      return BestEffort::ok(Vec::new());
    }

    BestEffort::from_result(
      self
        .store
        .question_response_values(contact.id)
        .await
        .map_err(Error::store),
    )
  }
}
