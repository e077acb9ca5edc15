//! Collaborator traits implemented by storage backends.
//!
//! Each trait is a narrow read-side interface: the relational queries behind
//! a contact's fields, the zip directory, the opt-out index and the access
//! policy. Backends (e.g. `canvass-store-sqlite`) usually implement all of
//! them on one type; resolvers depend only on these abstractions.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{collections::HashSet, future::Future};

use crate::{
  access::Role,
  campaign::Campaign,
  contact::Contact,
  location::Location,
  message::Message,
  response::{QuestionResponseValue, ResponseJoinRow},
  tag::Tag,
};

// ─── Relational queries ──────────────────────────────────────────────────────

pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Retrieve a campaign by id. Returns `None` if not found.
  fn get_campaign(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  /// One row per (response × sibling answer option) for a contact's
  /// responses. Row order is unspecified.
  fn response_join_rows(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<ResponseJoinRow>, Self::Error>> + Send + '_;

  /// Each response joined with the question it answered.
  fn question_response_values(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<QuestionResponseValue>, Self::Error>>
  + Send
  + '_;

  /// Messages keyed by contact id, oldest first.
  fn contact_messages(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Messages keyed by `(assignment_id, contact_number)`, oldest first. Only
  /// rows written before messages carried a contact id need this path.
  fn legacy_messages<'a>(
    &'a self,
    assignment_id: i64,
    contact_number: &'a str,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  /// Tags attached to a contact through `campaign_contact_tag`.
  fn contact_tags(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;
}

// ─── Zip directory ───────────────────────────────────────────────────────────

/// The authoritative per-zip location source behind the static table.
pub trait ZipDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up a 5-digit zip. Returns `None` if the zip is unknown.
  fn locate_zip<'a>(
    &'a self,
    zip: &'a str,
  ) -> impl Future<Output = Result<Option<Location>, Self::Error>> + Send + 'a;
}

// ─── Opt-out index ───────────────────────────────────────────────────────────

pub trait OptOutIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every cell opted out within `organization_id`.
  fn organization_opt_outs(
    &self,
    organization_id: i64,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;
}

// ─── Access policy ───────────────────────────────────────────────────────────

pub trait AccessPolicy: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The role `user_id` holds in `organization_id`, if any.
  fn role_of(
    &self,
    user_id: i64,
    organization_id: i64,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;
}
