//! Resolver tests against an in-memory fake backend that counts every call.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use canvass_core::{
  access::Role,
  campaign::{Campaign, ScriptOptions},
  contact::{BatchHints, Contact, MessageStatus, Prefetched},
  location::Location,
  message::Message,
  opt_out::OptOutStatus,
  response::{QuestionRef, QuestionResponseValue, ResponseJoinRow},
  store::{AccessPolicy, ContactStore, OptOutIndex, ZipDirectory},
  tag::Tag,
};
use chrono::{DateTime, TimeZone as _, Utc};

use crate::{Error, OptOutCache, RequestContext};

// ─── Fake backend ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake store failure")]
struct FakeError;

#[derive(Default)]
struct Calls {
  campaign: AtomicUsize,
  zip:      AtomicUsize,
  rows:     AtomicUsize,
  values:   AtomicUsize,
  messages: AtomicUsize,
  legacy:   AtomicUsize,
  tags:     AtomicUsize,
  opt_outs: AtomicUsize,
  roles:    AtomicUsize,
}

fn count(counter: &AtomicUsize) -> usize { counter.load(Ordering::SeqCst) }

#[derive(Default)]
struct FakeStore {
  campaigns: HashMap<i64, Campaign>,
  zips:      HashMap<String, Location>,
  rows:      Vec<ResponseJoinRow>,
  values:    Vec<QuestionResponseValue>,
  messages:  Vec<Message>,
  legacy:    Vec<Message>,
  tags:      Vec<Tag>,
  opt_outs:  HashMap<i64, HashSet<String>>,
  roles:     HashMap<(i64, i64), Role>,
  failing:   bool,
  zip_keys:  Mutex<Vec<String>>,
  calls:     Calls,
}

impl FakeStore {
  fn check(&self) -> Result<(), FakeError> {
    if self.failing { Err(FakeError) } else { Ok(()) }
  }
}

impl ContactStore for FakeStore {
  type Error = FakeError;

  async fn get_contact(&self, _: i64) -> Result<Option<Contact>, FakeError> {
    Ok(None)
  }

  async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>, FakeError> {
    self.calls.campaign.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    self.check()?;
    Ok(self.campaigns.get(&id).cloned())
  }

  async fn response_join_rows(
    &self,
    _: i64,
  ) -> Result<Vec<ResponseJoinRow>, FakeError> {
    self.calls.rows.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.rows.clone())
  }

  async fn question_response_values(
    &self,
    _: i64,
  ) -> Result<Vec<QuestionResponseValue>, FakeError> {
    self.calls.values.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.values.clone())
  }

  async fn contact_messages(&self, _: i64) -> Result<Vec<Message>, FakeError> {
    self.calls.messages.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.messages.clone())
  }

  async fn legacy_messages<'a>(
    &'a self,
    _: i64,
    _: &'a str,
  ) -> Result<Vec<Message>, FakeError> {
    self.calls.legacy.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.legacy.clone())
  }

  async fn contact_tags(&self, _: i64) -> Result<Vec<Tag>, FakeError> {
    self.calls.tags.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.tags.clone())
  }
}

impl ZipDirectory for FakeStore {
  type Error = FakeError;

  async fn locate_zip<'a>(
    &'a self,
    zip: &'a str,
  ) -> Result<Option<Location>, FakeError> {
    self.calls.zip.fetch_add(1, Ordering::SeqCst);
    self.zip_keys.lock().unwrap().push(zip.to_owned());
    tokio::task::yield_now().await;
    self.check()?;
    Ok(self.zips.get(zip).cloned())
  }
}

impl OptOutIndex for FakeStore {
  type Error = FakeError;

  async fn organization_opt_outs(
    &self,
    organization_id: i64,
  ) -> Result<HashSet<String>, FakeError> {
    self.calls.opt_outs.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.opt_outs.get(&organization_id).cloned().unwrap_or_default())
  }
}

impl AccessPolicy for FakeStore {
  type Error = FakeError;

  async fn role_of(
    &self,
    user_id: i64,
    organization_id: i64,
  ) -> Result<Option<Role>, FakeError> {
    self.calls.roles.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    Ok(self.roles.get(&(user_id, organization_id)).copied())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

const CAMPAIGN_ID: i64 = 3;
const ORG_ID: i64 = 40;

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

fn fake() -> FakeStore {
  let mut store = FakeStore::default();
  store.campaigns.insert(CAMPAIGN_ID, Campaign {
    id:              CAMPAIGN_ID,
    organization_id: ORG_ID,
    title:           "GOTV".into(),
  });
  store
}

fn context(store: FakeStore) -> (Arc<FakeStore>, RequestContext<FakeStore>) {
  let store = Arc::new(store);
  let cache = Arc::new(OptOutCache::new(Arc::clone(&store), Duration::from_secs(60)));
  (Arc::clone(&store), RequestContext::new(store, cache))
}

fn contact(status: MessageStatus) -> Contact {
  Contact {
    id:              1,
    campaign_id:     CAMPAIGN_ID,
    assignment_id:   Some(9),
    first_name:      "Ada".into(),
    last_name:       "Byron".into(),
    cell:            "+15551234567".into(),
    zip:             "37902".into(),
    external_id:     None,
    custom_fields:   serde_json::json!({}),
    message_status:  status,
    timezone_offset: None,
    city:            None,
    state:           None,
    created_at:      at(1_000),
    updated_at:      None,
    hints:           BatchHints::default(),
  }
}

fn message(id: i64, secs: i64) -> Message {
  Message {
    id,
    campaign_contact_id: Some(1),
    assignment_id: Some(9),
    contact_number: "+15551234567".into(),
    text: format!("message {id}"),
    is_from_contact: false,
    created_at: at(secs),
  }
}

fn knoxville() -> Location {
  Location {
    timezone_offset: -5,
    has_dst:         true,
    city:            Some("Knoxville".into()),
    state:           Some("TN".into()),
  }
}

// ─── Location ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stored_descriptor_short_circuits() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.timezone_offset = Some("-5_1".into());

  let location = ctx.location(&c).await.unwrap().unwrap();

  assert_eq!(location.timezone_offset, -5);
  assert!(location.has_dst);
  assert_eq!(location.city, None);
  assert_eq!(count(&store.calls.zip), 0);
}

#[tokio::test]
async fn stored_descriptor_carries_cached_city() {
  let (_, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.timezone_offset = Some("-8_1".into());
  c.city = Some("Oakland".into());

  let location = ctx.location(&c).await.unwrap().unwrap();
  assert_eq!(location.city.as_deref(), Some("Oakland"));
  assert_eq!(location.state, None);
}

#[tokio::test]
async fn stored_descriptor_skips_empty_cached_city() {
  let (_, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.timezone_offset = Some("-5_1".into());
  c.city = Some(String::new());
  c.state = Some("TN".into());

  let location = ctx.location(&c).await.unwrap().unwrap();
  assert_eq!(location.timezone_offset, -5);
  assert_eq!(location.city, None);
  assert_eq!(location.state, None);
}

#[tokio::test]
async fn malformed_descriptor_falls_through_to_table() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.timezone_offset = Some("EST_1".into());
  c.zip = "60614".into();

  let location = ctx.location(&c).await.unwrap().unwrap();
  assert_eq!(location.timezone(), canvass_core::location::TimezoneInfo::new(-6, true));
  assert_eq!(count(&store.calls.zip), 0);
}

#[tokio::test]
async fn static_table_ignores_city_and_skips_directory() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.zip = "10001-1234".into();

  let location = ctx.location(&c).await.unwrap().unwrap();
  assert_eq!(location.timezone_offset, -5);
  assert!(location.has_dst);
  assert_eq!(location.city, None);
  assert_eq!(count(&store.calls.zip), 0);
}

#[tokio::test]
async fn directory_is_keyed_by_stripped_zip() {
  let mut store = fake();
  store.zips.insert("37902".into(), knoxville());
  let (store, ctx) = context(store);
  let mut c = contact(MessageStatus::Convo);
  c.zip = "37902-0001".into();

  let location = ctx.location(&c).await.unwrap();
  assert_eq!(location, Some(knoxville()));
  assert_eq!(*store.zip_keys.lock().unwrap(), vec!["37902".to_string()]);
}

#[tokio::test]
async fn concurrent_directory_lookups_are_deduplicated() {
  let mut store = fake();
  store.zips.insert("37902".into(), knoxville());
  let (store, ctx) = context(store);
  let c = contact(MessageStatus::Convo);

  let (a, b) = tokio::join!(ctx.location(&c), ctx.location(&c));
  assert_eq!(a.unwrap(), b.unwrap());
  assert_eq!(count(&store.calls.zip), 1);
}

#[tokio::test]
async fn unknown_zip_resolves_to_none() {
  let (_, ctx) = context(fake());
  let c = contact(MessageStatus::Convo);
  assert_eq!(ctx.location(&c).await.unwrap(), None);
}

#[tokio::test]
async fn unusable_zip_skips_every_zip_tier() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.zip = "n/a".into();

  assert_eq!(ctx.location(&c).await.unwrap(), None);
  assert_eq!(count(&store.calls.zip), 0);
}

// ─── Opt-out ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_opt_out_cell_wins_without_lookup() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.hints.opt_out_cell = Prefetched::Resolved("5551234567".into());
  c.hints.is_opted_out = Prefetched::Resolved(false);

  let status = ctx.opt_out(&c).await.unwrap();
  assert_eq!(status, OptOutStatus::opted("5551234567"));
  assert_eq!(count(&store.calls.opt_outs), 0);
  assert_eq!(count(&store.calls.campaign), 0);
}

#[tokio::test]
async fn batch_flag_is_used_directly() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);

  c.hints.is_opted_out = Prefetched::Resolved(true);
  assert_eq!(ctx.opt_out(&c).await.unwrap(), OptOutStatus::opted("+15551234567"));

  c.hints.is_opted_out = Prefetched::Resolved(false);
  assert_eq!(ctx.opt_out(&c).await.unwrap(), OptOutStatus::NotOpted);

  assert_eq!(count(&store.calls.opt_outs), 0);
}

#[tokio::test]
async fn cache_lookup_uses_campaign_organization() {
  let mut store = fake();
  store.opt_outs.insert(ORG_ID, HashSet::from(["+15551234567".to_string()]));
  let (store, ctx) = context(store);
  let c = contact(MessageStatus::Convo);

  let status = ctx.opt_out(&c).await.unwrap();
  assert_eq!(status.into_opt_out().unwrap().cell, "+15551234567");
  assert_eq!(count(&store.calls.campaign), 1);
  assert_eq!(count(&store.calls.opt_outs), 1);
}

#[tokio::test]
async fn not_opted_out_is_explicit_none() {
  let (_, ctx) = context(fake());
  let c = contact(MessageStatus::Convo);

  let status = ctx.opt_out(&c).await.unwrap();
  assert_eq!(status, OptOutStatus::NotOpted);
  assert!(status.into_opt_out().is_none());
}

#[tokio::test]
async fn prefetched_organization_skips_campaign() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.hints.organization_id = Prefetched::Resolved(ORG_ID);

  ctx.opt_out(&c).await.unwrap();
  assert_eq!(count(&store.calls.campaign), 0);
  assert_eq!(count(&store.calls.opt_outs), 1);
}

#[tokio::test]
async fn missing_campaign_is_an_integrity_error() {
  let (_, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.campaign_id = 999;

  let err = ctx.opt_out(&c).await.unwrap_err();
  assert!(matches!(err, Error::CampaignNotFound(999)));
}

#[tokio::test]
async fn opt_out_cache_is_shared_across_requests() {
  let store = Arc::new(fake());
  let cache = Arc::new(OptOutCache::new(Arc::clone(&store), Duration::from_secs(60)));
  let c = contact(MessageStatus::Convo);

  for _ in 0..3 {
    let ctx = RequestContext::new(Arc::clone(&store), Arc::clone(&cache));
    ctx.opt_out(&c).await.unwrap();
  }
  assert_eq!(count(&store.calls.opt_outs), 1);

  cache.invalidate(ORG_ID).await;
  let ctx = RequestContext::new(Arc::clone(&store), Arc::clone(&cache));
  ctx.opt_out(&c).await.unwrap();
  assert_eq!(count(&store.calls.opt_outs), 2);
}

#[tokio::test]
async fn expired_cache_entries_reload() {
  let store = Arc::new(fake());
  let cache = OptOutCache::new(Arc::clone(&store), Duration::ZERO);

  cache.query("+1", ORG_ID).await.unwrap();
  cache.query("+1", ORG_ID).await.unwrap();
  assert_eq!(count(&store.calls.opt_outs), 2);
}

#[tokio::test]
async fn opt_out_index_failure_propagates() {
  let mut store = fake();
  store.failing = true;
  let (_, ctx) = context(store);
  let mut c = contact(MessageStatus::Convo);
  c.hints.organization_id = Prefetched::Resolved(ORG_ID);

  assert!(matches!(ctx.opt_out(&c).await, Err(Error::Store(_))));
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn prefetched_messages_are_returned_as_is() {
  let (store, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);
  c.hints.messages = Prefetched::Resolved(vec![message(1, 10)]);

  let messages = ctx.messages(&c).await;
  assert_eq!(messages.value, vec![message(1, 10)]);
  assert_eq!(count(&store.calls.messages), 0);
}

#[tokio::test]
async fn needs_message_never_reads_legacy_rows() {
  let mut store = fake();
  store.legacy = vec![message(7, 10)];
  let (store, ctx) = context(store);
  let c = contact(MessageStatus::NeedsMessage);

  let messages = ctx.messages(&c).await;
  assert!(messages.value.is_empty());
  assert!(!messages.is_degraded());
  assert_eq!(count(&store.calls.messages), 1);
  assert_eq!(count(&store.calls.legacy), 0);
}

#[tokio::test]
async fn messaged_contact_without_rows_reads_legacy_rows() {
  let mut store = fake();
  store.legacy = vec![message(7, 10), message(8, 20)];
  let (store, ctx) = context(store);
  let c = contact(MessageStatus::Messaged);

  let messages = ctx.messages(&c).await.into_value();
  assert_eq!(messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![7, 8]);
  assert_eq!(count(&store.calls.legacy), 1);
}

#[tokio::test]
async fn contact_keyed_messages_skip_legacy_rows() {
  let mut store = fake();
  store.messages = vec![message(1, 10)];
  store.legacy = vec![message(7, 10)];
  let (store, ctx) = context(store);
  let c = contact(MessageStatus::Convo);

  assert_eq!(ctx.messages(&c).await.value, vec![message(1, 10)]);
  assert_eq!(count(&store.calls.legacy), 0);
}

#[tokio::test]
async fn message_failure_degrades_to_empty() {
  let mut store = fake();
  store.failing = true;
  let (_, ctx) = context(store);

  let messages = ctx.messages(&contact(MessageStatus::Convo)).await;
  assert!(messages.value.is_empty());
  assert!(matches!(messages.degraded, Some(Error::Store(_))));
}

// ─── Question responses ──────────────────────────────────────────────────────

fn join_row(option_step_id: i64, option_value: &str) -> ResponseJoinRow {
  ResponseJoinRow {
    response_id:           100,
    response_value:        "No".into(),
    response_created_at:   at(500),
    question_step_id:      50,
    question:              "Will you vote?".into(),
    campaign_id:           CAMPAIGN_ID,
    script_options:        ScriptOptions::single("Hi {firstName}"),
    parent_interaction_id: None,
    option_step_id,
    option_value:          option_value.into(),
    option_created_at:     at(100),
  }
}

#[tokio::test]
async fn needs_message_skips_response_query() {
  let (store, ctx) = context(fake());
  let c = contact(MessageStatus::NeedsMessage);

  assert!(ctx.question_responses(&c).await.value.is_empty());
  assert!(ctx.question_response_values(&c).await.value.is_empty());
  assert_eq!(count(&store.calls.rows), 0);
  assert_eq!(count(&store.calls.values), 0);
}

#[tokio::test]
async fn responses_are_aggregated() {
  let mut store = fake();
  store.rows = vec![join_row(51, "Yes"), join_row(52, "No")];
  let (_, ctx) = context(store);

  let responses = ctx.question_responses(&contact(MessageStatus::Convo)).await;
  assert!(!responses.is_degraded());
  assert_eq!(responses.value.len(), 1);

  let response = &responses.value[0];
  assert_eq!(response.interaction_step_id, 52);
  assert_eq!(response.parent_interaction_step.question, "Will you vote?");
  assert_eq!(response.parent_interaction_step.answer_options.len(), 2);
}

#[tokio::test]
async fn response_query_failure_degrades_to_empty() {
  let mut store = fake();
  store.rows = vec![join_row(51, "Yes")];
  store.failing = true;
  let (_, ctx) = context(store);

  let responses = ctx.question_responses(&contact(MessageStatus::Convo)).await;
  assert!(responses.value.is_empty());
  assert!(responses.is_degraded());
}

#[tokio::test]
async fn response_values_are_passed_through() {
  let mut store = fake();
  store.values = vec![QuestionResponseValue {
    value:               "Yes".into(),
    interaction_step_id: 50,
    question:            QuestionRef { id: 50, question: "Will you vote?".into() },
  }];
  let (_, ctx) = context(store);

  let values = ctx.question_response_values(&contact(MessageStatus::Convo)).await;
  assert_eq!(values.value.len(), 1);
  assert_eq!(values.value[0].question.id, 50);
}

// ─── Tags ────────────────────────────────────────────────────────────────────

fn tag() -> Tag {
  Tag {
    id:              1,
    organization_id: ORG_ID,
    name:            "volunteer".into(),
    description:     None,
  }
}

#[tokio::test]
async fn tags_require_a_user() {
  let (store, ctx) = context(fake());
  let err = ctx.contact_tags(&contact(MessageStatus::Convo)).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  assert_eq!(count(&store.calls.tags), 0);
}

#[tokio::test]
async fn tags_reject_users_outside_the_organization() {
  let mut store = fake();
  store.roles.insert((77, ORG_ID + 1), Role::Owner);
  let (store, ctx) = context(store);
  let ctx = ctx.with_user(Some(77));

  let err = ctx.contact_tags(&contact(MessageStatus::Convo)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Forbidden { user_id: 77, organization_id: ORG_ID, required: Role::Texter }
  ));
  assert_eq!(count(&store.calls.tags), 0);
}

#[tokio::test]
async fn texters_can_read_tags() {
  let mut store = fake();
  store.roles.insert((77, ORG_ID), Role::Texter);
  store.tags = vec![tag()];
  let (_, ctx) = context(store);
  let ctx = ctx.with_user(Some(77));

  let tags = ctx.contact_tags(&contact(MessageStatus::Convo)).await.unwrap();
  assert_eq!(tags, vec![tag()]);
}

#[tokio::test]
async fn higher_roles_can_read_tags() {
  let mut store = fake();
  store.roles.insert((77, ORG_ID), Role::Admin);
  let (_, ctx) = context(store);
  let ctx = ctx.with_user(Some(77));

  assert!(ctx.contact_tags(&contact(MessageStatus::Convo)).await.is_ok());
}

// ─── Plain fields ────────────────────────────────────────────────────────────

#[tokio::test]
async fn updated_at_falls_back_through_messages_to_created_at() {
  let (_, ctx) = context(fake());
  let mut c = contact(MessageStatus::Convo);

  assert_eq!(ctx.updated_at(&c), at(1_000));

  c.hints.messages = Prefetched::Resolved(vec![message(1, 2_000), message(2, 3_000)]);
  assert_eq!(ctx.updated_at(&c), at(3_000));

  c.hints.messages = Prefetched::Resolved(Vec::new());
  assert_eq!(ctx.updated_at(&c), at(1_000));

  c.updated_at = Some(at(5_000));
  assert_eq!(ctx.updated_at(&c), at(5_000));
}

#[tokio::test]
async fn campaign_loads_are_cached_per_request() {
  let (store, ctx) = context(fake());
  let c = contact(MessageStatus::Convo);

  let (a, b) = tokio::join!(ctx.campaign(&c), ctx.campaign(&c));
  assert_eq!(a.unwrap().unwrap().organization_id, ORG_ID);
  assert!(b.unwrap().is_some());
  ctx.opt_out(&c).await.unwrap();
  assert_eq!(count(&store.calls.campaign), 1);
  assert_eq!(ctx.message_status(&c), MessageStatus::Convo);
}
