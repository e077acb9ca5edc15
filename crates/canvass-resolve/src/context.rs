//! [`RequestContext`]: per-request state shared by all field resolvers.

use std::sync::Arc;

use canvass_core::{
  campaign::Campaign,
  contact::{Contact, Prefetched},
  location::Location,
  store::{ContactStore, ZipDirectory},
};
use uuid::Uuid;

use crate::{Backend, Error, OptOutCache, Result, loader::Loader};

/// Per-request resolver state.
///
/// Holds the backend, the process-wide opt-out cache, and loaders that
/// deduplicate campaign and zip lookups across every field resolved for the
/// request. Build one per inbound request and drop it afterwards.
pub struct RequestContext<S: Backend> {
  request_id:          Uuid,
  user_id:             Option<i64>,
  pub(crate) store:    Arc<S>,
  pub(crate) opt_outs: Arc<OptOutCache<S>>,
  campaigns:           Loader<i64, Option<Campaign>>,
  zips:                Loader<String, Option<Location>>,
}

impl<S: Backend> RequestContext<S> {
  pub fn new(store: Arc<S>, opt_outs: Arc<OptOutCache<S>>) -> Self {
    Self {
      request_id: Uuid::new_v4(),
      user_id: None,
      store,
      opt_outs,
      campaigns: Loader::new("campaign"),
      zips: Loader::new("zip_code"),
    }
  }

  /// Attach the authenticated user making the request.
  pub fn with_user(mut self, user_id: Option<i64>) -> Self {
    self.user_id = user_id;
    self
  }

  pub fn request_id(&self) -> Uuid { self.request_id }

  pub fn user_id(&self) -> Option<i64> { self.user_id }

  /// Fetch a contact by id.
  pub async fn contact(&self, id: i64) -> Result<Option<Contact>> {
    self.store.get_contact(id).await.map_err(Error::store)
  }

  /// Load a campaign through the per-request campaign loader.
  pub async fn load_campaign(&self, id: i64) -> Result<Option<Campaign>> {
    let store = Arc::clone(&self.store);
    self
      .campaigns
      .load(id, move |id| async move {
        store.get_campaign(id).await.map_err(Error::store)
      })
      .await
  }

  /// Load a zip's location through the per-request zip loader.
  pub(crate) async fn load_zip(&self, zip: &str) -> Result<Option<Location>> {
    let store = Arc::clone(&self.store);
    self
      .zips
      .load(zip.to_owned(), move |zip| async move {
        store.locate_zip(&zip).await.map_err(Error::store)
      })
      .await
  }

  /// The organisation owning `contact`: the batch-provided id when present,
  /// otherwise the contact's campaign's organisation.
  pub(crate) async fn organization_id(&self, contact: &Contact) -> Result<i64> {
    if let Prefetched::Resolved(id) = contact.hints.organization_id {
      return Ok(id);
    }
    self.campaign_organization(contact.campaign_id).await
  }

  pub(crate) async fn campaign_organization(&self, campaign_id: i64) -> Result<i64> {
    self
      .load_campaign(campaign_id)
      .await?
      .map(|campaign| campaign.organization_id)
      .ok_or(Error::CampaignNotFound(campaign_id))
  }
}
