//! Tiered location resolution.

use canvass_core::{
  contact::Contact,
  location::{Location, TimezoneInfo, main_zip},
  zip_table,
};

use tracing::Instrument as _;

use crate::{Backend, RequestContext, Result};

impl<S: Backend> RequestContext<S> {
  /// Resolve the contact's timezone (and city/state when known).
  ///
  /// Sources are tried cheapest first and the first hit wins: the descriptor
  /// stored on the contact, then the static zip table, then the zip
  /// directory through the request's zip loader. An unparseable descriptor
  /// falls through to the zip tiers.
  pub async fn location(&self, contact: &Contact) -> Result<Option<Location>> {
    let span = tracing::debug_span!(
      "location",
      request_id = %self.request_id(),
      contact_id = contact.id,
    );
    self.resolve_location(contact).instrument(span).await
  }

  async fn resolve_location(&self, contact: &Contact) -> Result<Option<Location>> {
    if let Some(descriptor) = contact.timezone_offset.as_deref()
      && !descriptor.is_empty()
    {
      match TimezoneInfo::parse_descriptor(descriptor) {
        Some(tz) => {
          let mut location = Location::from(tz);
          if let Some(city) = &contact.city
            && !city.is_empty()
          {
            location.city = Some(city.clone());
            location.state = contact.state.clone();
          }
          return Ok(Some(location));
        }
        None => {
          tracing::debug!(descriptor, "unparseable timezone descriptor");
        }
      }
    }

    let Some(zip) = main_zip(&contact.zip) else {
      tracing::debug!(zip = %contact.zip, "no usable zip prefix");
      return Ok(None);
    };

    if let Some(tz) = zip_table::lookup(zip) {
      return Ok(Some(Location::from(tz)));
    }

    tracing::debug!(zip, "zip not in static table; asking zip directory");
    self.load_zip(zip).await
  }
}
