//! Contact tags, gated by organisation access.

use canvass_core::{
  access::Role,
  contact::Contact,
  store::{AccessPolicy, ContactStore},
  tag::Tag,
};

use crate::{Backend, Error, RequestContext, Result};

impl<S: Backend> RequestContext<S> {
  /// Fail unless the requesting user holds at least `required` in
  /// `organization_id`.
  pub async fn require_role(
    &self,
    organization_id: i64,
    required: Role,
  ) -> Result<()> {
    let user_id = self.user_id().ok_or(Error::Unauthenticated)?;

    let role = self
      .store
      .role_of(user_id, organization_id)
      .await
      .map_err(Error::store)?;

    match role {
      Some(role) if role.satisfies(required) => Ok(()),
      _ => Err(Error::Forbidden { user_id, organization_id, required }),
    }
  }

  /// The contact's tags. The requesting user must be at least a texter in
  /// the organisation owning the contact's campaign.
  pub async fn contact_tags(&self, contact: &Contact) -> Result<Vec<Tag>> {
    let organization_id = self.campaign_organization(contact.campaign_id).await?;
    self.require_role(organization_id, Role::Texter).await?;

    self
      .store
      .contact_tags(contact.id)
      .await
      .map_err(Error::store)
  }
}
