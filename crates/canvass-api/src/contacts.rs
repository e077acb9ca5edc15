//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts/{id}` | Every derived field, resolved concurrently |
//! | `GET`  | `/contacts/{id}/location` | `null` when unknown |
//! | `GET`  | `/contacts/{id}/opt-out` | `null` when not opted out |
//! | `GET`  | `/contacts/{id}/question-responses` | |
//! | `GET`  | `/contacts/{id}/question-response-values` | |
//! | `GET`  | `/contacts/{id}/messages` | Oldest first |
//! | `GET`  | `/contacts/{id}/tags` | Requires `x-canvass-user` with texter access |

use axum::{
  Json,
  extract::{Path, State},
};
use canvass_core::{
  campaign::Campaign,
  contact::{Contact, MessageStatus},
  location::Location,
  message::Message,
  opt_out::OptOut,
  response::{QuestionResponseValue, ResolvedResponse},
  tag::Tag,
};
use canvass_resolve::{Backend, BestEffort, RequestContext};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{ApiState, error::ApiError, user::RequestUser};

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn load_contact<S: Backend>(
  ctx: &RequestContext<S>,
  id:  i64,
) -> Result<Contact, ApiError> {
  ctx
    .contact(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))
}

/// Unwrap a display-only field, logging the failure it degraded from.
fn settle<T, S: Backend>(
  ctx:    &RequestContext<S>,
  field:  &'static str,
  result: BestEffort<T>,
) -> T {
  if let Some(e) = &result.degraded {
    tracing::warn!(
      request_id = %ctx.request_id(),
      field,
      error = %e,
      "field degraded to empty"
    );
  }
  result.into_value()
}

// ─── Full view ────────────────────────────────────────────────────────────────

/// A contact with every derived field resolved.
#[derive(Debug, Serialize)]
pub struct ContactView {
  pub contact:                  Contact,
  pub campaign:                 Option<Campaign>,
  pub location:                 Option<Location>,
  pub opt_out:                  Option<OptOut>,
  pub question_responses:       Vec<ResolvedResponse>,
  pub question_response_values: Vec<QuestionResponseValue>,
  pub messages:                 Vec<Message>,
  pub message_status:           MessageStatus,
  pub updated_at:               DateTime<Utc>,
}

/// `GET /contacts/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<ContactView>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;

  let (campaign, location, opt_out, responses, values, messages) = tokio::join!(
    ctx.campaign(&contact),
    ctx.location(&contact),
    ctx.opt_out(&contact),
    ctx.question_responses(&contact),
    ctx.question_response_values(&contact),
    ctx.messages(&contact),
  );

  let view = ContactView {
    campaign:                 campaign?,
    location:                 location?,
    opt_out:                  opt_out?.into_opt_out(),
    question_responses:       settle(&ctx, "question_responses", responses),
    question_response_values: settle(&ctx, "question_response_values", values),
    messages:                 settle(&ctx, "messages", messages),
    message_status:           ctx.message_status(&contact),
    updated_at:               ctx.updated_at(&contact),
    contact,
  };
  Ok(Json(view))
}

// ─── Single fields ────────────────────────────────────────────────────────────

/// `GET /contacts/{id}/location`
pub async fn location<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Option<Location>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  Ok(Json(ctx.location(&contact).await?))
}

/// `GET /contacts/{id}/opt-out`
pub async fn opt_out<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Option<OptOut>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  Ok(Json(ctx.opt_out(&contact).await?.into_opt_out()))
}

/// `GET /contacts/{id}/question-responses`
pub async fn question_responses<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Vec<ResolvedResponse>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  let responses = ctx.question_responses(&contact).await;
  Ok(Json(settle(&ctx, "question_responses", responses)))
}

/// `GET /contacts/{id}/question-response-values`
pub async fn question_response_values<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Vec<QuestionResponseValue>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  let values = ctx.question_response_values(&contact).await;
  Ok(Json(settle(&ctx, "question_response_values", values)))
}

/// `GET /contacts/{id}/messages`
pub async fn messages<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  let messages = ctx.messages(&contact).await;
  Ok(Json(settle(&ctx, "messages", messages)))
}

/// `GET /contacts/{id}/tags`
pub async fn tags<S: Backend>(
  State(state): State<ApiState<S>>,
  RequestUser(user): RequestUser,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Tag>>, ApiError> {
  let ctx = state.context(user);
  let contact = load_contact(&ctx, id).await?;
  Ok(Json(ctx.contact_tags(&contact).await?))
}
