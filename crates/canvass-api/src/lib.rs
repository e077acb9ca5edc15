//! JSON REST API for Canvass contacts.
//!
//! Exposes an axum [`Router`] over any [`canvass_resolve::Backend`]. Each
//! request gets its own [`RequestContext`], so lookups shared by several
//! fields of one contact are made once. Authentication happens upstream; the
//! authenticated user arrives in the [`user::USER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", canvass_api::api_router(state))
//! ```

pub mod contacts;
pub mod error;
pub mod user;

use std::sync::Arc;

use axum::{Router, routing::get};
use canvass_resolve::{Backend, OptOutCache, RequestContext};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub opt_outs: Arc<OptOutCache<S>>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      opt_outs: Arc::clone(&self.opt_outs),
    }
  }
}

impl<S: Backend> ApiState<S> {
  /// A fresh resolver context for one inbound request.
  pub fn context(&self, user_id: Option<i64>) -> RequestContext<S> {
    RequestContext::new(Arc::clone(&self.store), Arc::clone(&self.opt_outs))
      .with_user(user_id)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(state: ApiState<S>) -> Router<()> {
  Router::new()
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .route("/contacts/{id}/location", get(contacts::location::<S>))
    .route("/contacts/{id}/opt-out", get(contacts::opt_out::<S>))
    .route(
      "/contacts/{id}/question-responses",
      get(contacts::question_responses::<S>),
    )
    .route(
      "/contacts/{id}/question-response-values",
      get(contacts::question_response_values::<S>),
    )
    .route("/contacts/{id}/messages", get(contacts::messages::<S>))
    .route("/contacts/{id}/tags", get(contacts::tags::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
