//! Field resolvers for a campaign contact.
//!
//! Every derived field of a contact (location, opt-out, question responses,
//! messages, tags, …) is resolved by an async method on [`RequestContext`].
//! Resolvers are independent of each other; within one request they share
//! only the context's deduplicating loaders, so they can run concurrently.

mod best_effort;
mod context;
mod fields;
mod location;
mod messages;
mod opt_out;
mod responses;
mod tags;

pub mod error;
pub mod loader;

pub use best_effort::BestEffort;
pub use context::RequestContext;
pub use error::{Error, Result};
pub use opt_out::OptOutCache;

use canvass_core::store::{AccessPolicy, ContactStore, OptOutIndex, ZipDirectory};

/// Everything the resolvers need from a backend.
pub trait Backend:
  ContactStore + ZipDirectory + OptOutIndex + AccessPolicy + 'static
{
}

impl<T> Backend for T where
  T: ContactStore + ZipDirectory + OptOutIndex + AccessPolicy + 'static
{
}

#[cfg(test)]
mod tests;
