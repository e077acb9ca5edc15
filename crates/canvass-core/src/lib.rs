//! Core types and trait definitions for the Canvass contact field layer.
//!
//! This crate has no HTTP or database dependencies. It holds the domain
//! model, the collaborator traits that storage backends implement, and the
//! pure algorithms (zip-timezone lookup, location descriptor parsing,
//! join-row aggregation) that need no I/O.

pub mod access;
pub mod campaign;
pub mod contact;
pub mod error;
pub mod location;
pub mod message;
pub mod opt_out;
pub mod response;
pub mod store;
pub mod tag;
pub mod zip_table;

pub use error::{Error, Result};
