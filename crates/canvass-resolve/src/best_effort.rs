use crate::{Error, Result};

/// The outcome of a display-only resolver.
///
/// A data-source failure does not fail the field: the value degrades to its
/// empty form and the failure is kept in `degraded` for the caller to log.
#[derive(Debug)]
pub struct BestEffort<T> {
  pub value:    T,
  pub degraded: Option<Error>,
}

impl<T> BestEffort<T> {
  pub fn ok(value: T) -> Self { Self { value, degraded: None } }

  pub fn is_degraded(&self) -> bool { self.degraded.is_some() }

  pub fn into_value(self) -> T { self.value }
}

impl<T: Default> BestEffort<T> {
  pub fn from_result(result: Result<T>) -> Self {
    match result {
      Ok(value) => Self::ok(value),
      Err(e) => Self { value: T::default(), degraded: Some(e) },
    }
  }
}
