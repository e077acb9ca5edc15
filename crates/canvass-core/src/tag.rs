//! Organisation-scoped contact tags.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id:              i64,
  pub organization_id: i64,
  pub name:            String,
  pub description:     Option<String>,
}
