//! Campaigns and the scripted interaction-step tree they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A campaign; only the fields the contact layer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
  pub id:              i64,
  pub organization_id: i64,
  pub title:           String,
}

// ─── Script options ──────────────────────────────────────────────────────────

/// The ordered script variants of an interaction step. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScriptOptions(Vec<String>);

impl ScriptOptions {
  pub fn new(scripts: Vec<String>) -> Result<Self> {
    if scripts.is_empty() {
      return Err(Error::EmptyScriptOptions);
    }
    Ok(Self(scripts))
  }

  /// Wrap a single script, as the legacy scalar `script` column did.
  pub fn single(script: impl Into<String>) -> Self { Self(vec![script.into()]) }

  /// The primary script variant.
  pub fn first(&self) -> &str { &self.0[0] }

  pub fn as_slice(&self) -> &[String] { &self.0 }
}

impl TryFrom<Vec<String>> for ScriptOptions {
  type Error = Error;

  fn try_from(scripts: Vec<String>) -> Result<Self> { Self::new(scripts) }
}

impl From<ScriptOptions> for Vec<String> {
  fn from(options: ScriptOptions) -> Self { options.0 }
}

// ─── Interaction steps ───────────────────────────────────────────────────────

/// A node in a campaign's scripted question tree.
///
/// A step whose `parent_interaction_id` is set is also an answer option of its
/// parent; `answer_option` is the label that answer carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStep {
  pub id:                    i64,
  pub campaign_id:           i64,
  pub question:              String,
  pub script_options:        ScriptOptions,
  pub answer_option:         String,
  pub parent_interaction_id: Option<i64>,
  pub created_at:            DateTime<Utc>,
}

/// Input for creating an interaction step during campaign setup.
#[derive(Debug, Clone)]
pub struct NewInteractionStep {
  pub campaign_id:           i64,
  pub question:              String,
  pub script_options:        ScriptOptions,
  pub answer_option:         String,
  pub parent_interaction_id: Option<i64>,
}

impl NewInteractionStep {
  /// A root question step.
  pub fn question(
    campaign_id: i64,
    question: impl Into<String>,
    script_options: ScriptOptions,
  ) -> Self {
    Self {
      campaign_id,
      question: question.into(),
      script_options,
      answer_option: String::new(),
      parent_interaction_id: None,
    }
  }

  /// A child step that doubles as the answer option `label` of `parent_id`.
  pub fn answer(
    campaign_id: i64,
    parent_id: i64,
    label: impl Into<String>,
    script_options: ScriptOptions,
  ) -> Self {
    Self {
      campaign_id,
      question: String::new(),
      script_options,
      answer_option: label.into(),
      parent_interaction_id: Some(parent_id),
    }
  }
}
