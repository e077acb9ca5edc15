//! Recorded question responses and the aggregation that rebuilds the
//! question → answer-options tree from flat join rows.
//!
//! Responses are append-only history. The answer options of a response are
//! not stored anywhere; they are the child steps of the step that solicited
//! the response, recovered at read time through a self-join of
//! `interaction_step`.

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::ScriptOptions;

/// A stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
  pub id:                  i64,
  pub campaign_contact_id: i64,
  pub interaction_step_id: i64,
  pub value:               String,
  pub created_at:          DateTime<Utc>,
}

// ─── Join rows ───────────────────────────────────────────────────────────────

/// One row of `question_response ⋈ interaction_step ⋈ interaction_step child`:
/// a response paired with one sibling answer option of the step it answered.
#[derive(Debug, Clone)]
pub struct ResponseJoinRow {
  pub response_id:           i64,
  pub response_value:        String,
  pub response_created_at:   DateTime<Utc>,
  /// The step that solicited the response.
  pub question_step_id:      i64,
  pub question:              String,
  pub campaign_id:           i64,
  pub script_options:        ScriptOptions,
  pub parent_interaction_id: Option<i64>,
  /// The sibling answer option carried by this row.
  pub option_step_id:        i64,
  pub option_value:          String,
  pub option_created_at:     DateTime<Utc>,
}

// ─── Aggregated output ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
  pub value:               String,
  pub interaction_step_id: i64,
}

/// The question a response answered, with every answer it offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInteractionStep {
  pub id:                    i64,
  pub question:              String,
  pub campaign_id:           i64,
  pub script_options:        ScriptOptions,
  pub parent_interaction_id: Option<i64>,
  pub answer_options:        Vec<AnswerOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResponse {
  pub response_id:             i64,
  pub value:                   String,
  pub created_at:              DateTime<Utc>,
  /// The answer-option step whose label equals `value`. When no option
  /// matches, this stays the first option seen.
  pub interaction_step_id:     i64,
  pub parent_interaction_step: ParentInteractionStep,
}

/// Fold join rows into one [`ResolvedResponse`] per response id.
///
/// Rows are consumed in order. The first row of a response seeds its record;
/// every later row appends its option and, if the option's label equals the
/// recorded value, claims the matched step id. Duplicate labels resolve
/// last-write-wins.
pub fn aggregate_responses<I>(rows: I) -> BTreeMap<i64, ResolvedResponse>
where
  I: IntoIterator<Item = ResponseJoinRow>,
{
  let mut formatted: BTreeMap<i64, ResolvedResponse> = BTreeMap::new();

  for row in rows {
    let option = AnswerOption {
      value:               row.option_value,
      interaction_step_id: row.option_step_id,
    };

    match formatted.entry(row.response_id) {
      Entry::Occupied(mut entry) => {
        let resolved = entry.get_mut();
        if resolved.value == option.value {
          resolved.interaction_step_id = option.interaction_step_id;
        }
        resolved.parent_interaction_step.answer_options.push(option);
      }
      Entry::Vacant(entry) => {
        entry.insert(ResolvedResponse {
          response_id:             row.response_id,
          value:                   row.response_value,
          created_at:              row.response_created_at,
          interaction_step_id:     option.interaction_step_id,
          parent_interaction_step: ParentInteractionStep {
            id:                    row.question_step_id,
            question:              row.question,
            campaign_id:           row.campaign_id,
            script_options:        row.script_options,
            parent_interaction_id: row.parent_interaction_id,
            answer_options:        vec![option],
          },
        });
      }
    }
  }

  formatted
}

// ─── Flat values ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
  pub id:       i64,
  pub question: String,
}

/// A response paired with just the question it answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponseValue {
  pub value:               String,
  pub interaction_step_id: i64,
  pub question:            QuestionRef,
}
