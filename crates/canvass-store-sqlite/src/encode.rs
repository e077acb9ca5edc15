//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. `script_options` and `custom_fields` are
//! compact JSON. Enums are stored by their canonical names.

use canvass_core::{
  access::Role,
  campaign::{InteractionStep, ScriptOptions},
  contact::{BatchHints, Contact, MessageStatus},
  location::Location,
  message::Message,
  response::{QuestionRef, QuestionResponseValue, ResponseJoinRow},
};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ScriptOptions ───────────────────────────────────────────────────────────

pub fn encode_script_options(options: &ScriptOptions) -> Result<String> {
  Ok(serde_json::to_string(options.as_slice())?)
}

pub fn decode_script_options(s: &str) -> Result<ScriptOptions> {
  let scripts: Vec<String> = serde_json::from_str(s)?;
  Ok(ScriptOptions::new(scripts)?)
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_message_status(s: &str) -> Result<MessageStatus> { Ok(s.parse()?) }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `campaign_contact` row.
pub struct RawContact {
  pub id:              i64,
  pub campaign_id:     i64,
  pub assignment_id:   Option<i64>,
  pub first_name:      String,
  pub last_name:       String,
  pub cell:            String,
  pub zip:             String,
  pub external_id:     Option<String>,
  pub custom_fields:   String,
  pub message_status:  String,
  pub timezone_offset: Option<String>,
  pub city:            Option<String>,
  pub state:           Option<String>,
  pub created_at:      String,
  pub updated_at:      Option<String>,
}

pub const CONTACT_COLUMNS: &str = "id, campaign_id, assignment_id, first_name, \
  last_name, cell, zip, external_id, custom_fields, message_status, \
  timezone_offset, city, state, created_at, updated_at";

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      campaign_id:     row.get(1)?,
      assignment_id:   row.get(2)?,
      first_name:      row.get(3)?,
      last_name:       row.get(4)?,
      cell:            row.get(5)?,
      zip:             row.get(6)?,
      external_id:     row.get(7)?,
      custom_fields:   row.get(8)?,
      message_status:  row.get(9)?,
      timezone_offset: row.get(10)?,
      city:            row.get(11)?,
      state:           row.get(12)?,
      created_at:      row.get(13)?,
      updated_at:      row.get(14)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:              self.id,
      campaign_id:     self.campaign_id,
      assignment_id:   self.assignment_id,
      first_name:      self.first_name,
      last_name:       self.last_name,
      cell:            self.cell,
      zip:             self.zip,
      external_id:     self.external_id,
      custom_fields:   serde_json::from_str(&self.custom_fields)?,
      message_status:  decode_message_status(&self.message_status)?,
      timezone_offset: self.timezone_offset,
      city:            self.city,
      state:           self.state,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      self.updated_at.as_deref().map(decode_dt).transpose()?,
      hints:           BatchHints::default(),
    })
  }
}

/// Raw values from an `interaction_step` row.
pub struct RawStep {
  pub id:                    i64,
  pub campaign_id:           i64,
  pub question:              String,
  pub script_options:        String,
  pub answer_option:         String,
  pub parent_interaction_id: Option<i64>,
  pub created_at:            String,
}

impl RawStep {
  pub fn into_step(self) -> Result<InteractionStep> {
    Ok(InteractionStep {
      id:                    self.id,
      campaign_id:           self.campaign_id,
      question:              self.question,
      script_options:        decode_script_options(&self.script_options)?,
      answer_option:         self.answer_option,
      parent_interaction_id: self.parent_interaction_id,
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from the response × sibling-option self-join.
pub struct RawJoinRow {
  pub response_id:           i64,
  pub response_value:        String,
  pub response_created_at:   String,
  pub question_step_id:      i64,
  pub question:              String,
  pub campaign_id:           i64,
  pub script_options:        String,
  pub parent_interaction_id: Option<i64>,
  pub option_step_id:        i64,
  pub option_value:          String,
  pub option_created_at:     String,
}

impl RawJoinRow {
  pub fn into_join_row(self) -> Result<ResponseJoinRow> {
    Ok(ResponseJoinRow {
      response_id:           self.response_id,
      response_value:        self.response_value,
      response_created_at:   decode_dt(&self.response_created_at)?,
      question_step_id:      self.question_step_id,
      question:              self.question,
      campaign_id:           self.campaign_id,
      script_options:        decode_script_options(&self.script_options)?,
      parent_interaction_id: self.parent_interaction_id,
      option_step_id:        self.option_step_id,
      option_value:          self.option_value,
      option_created_at:     decode_dt(&self.option_created_at)?,
    })
  }
}

/// Raw values from `question_response ⋈ interaction_step`.
pub struct RawResponseValue {
  pub value:               String,
  pub interaction_step_id: i64,
  pub question:            String,
}

impl From<RawResponseValue> for QuestionResponseValue {
  fn from(raw: RawResponseValue) -> Self {
    Self {
      value:               raw.value,
      interaction_step_id: raw.interaction_step_id,
      question:            QuestionRef {
        id:       raw.interaction_step_id,
        question: raw.question,
      },
    }
  }
}

/// Raw values from a `message` row.
pub struct RawMessage {
  pub id:                  i64,
  pub campaign_contact_id: Option<i64>,
  pub assignment_id:       Option<i64>,
  pub contact_number:      String,
  pub text:                String,
  pub is_from_contact:     bool,
  pub created_at:          String,
}

pub const MESSAGE_COLUMNS: &str = "id, campaign_contact_id, assignment_id, \
  contact_number, text, is_from_contact, created_at";

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      campaign_contact_id: row.get(1)?,
      assignment_id:       row.get(2)?,
      contact_number:      row.get(3)?,
      text:                row.get(4)?,
      is_from_contact:     row.get(5)?,
      created_at:          row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      id:                  self.id,
      campaign_contact_id: self.campaign_contact_id,
      assignment_id:       self.assignment_id,
      contact_number:      self.contact_number,
      text:                self.text,
      is_from_contact:     self.is_from_contact,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from a `zip_code` row.
pub struct RawZip {
  pub city:            String,
  pub state:           String,
  pub timezone_offset: i32,
  pub has_dst:         bool,
}

impl From<RawZip> for Location {
  fn from(raw: RawZip) -> Self {
    Self {
      timezone_offset: raw.timezone_offset,
      has_dst:         raw.has_dst,
      city:            Some(raw.city),
      state:           Some(raw.state),
    }
  }
}
