//! [`SqliteStore`], the SQLite implementation of the Canvass collaborator
//! traits.

use std::{collections::HashSet, path::Path};

use canvass_core::{
  access::Role,
  campaign::{Campaign, InteractionStep, NewInteractionStep},
  contact::{Contact, NewContact},
  location::Location,
  message::{Message, NewMessage},
  response::{QuestionResponse, QuestionResponseValue, ResponseJoinRow},
  store::{AccessPolicy, ContactStore, OptOutIndex, ZipDirectory},
  tag::Tag,
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{
    CONTACT_COLUMNS, MESSAGE_COLUMNS, RawContact, RawJoinRow, RawMessage,
    RawResponseValue, RawStep, RawZip, decode_role, encode_dt,
    encode_script_options,
  },
  migrations,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Canvass store backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and migrate it to the latest schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self::connect(path).await?;
    store.migrate_to(migrations::latest_version()).await?;
    Ok(store)
  }

  /// Open (or create) a store at `path` without touching its schema.
  pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.configure().await?;
    Ok(store)
  }

  /// Open an in-memory store at the latest schema, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.configure().await?;
    store.migrate_to(migrations::latest_version()).await?;
    Ok(store)
  }

  async fn configure(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The schema version currently applied.
  pub async fn schema_version(&self) -> Result<u32> {
    let version = self
      .conn
      .call(|conn| Ok(migrations::current_version(conn)?))
      .await?;
    Ok(version)
  }

  /// Apply or revert migrations until the schema is at `target`.
  /// Returns the version the schema was at before.
  pub async fn migrate_to(&self, target: u32) -> Result<u32> {
    if target > migrations::latest_version() {
      return Err(Error::UnknownVersion(target));
    }
    let previous = self
      .conn
      .call(move |conn| Ok(migrations::migrate_to(conn, target)?))
      .await?;
    Ok(previous)
  }

  // ── Campaign setup ──────────────────────────────────────────────────────

  pub async fn create_organization(&self, name: &str) -> Result<i64> {
    let name = name.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO organization (name) VALUES (?1)",
          rusqlite::params![name],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Give `user_id` a role in an organisation, replacing any previous one.
  pub async fn grant_role(
    &self,
    user_id:         i64,
    organization_id: i64,
    role:            Role,
  ) -> Result<()> {
    let role_str = role.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_organization (user_id, organization_id, role)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id, organization_id) DO UPDATE SET role = excluded.role",
          rusqlite::params![user_id, organization_id, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn create_campaign(
    &self,
    organization_id: i64,
    title:           &str,
  ) -> Result<Campaign> {
    let title = title.to_owned();
    let title_param = title.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaign (organization_id, title) VALUES (?1, ?2)",
          rusqlite::params![organization_id, title_param],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Campaign { id, organization_id, title })
  }

  pub async fn create_assignment(&self, campaign_id: i64, user_id: i64) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignment (campaign_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![campaign_id, user_id],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn create_contact(&self, input: NewContact) -> Result<Contact> {
    let custom_fields = serde_json::to_string(&input.custom_fields)?;
    let status = input.message_status.as_str();
    let created_at = encode_dt(Utc::now());

    let raw: RawContact = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaign_contact (
             campaign_id, assignment_id, first_name, last_name, cell, zip,
             external_id, custom_fields, message_status, timezone_offset,
             city, state, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            input.campaign_id,
            input.assignment_id,
            input.first_name,
            input.last_name,
            input.cell,
            input.zip,
            input.external_id,
            custom_fields,
            status,
            input.timezone_offset,
            input.city,
            input.state,
            created_at,
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
          &format!("SELECT {CONTACT_COLUMNS} FROM campaign_contact WHERE id = ?1"),
          rusqlite::params![id],
          RawContact::from_row,
        )?)
      })
      .await?;

    raw.into_contact()
  }

  pub async fn create_interaction_step(
    &self,
    input: NewInteractionStep,
  ) -> Result<InteractionStep> {
    let script_options = encode_script_options(&input.script_options)?;
    let now = Utc::now();
    let created_at = encode_dt(now);

    let id = self
      .conn
      .call({
        let question = input.question.clone();
        let answer_option = input.answer_option.clone();
        move |conn| {
          conn.execute(
            "INSERT INTO interaction_step (
               campaign_id, question, script_options, answer_option,
               parent_interaction_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              input.campaign_id,
              question,
              script_options,
              answer_option,
              input.parent_interaction_id,
              created_at,
            ],
          )?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await?;

    Ok(InteractionStep {
      id,
      campaign_id: input.campaign_id,
      question: input.question,
      script_options: input.script_options,
      answer_option: input.answer_option,
      parent_interaction_id: input.parent_interaction_id,
      created_at: now,
    })
  }

  pub async fn get_interaction_step(&self, id: i64) -> Result<Option<InteractionStep>> {
    let raw: Option<RawStep> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, campaign_id, question, script_options, answer_option,
                    parent_interaction_id, created_at
             FROM interaction_step WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawStep {
                id:                    row.get(0)?,
                campaign_id:           row.get(1)?,
                question:              row.get(2)?,
                script_options:        row.get(3)?,
                answer_option:         row.get(4)?,
                parent_interaction_id: row.get(5)?,
                created_at:            row.get(6)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStep::into_step).transpose()
  }

  /// Append a response. Responses are never updated.
  pub async fn record_response(
    &self,
    campaign_contact_id: i64,
    interaction_step_id: i64,
    value:               &str,
  ) -> Result<QuestionResponse> {
    let now = Utc::now();
    let created_at = encode_dt(now);
    let value = value.to_owned();
    let value_param = value.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO question_response
             (campaign_contact_id, interaction_step_id, value, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            campaign_contact_id,
            interaction_step_id,
            value_param,
            created_at
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(QuestionResponse {
      id,
      campaign_contact_id,
      interaction_step_id,
      value,
      created_at: now,
    })
  }

  pub async fn record_message(&self, input: NewMessage) -> Result<Message> {
    let created = input.created_at.unwrap_or_else(Utc::now);
    let created_at = encode_dt(created);
    let contact_number = input.contact_number.clone();
    let text = input.text.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO message (
             campaign_contact_id, assignment_id, contact_number, text,
             is_from_contact, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            input.campaign_contact_id,
            input.assignment_id,
            contact_number,
            text,
            input.is_from_contact,
            created_at,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Message {
      id,
      campaign_contact_id: input.campaign_contact_id,
      assignment_id: input.assignment_id,
      contact_number: input.contact_number,
      text: input.text,
      is_from_contact: input.is_from_contact,
      created_at: created,
    })
  }

  pub async fn create_tag(
    &self,
    organization_id: i64,
    name:            &str,
    description:     Option<&str>,
  ) -> Result<Tag> {
    let tag = Tag {
      id: 0,
      organization_id,
      name: name.to_owned(),
      description: description.map(str::to_owned),
    };
    let (name, description) = (tag.name.clone(), tag.description.clone());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tag (organization_id, name, description) VALUES (?1, ?2, ?3)",
          rusqlite::params![organization_id, name, description],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Tag { id, ..tag })
  }

  pub async fn tag_contact(&self, campaign_contact_id: i64, tag_id: i64) -> Result<()> {
    let created_at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO campaign_contact_tag
             (campaign_contact_id, tag_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![campaign_contact_id, tag_id, created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn record_opt_out(&self, organization_id: i64, cell: &str) -> Result<()> {
    let cell = cell.to_owned();
    let created_at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO opt_out (cell, organization_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![cell, organization_id, created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a zip directory entry. City and state are required.
  pub async fn upsert_zip_code(
    &self,
    zip:   &str,
    city:  &str,
    state: &str,
    tz:    canvass_core::location::TimezoneInfo,
  ) -> Result<()> {
    let (zip, city, state) = (zip.to_owned(), city.to_owned(), state.to_owned());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO zip_code (zip, city, state, timezone_offset, has_dst)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![zip, city, state, tz.offset, tz.has_dst],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM campaign_contact WHERE id = ?1"),
            rusqlite::params![id],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
    let campaign = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, organization_id, title FROM campaign WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(Campaign {
                id:              row.get(0)?,
                organization_id: row.get(1)?,
                title:           row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(campaign)
  }

  async fn response_join_rows(&self, contact_id: i64) -> Result<Vec<ResponseJoinRow>> {
    let raws: Vec<RawJoinRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             qres.id, qres.value, qres.created_at,
             istep.id, istep.question, istep.campaign_id,
             istep.script_options, istep.parent_interaction_id,
             child.id, child.answer_option, child.created_at
           FROM question_response qres
           JOIN interaction_step istep ON istep.id = qres.interaction_step_id
           JOIN interaction_step child
             ON child.parent_interaction_id = qres.interaction_step_id
           WHERE qres.campaign_contact_id = ?1",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![contact_id], |row| {
            Ok(RawJoinRow {
              response_id:           row.get(0)?,
              response_value:        row.get(1)?,
              response_created_at:   row.get(2)?,
              question_step_id:      row.get(3)?,
              question:              row.get(4)?,
              campaign_id:           row.get(5)?,
              script_options:        row.get(6)?,
              parent_interaction_id: row.get(7)?,
              option_step_id:        row.get(8)?,
              option_value:          row.get(9)?,
              option_created_at:     row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJoinRow::into_join_row).collect()
  }

  async fn question_response_values(
    &self,
    contact_id: i64,
  ) -> Result<Vec<QuestionResponseValue>> {
    let raws: Vec<RawResponseValue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT qres.value, qres.interaction_step_id, istep.question
           FROM question_response qres
           JOIN interaction_step istep ON istep.id = qres.interaction_step_id
           WHERE qres.campaign_contact_id = ?1
           ORDER BY qres.id",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![contact_id], |row| {
            Ok(RawResponseValue {
              value:               row.get(0)?,
              interaction_step_id: row.get(1)?,
              question:            row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(QuestionResponseValue::from).collect())
  }

  async fn contact_messages(&self, contact_id: i64) -> Result<Vec<Message>> {
    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM message
           WHERE campaign_contact_id = ?1
           ORDER BY created_at, id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![contact_id], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn legacy_messages<'a>(
    &'a self,
    assignment_id:  i64,
    contact_number: &'a str,
  ) -> Result<Vec<Message>> {
    let contact_number = contact_number.to_owned();

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM message
           WHERE assignment_id = ?1 AND contact_number = ?2
           ORDER BY created_at, id"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![assignment_id, contact_number],
            RawMessage::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn contact_tags(&self, contact_id: i64) -> Result<Vec<Tag>> {
    let tags = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tag.id, tag.organization_id, tag.name, tag.description
           FROM tag
           JOIN campaign_contact_tag cct ON cct.tag_id = tag.id
           WHERE cct.campaign_contact_id = ?1
           ORDER BY tag.id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![contact_id], |row| {
            Ok(Tag {
              id:              row.get(0)?,
              organization_id: row.get(1)?,
              name:            row.get(2)?,
              description:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tags)
  }
}

// ─── Collaborator impls ──────────────────────────────────────────────────────

impl ZipDirectory for SqliteStore {
  type Error = Error;

  async fn locate_zip<'a>(&'a self, zip: &'a str) -> Result<Option<Location>> {
    let zip = zip.to_owned();

    let raw: Option<RawZip> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT city, state, timezone_offset, has_dst FROM zip_code WHERE zip = ?1",
            rusqlite::params![zip],
            |row| {
              Ok(RawZip {
                city:            row.get(0)?,
                state:           row.get(1)?,
                timezone_offset: row.get(2)?,
                has_dst:         row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(Location::from))
  }
}

impl OptOutIndex for SqliteStore {
  type Error = Error;

  async fn organization_opt_outs(&self, organization_id: i64) -> Result<HashSet<String>> {
    let cells = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT DISTINCT cell FROM opt_out WHERE organization_id = ?1")?;
        let cells = stmt
          .query_map(rusqlite::params![organization_id], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(cells)
      })
      .await?;
    Ok(cells)
  }
}

impl AccessPolicy for SqliteStore {
  type Error = Error;

  async fn role_of(&self, user_id: i64, organization_id: i64) -> Result<Option<Role>> {
    let role: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT role FROM user_organization
             WHERE user_id = ?1 AND organization_id = ?2",
            rusqlite::params![user_id, organization_id],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    role.as_deref().map(decode_role).transpose()
  }
}
