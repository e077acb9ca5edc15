//! Versioned schema migrations for the Canvass SQLite store.
//!
//! The applied version lives in `PRAGMA user_version`. Every migration has an
//! `up` and a `down` script and runs in its own transaction with foreign-key
//! enforcement suspended, so table rebuilds can drop and rename freely.
//!
//! Version 1 reached by reverting version 2 has `script TEXT NOT NULL
//! DEFAULT ''`, while a freshly built version 1 keeps `script` nullable.

use rusqlite::Connection;

pub struct Migration {
  pub version: u32,
  pub name:    &'static str,
  pub up:      &'static str,
  pub down:    &'static str,
}

pub const MIGRATIONS: &[Migration] = &[BASE_SCHEMA, SCRIPT_OPTIONS];

pub fn latest_version() -> u32 {
  MIGRATIONS.last().map_or(0, |m| m.version)
}

// ─── 1: base schema ──────────────────────────────────────────────────────────

const BASE_SCHEMA: Migration = Migration {
  version: 1,
  name:    "base_schema",
  up:      "
CREATE TABLE organization (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE user_organization (
    user_id          INTEGER NOT NULL,
    organization_id  INTEGER NOT NULL REFERENCES organization(id),
    role             TEXT NOT NULL,   -- 'TEXTER' | 'SUPERVOLUNTEER' | 'ADMIN' | 'OWNER'
    PRIMARY KEY (user_id, organization_id)
);

CREATE TABLE campaign (
    id               INTEGER PRIMARY KEY,
    organization_id  INTEGER NOT NULL REFERENCES organization(id),
    title            TEXT NOT NULL DEFAULT ''
);

CREATE TABLE assignment (
    id           INTEGER PRIMARY KEY,
    campaign_id  INTEGER NOT NULL REFERENCES campaign(id),
    user_id      INTEGER NOT NULL
);

CREATE TABLE campaign_contact (
    id               INTEGER PRIMARY KEY,
    campaign_id      INTEGER NOT NULL REFERENCES campaign(id),
    assignment_id    INTEGER REFERENCES assignment(id),
    first_name       TEXT NOT NULL DEFAULT '',
    last_name        TEXT NOT NULL DEFAULT '',
    cell             TEXT NOT NULL,
    zip              TEXT NOT NULL DEFAULT '',
    external_id      TEXT,
    custom_fields    TEXT NOT NULL DEFAULT '{}',
    message_status   TEXT NOT NULL DEFAULT 'needsMessage',
    timezone_offset  TEXT,            -- '<offset>_<hasDst>', e.g. '-5_1'
    city             TEXT,
    state            TEXT,
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at       TEXT
);

CREATE TABLE interaction_step (
    id                     INTEGER PRIMARY KEY,
    campaign_id            INTEGER NOT NULL REFERENCES campaign(id),
    question               TEXT NOT NULL DEFAULT '',
    script                 TEXT,
    answer_option          TEXT NOT NULL DEFAULT '',
    parent_interaction_id  INTEGER REFERENCES interaction_step(id),
    created_at             TEXT NOT NULL
);

-- Responses are append-only.
CREATE TABLE question_response (
    id                   INTEGER PRIMARY KEY,
    campaign_contact_id  INTEGER NOT NULL REFERENCES campaign_contact(id),
    interaction_step_id  INTEGER NOT NULL REFERENCES interaction_step(id),
    value                TEXT NOT NULL,
    created_at           TEXT NOT NULL
);

CREATE TABLE message (
    id                   INTEGER PRIMARY KEY,
    campaign_contact_id  INTEGER REFERENCES campaign_contact(id),
    assignment_id        INTEGER REFERENCES assignment(id),
    contact_number       TEXT NOT NULL,
    text                 TEXT NOT NULL,
    is_from_contact      INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL
);

CREATE TABLE tag (
    id               INTEGER PRIMARY KEY,
    organization_id  INTEGER NOT NULL REFERENCES organization(id),
    name             TEXT NOT NULL,
    description      TEXT
);

CREATE TABLE campaign_contact_tag (
    campaign_contact_id  INTEGER NOT NULL REFERENCES campaign_contact(id),
    tag_id               INTEGER NOT NULL REFERENCES tag(id),
    created_at           TEXT NOT NULL,
    PRIMARY KEY (campaign_contact_id, tag_id)
);

CREATE TABLE opt_out (
    id               INTEGER PRIMARY KEY,
    cell             TEXT NOT NULL,
    organization_id  INTEGER NOT NULL REFERENCES organization(id),
    reason_code      TEXT,
    created_at       TEXT NOT NULL
);

CREATE TABLE zip_code (
    zip              TEXT PRIMARY KEY,
    city             TEXT NOT NULL,
    state            TEXT NOT NULL,
    timezone_offset  INTEGER NOT NULL,
    has_dst          INTEGER NOT NULL
);

CREATE INDEX campaign_contact_campaign_idx   ON campaign_contact(campaign_id);
CREATE INDEX interaction_step_parent_idx     ON interaction_step(parent_interaction_id);
CREATE INDEX question_response_contact_idx   ON question_response(campaign_contact_id);
CREATE INDEX message_contact_idx             ON message(campaign_contact_id, created_at);
CREATE INDEX message_assignment_number_idx   ON message(assignment_id, contact_number);
CREATE INDEX opt_out_organization_cell_idx   ON opt_out(organization_id, cell);
",
  down:    "
DROP TABLE zip_code;
DROP TABLE opt_out;
DROP TABLE campaign_contact_tag;
DROP TABLE tag;
DROP TABLE message;
DROP TABLE question_response;
DROP TABLE interaction_step;
DROP TABLE campaign_contact;
DROP TABLE assignment;
DROP TABLE campaign;
DROP TABLE user_organization;
DROP TABLE organization;
",
};

// ─── 2: script → script_options ──────────────────────────────────────────────

// SQLite cannot tighten a column to NOT NULL in place, so both directions
// rebuild `interaction_step`. A NULL legacy script becomes `[""]`.
const SCRIPT_OPTIONS: Migration = Migration {
  version: 2,
  name:    "interaction_step_script_options",
  up:      "
CREATE TABLE interaction_step_next (
    id                     INTEGER PRIMARY KEY,
    campaign_id            INTEGER NOT NULL REFERENCES campaign(id),
    question               TEXT NOT NULL DEFAULT '',
    script_options         TEXT NOT NULL
                           CHECK (json_valid(script_options)
                                  AND json_type(script_options) = 'array'
                                  AND json_array_length(script_options) >= 1),
    answer_option          TEXT NOT NULL DEFAULT '',
    parent_interaction_id  INTEGER REFERENCES interaction_step(id),
    created_at             TEXT NOT NULL
);

INSERT INTO interaction_step_next
    (id, campaign_id, question, script_options, answer_option,
     parent_interaction_id, created_at)
SELECT id, campaign_id, question, json_array(COALESCE(script, '')),
       answer_option, parent_interaction_id, created_at
FROM interaction_step;

DROP TABLE interaction_step;
ALTER TABLE interaction_step_next RENAME TO interaction_step;
CREATE INDEX interaction_step_parent_idx ON interaction_step(parent_interaction_id);
",
  down:    "
CREATE TABLE interaction_step_prev (
    id                     INTEGER PRIMARY KEY,
    campaign_id            INTEGER NOT NULL REFERENCES campaign(id),
    question               TEXT NOT NULL DEFAULT '',
    script                 TEXT NOT NULL DEFAULT '',
    answer_option          TEXT NOT NULL DEFAULT '',
    parent_interaction_id  INTEGER REFERENCES interaction_step(id),
    created_at             TEXT NOT NULL
);

INSERT INTO interaction_step_prev
    (id, campaign_id, question, script, answer_option,
     parent_interaction_id, created_at)
SELECT id, campaign_id, question,
       COALESCE(json_extract(script_options, '$[0]'), ''),
       answer_option, parent_interaction_id, created_at
FROM interaction_step;

DROP TABLE interaction_step;
ALTER TABLE interaction_step_prev RENAME TO interaction_step;
CREATE INDEX interaction_step_parent_idx ON interaction_step(parent_interaction_id);
",
};

// ─── Runner ──────────────────────────────────────────────────────────────────

pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
  conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply or revert migrations until the schema is at `target`. Returns the
/// version the schema was at before.
pub fn migrate_to(conn: &mut Connection, target: u32) -> rusqlite::Result<u32> {
  let current = current_version(conn)?;

  if target > current {
    for m in MIGRATIONS
      .iter()
      .filter(|m| m.version > current && m.version <= target)
    {
      tracing::info!(version = m.version, name = m.name, "applying migration");
      run(conn, m.up, m.version)?;
    }
  } else {
    for m in MIGRATIONS
      .iter()
      .rev()
      .filter(|m| m.version <= current && m.version > target)
    {
      tracing::info!(version = m.version, name = m.name, "reverting migration");
      run(conn, m.down, m.version - 1)?;
    }
  }

  Ok(current)
}

fn run(conn: &mut Connection, sql: &str, version_after: u32) -> rusqlite::Result<()> {
  conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
  let result = run_in_transaction(conn, sql, version_after);
  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  result
}

fn run_in_transaction(
  conn: &mut Connection,
  sql: &str,
  version_after: u32,
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute_batch(sql)?;
  tx.pragma_update(None, "user_version", version_after)?;
  tx.commit()
}
