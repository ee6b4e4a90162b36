//! SQL schemas for the two registry databases.
//!
//! Both are executed at connection startup and are idempotent thanks to
//! `CREATE ... IF NOT EXISTS` and `INSERT OR IGNORE`.

/// The legacy COLIN tables, hosted on SQLite with their column contracts
/// preserved.
pub const COLIN_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS corporation (
    corp_num            TEXT PRIMARY KEY,
    corp_typ_cd         TEXT NOT NULL,
    corp_frozen_typ_cd  TEXT,
    recognition_dts     TEXT,            -- founding timestamp
    bn_15               TEXT,            -- business number
    last_ar_filed_dt    TEXT,
    last_agm_date       TEXT,
    last_ledger_dt      TEXT
);

CREATE TABLE IF NOT EXISTS corp_op_state (
    state_typ_cd     TEXT PRIMARY KEY,
    op_state_typ_cd  TEXT NOT NULL,
    full_desc        TEXT NOT NULL
);

INSERT OR IGNORE INTO corp_op_state (state_typ_cd, op_state_typ_cd, full_desc) VALUES
    ('ACT', 'ACT', 'Active'),
    ('HIS', 'HIS', 'Historical'),
    ('HWT', 'HIS', 'Historical (Wound up)'),
    ('HDF', 'HIS', 'Historical (Dissolved)');

-- Append-only, apart from a reset undoing specific events.
CREATE TABLE IF NOT EXISTS event (
    event_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    corp_num        TEXT NOT NULL REFERENCES corporation(corp_num),
    event_timestmp  TEXT NOT NULL,   -- fixed-width RFC 3339, sorts as text
    event_typ_cd    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS corp_state (
    corp_num        TEXT NOT NULL REFERENCES corporation(corp_num),
    start_event_id  INTEGER NOT NULL REFERENCES event(event_id),
    end_event_id    INTEGER REFERENCES event(event_id),
    state_typ_cd    TEXT NOT NULL REFERENCES corp_op_state(state_typ_cd)
);

-- At most one current state per corporation.
CREATE UNIQUE INDEX IF NOT EXISTS corp_state_active_idx
    ON corp_state(corp_num) WHERE end_event_id IS NULL;

CREATE TABLE IF NOT EXISTS filing (
    event_id       INTEGER PRIMARY KEY REFERENCES event(event_id),
    filing_typ_cd  TEXT NOT NULL,
    period_end_dt  TEXT,
    agm_date       TEXT
);

CREATE TABLE IF NOT EXISTS corp_name (
    corp_num          TEXT NOT NULL REFERENCES corporation(corp_num),
    corp_name_typ_cd  TEXT NOT NULL,   -- 'CO' legal | 'AS' assumed
    start_event_id    INTEGER NOT NULL REFERENCES event(event_id),
    end_event_id      INTEGER REFERENCES event(event_id),
    corp_nme          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jurisdiction (
    corp_num         TEXT PRIMARY KEY REFERENCES corporation(corp_num),
    can_jur_typ_cd   TEXT,
    othr_juris_desc  TEXT
);

CREATE INDEX IF NOT EXISTS event_corp_idx      ON event(corp_num);
CREATE INDEX IF NOT EXISTS corp_name_corp_idx  ON corp_name(corp_num);

PRAGMA user_version = 1;
";

/// Tables owned by the legal API.
pub const LEGAL_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS businesses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier  TEXT NOT NULL UNIQUE,
    legal_name  TEXT,
    legal_type  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS addresses (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    business_id   INTEGER NOT NULL REFERENCES businesses(id),
    address_type  TEXT NOT NULL,   -- 'mailing' | 'delivery'
    street        TEXT,
    city          TEXT,
    region        TEXT,
    postal_code   TEXT,
    country       TEXT,
    UNIQUE (business_id, address_type)
);

-- The submitted document is kept verbatim in filing_json.
CREATE TABLE IF NOT EXISTS filings (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    business_id     INTEGER NOT NULL REFERENCES businesses(id),
    filing_type     TEXT,
    filing_date     TEXT NOT NULL,
    filing_json     TEXT NOT NULL,
    status          TEXT NOT NULL,
    payment_token   TEXT,
    colin_event_id  INTEGER UNIQUE,
    submitter       TEXT
);

CREATE TABLE IF NOT EXISTS colin_last_update (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    last_update    TEXT NOT NULL,
    last_event_id  INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS filings_business_idx ON filings(business_id);
CREATE INDEX IF NOT EXISTS filings_status_idx   ON filings(status);

PRAGMA user_version = 1;
";
