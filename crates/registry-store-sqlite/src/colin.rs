//! [`ColinDb`], the SQLite host of the legacy COLIN tables.

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use registry_core::{
  business::Business,
  colin::{
    ANNUAL_REPORT_CODE, ASSUMED_NAME_TYPE, AnnualReport, CorpState, EVENT_CONVERTED,
    EVENT_FILE, Event, LEDGER_EVENT_TYPES, LEGAL_NAME_TYPE, NewAnnualReport,
    NewCorporation, STATE_ACTIVE,
  },
  reset::{self, EventInfo, ResetDates},
  store::ColinStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{RawCorporation, RawEvent, RawFilingEvent, encode_date, encode_ts},
  schema::COLIN_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The COLIN tables backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct ColinDb {
  conn: tokio_rusqlite::Connection,
}

impl ColinDb {
  /// Open (or create) a database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let db = Self { conn };
    db.init_schema().await?;
    Ok(db)
  }

  /// Open an in-memory database, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let db = Self { conn };
    db.init_schema().await?;
    Ok(db)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(COLIN_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// Plain functions over a connection so they compose inside one transaction.

const FILING_EVENT_SELECT: &str = "
  SELECT e.event_id, e.corp_num, e.event_timestmp, f.period_end_dt, f.agm_date
  FROM filing f
  JOIN event e ON e.event_id = f.event_id";

fn insert_event(
  conn: &Connection,
  corp_num: &str,
  event_type: &str,
  timestamp: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO event (corp_num, event_timestmp, event_typ_cd) VALUES (?1, ?2, ?3)",
    params![corp_num, timestamp, event_type],
  )?;
  Ok(conn.last_insert_rowid())
}

/// End the current state of `corp_num` on `event_id` and start `state`.
fn transition_state(
  conn: &Connection,
  event_id: i64,
  corp_num: &str,
  state: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE corp_state SET end_event_id = ?1
     WHERE corp_num = ?2 AND end_event_id IS NULL",
    params![event_id, corp_num],
  )?;
  conn.execute(
    "INSERT INTO corp_state (corp_num, start_event_id, state_typ_cd) VALUES (?1, ?2, ?3)",
    params![corp_num, event_id, state],
  )?;
  Ok(())
}

/// The annual report with the latest period end (nulls last), optionally
/// restricted to periods ending in `year`.
fn latest_annual_report(
  conn: &Connection,
  corp_num: &str,
  year: Option<String>,
) -> rusqlite::Result<Option<RawFilingEvent>> {
  let sql = format!(
    "{FILING_EVENT_SELECT}
     WHERE e.corp_num = ?1
       AND f.filing_typ_cd = ?2
       AND (?3 IS NULL OR substr(f.period_end_dt, 1, 4) = ?3)
     ORDER BY f.period_end_dt IS NULL, f.period_end_dt DESC,
              e.event_timestmp DESC, e.event_id DESC
     LIMIT 1"
  );
  conn
    .query_row(&sql, params![corp_num, ANNUAL_REPORT_CODE, year], RawFilingEvent::from_row)
    .optional()
}

fn active_name(
  conn: &Connection,
  corp_num: &str,
  name_type: &str,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT corp_nme FROM corp_name
       WHERE corp_num = ?1 AND corp_name_typ_cd = ?2 AND end_event_id IS NULL
       ORDER BY start_event_id DESC
       LIMIT 1",
      params![corp_num, name_type],
      |r| r.get(0),
    )
    .optional()
}

/// Everything the resolver needs, or `None` if the corporation does not
/// exist or has no current state.
fn read_corporation(
  conn: &Connection,
  corp_num: &str,
) -> rusqlite::Result<Option<RawCorporation>> {
  let raw = conn
    .query_row(
      "SELECT c.corp_num, c.corp_typ_cd, c.corp_frozen_typ_cd, c.recognition_dts,
              c.bn_15, c.last_ar_filed_dt, c.last_agm_date,
              cs.state_typ_cd, os.full_desc,
              j.can_jur_typ_cd, j.othr_juris_desc
       FROM corporation c
       JOIN corp_state cs    ON cs.corp_num = c.corp_num AND cs.end_event_id IS NULL
       JOIN corp_op_state os ON os.state_typ_cd = cs.state_typ_cd
       LEFT JOIN jurisdiction j ON j.corp_num = c.corp_num
       WHERE c.corp_num = ?1",
      params![corp_num],
      |row| {
        Ok(RawCorporation {
          corp_num:                row.get(0)?,
          corp_type:               row.get(1)?,
          frozen_type:             row.get(2)?,
          founding_date:           row.get(3)?,
          business_number:         row.get(4)?,
          last_ar_filed_date:      row.get(5)?,
          last_agm_date:           row.get(6)?,
          corp_state:              row.get(7)?,
          state_desc:              row.get(8)?,
          jurisdiction_code:       row.get(9)?,
          other_jurisdiction_desc: row.get(10)?,
          legal_name:              None,
          assumed_name:            None,
          last_ar_date:            None,
          last_ledger_timestamp:   None,
        })
      },
    )
    .optional()?;

  let Some(mut raw) = raw else {
    return Ok(None);
  };

  raw.legal_name = active_name(conn, corp_num, LEGAL_NAME_TYPE)?;
  raw.assumed_name = active_name(conn, corp_num, ASSUMED_NAME_TYPE)?;
  raw.last_ar_date =
    latest_annual_report(conn, corp_num, None)?.and_then(|ar| ar.period_end);
  raw.last_ledger_timestamp = conn.query_row(
    "SELECT MAX(event_timestmp) FROM event
     WHERE corp_num = ?1 AND event_typ_cd IN (?2, ?3)",
    params![corp_num, LEDGER_EVENT_TYPES[0], LEDGER_EVENT_TYPES[1]],
    |r| r.get(0),
  )?;

  Ok(Some(raw))
}

// ── Reset ─────────────────────────────────────────────────────────────────

/// Filing rows of `corp_num` that survive the reset, newest event first.
fn remaining_filing_rows(
  conn: &Connection,
  corp_num: &str,
  excluded: &HashSet<i64>,
) -> rusqlite::Result<Vec<RawFilingEvent>> {
  let sql = format!(
    "{FILING_EVENT_SELECT}
     WHERE e.corp_num = ?1
     ORDER BY e.event_timestmp DESC, e.event_id DESC"
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params![corp_num], RawFilingEvent::from_row)?
    .filter(|r| r.as_ref().map_or(true, |r| !excluded.contains(&r.event_id)))
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn compute_reset_dates(
  conn: &Connection,
  event_info: &[EventInfo],
  event_ids: &[i64],
) -> Result<Vec<ResetDates>> {
  let excluded: HashSet<i64> = event_ids.iter().copied().collect();

  reset::earliest_event_by_corp(event_info)
    .into_iter()
    .map(|(corp_num, first_event_id)| {
      let raws = remaining_filing_rows(conn, &corp_num, &excluded)
        .map_err(|source| Error::ResetCorporation { corp_num: corp_num.clone(), source })?;
      let rows = raws
        .into_iter()
        .map(RawFilingEvent::into_reset_row)
        .collect::<Result<Vec<_>>>()?;
      Ok(reset::last_ar_dates(&corp_num, first_event_id, rows))
    })
    .collect()
}

fn write_reset_dates(conn: &Connection, dates: &[ResetDates]) -> Result<()> {
  for item in dates {
    conn
      .execute(
        "UPDATE corporation
         SET last_ar_filed_dt = ?1, last_agm_date = ?2, last_ledger_dt = ?3
         WHERE corp_num = ?4",
        params![
          item.ar_filed_date.map(encode_ts),
          item.restored_agm_date().map(encode_date),
          item.event_date.map(encode_ts),
          item.corp_num,
        ],
      )
      .map_err(|source| Error::ResetCorporation {
        corp_num: item.corp_num.clone(),
        source,
      })?;
  }
  Ok(())
}

/// Delete states started by `event_ids`, then reopen the states they ended.
/// Reopening a state while a later one is still active breaks the one
/// active row rule and fails for that corporation.
fn reopen_corp_states(conn: &Connection, event_ids: &[i64]) -> Result<()> {
  for id in event_ids {
    conn
      .execute("DELETE FROM corp_state WHERE start_event_id = ?1", params![id])
      .map_err(|e| Error::Database(e.into()))?;
  }
  for id in event_ids {
    let corp_nums = conn
      .prepare("SELECT corp_num FROM corp_state WHERE end_event_id = ?1")
      .and_then(|mut stmt| {
        stmt
          .query_map(params![id], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()
      })
      .map_err(|e| Error::Database(e.into()))?;

    for corp_num in corp_nums {
      conn
        .execute(
          "UPDATE corp_state SET end_event_id = NULL
           WHERE end_event_id = ?1 AND corp_num = ?2",
          params![id, corp_num],
        )
        .map_err(|source| Error::ResetCorporation {
          corp_num: corp_num.clone(),
          source,
        })?;
    }
  }
  Ok(())
}

fn delete_events(conn: &Connection, events: &[EventInfo]) -> Result<()> {
  for info in events {
    let deleted = conn
      .execute("DELETE FROM filing WHERE event_id = ?1", params![info.event_id])
      .and_then(|_| {
        conn.execute(
          "DELETE FROM event WHERE event_id = ?1 AND corp_num = ?2",
          params![info.event_id, info.corp_num],
        )
      });
    deleted.map_err(|source| Error::ResetCorporation {
      corp_num: info.corp_num.clone(),
      source,
    })?;
  }
  Ok(())
}

// ─── ColinStore impl ─────────────────────────────────────────────────────────

impl ColinStore for ColinDb {
  type Error = Error;

  // ── Corporations ──────────────────────────────────────────────────────────

  async fn create_corporation(&self, input: NewCorporation) -> Result<Event> {
    let founded = encode_ts(input.founding_date);

    let raw: RawEvent = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO corporation (corp_num, corp_typ_cd, recognition_dts, bn_15)
           VALUES (?1, ?2, ?3, ?4)",
          params![input.corp_num, input.corp_type, founded, input.business_number],
        )?;
        let event_id = insert_event(&tx, &input.corp_num, EVENT_CONVERTED, &founded)?;
        tx.execute(
          "INSERT INTO corp_name (corp_num, corp_name_typ_cd, start_event_id, corp_nme)
           VALUES (?1, ?2, ?3, ?4)",
          params![input.corp_num, LEGAL_NAME_TYPE, event_id, input.legal_name],
        )?;
        if input.jurisdiction_code.is_some() || input.other_jurisdiction_desc.is_some() {
          tx.execute(
            "INSERT INTO jurisdiction (corp_num, can_jur_typ_cd, othr_juris_desc)
             VALUES (?1, ?2, ?3)",
            params![
              input.corp_num,
              input.jurisdiction_code,
              input.other_jurisdiction_desc
            ],
          )?;
        }
        transition_state(&tx, event_id, &input.corp_num, STATE_ACTIVE)?;
        tx.commit()?;

        Ok(RawEvent {
          event_id,
          corp_num: input.corp_num,
          timestamp: founded,
          event_type: EVENT_CONVERTED.to_owned(),
        })
      })
      .await?;

    raw.into_event()
  }

  async fn find_business<'a>(&'a self, identifier: &'a str) -> Result<Option<Business>> {
    let corp_num = identifier.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(read_corporation(conn, &corp_num)?))
      .await?;

    Ok(raw.map(RawCorporation::into_record).transpose()?.map(|r| r.resolve()))
  }

  // ── Annual reports ────────────────────────────────────────────────────────

  async fn annual_report<'a>(
    &'a self,
    identifier: &'a str,
    year: Option<i32>,
  ) -> Result<Option<AnnualReport>> {
    let corp_num = identifier.to_owned();
    let year = year.map(|y| format!("{y:04}"));

    let raw = self
      .conn
      .call(move |conn| Ok(latest_annual_report(conn, &corp_num, year)?))
      .await?;

    raw.map(RawFilingEvent::into_annual_report).transpose()
  }

  async fn file_annual_report<'a>(
    &'a self,
    identifier: &'a str,
    input: NewAnnualReport,
  ) -> Result<AnnualReport> {
    let corp_num = identifier.to_owned();
    let now = encode_ts(Utc::now());

    let raw: Option<RawFilingEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM corporation WHERE corp_num = ?1",
            params![corp_num],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let period_end = encode_date(input.period_end);
        let agm_date = input.agm_date.map(encode_date);

        let event_id = insert_event(&tx, &corp_num, EVENT_FILE, &now)?;
        tx.execute(
          "INSERT INTO filing (event_id, filing_typ_cd, period_end_dt, agm_date)
           VALUES (?1, ?2, ?3, ?4)",
          params![event_id, ANNUAL_REPORT_CODE, period_end, agm_date],
        )?;
        // without an AGM only the ledger moves
        match &agm_date {
          Some(agm) => tx.execute(
            "UPDATE corporation
             SET last_ar_filed_dt = ?1, last_agm_date = ?2, last_ledger_dt = ?1
             WHERE corp_num = ?3",
            params![now, agm, corp_num],
          )?,
          None => tx.execute(
            "UPDATE corporation SET last_ledger_dt = ?1 WHERE corp_num = ?2",
            params![now, corp_num],
          )?,
        };
        transition_state(&tx, event_id, &corp_num, STATE_ACTIVE)?;
        tx.commit()?;

        Ok(Some(RawFilingEvent {
          event_id,
          corp_num,
          event_timestamp: now,
          period_end: Some(period_end),
          agm_date,
        }))
      })
      .await?;

    let raw = raw.ok_or_else(|| Error::CorporationNotFound(identifier.to_owned()))?;
    tracing::info!(corp_num = %raw.corp_num, event_id = raw.event_id, "filed annual report");
    raw.into_annual_report()
  }

  // ── Corp states ───────────────────────────────────────────────────────────

  async fn update_corp_state<'a>(
    &'a self,
    event_id: i64,
    corp_num: &'a str,
    state: &'a str,
  ) -> Result<()> {
    let corp_num = corp_num.to_owned();
    let state = state.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        transition_state(&tx, event_id, &corp_num, &state)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn corp_states<'a>(&'a self, corp_num: &'a str) -> Result<Vec<CorpState>> {
    let corp_num = corp_num.to_owned();

    let states = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT corp_num, start_event_id, end_event_id, state_typ_cd
           FROM corp_state
           WHERE corp_num = ?1
           ORDER BY start_event_id, rowid",
        )?;
        let rows = stmt
          .query_map(params![corp_num], |row| {
            Ok(CorpState {
              corp_num:       row.get(0)?,
              start_event_id: row.get(1)?,
              end_event_id:   row.get(2)?,
              state_type:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(states)
  }

  // ── Reset ─────────────────────────────────────────────────────────────────

  async fn last_ar_dates_for_reset<'a>(
    &'a self,
    event_info: &'a [EventInfo],
    event_ids: &'a [i64],
  ) -> Result<Vec<ResetDates>> {
    let event_info = event_info.to_vec();
    let event_ids = event_ids.to_vec();

    self
      .conn
      .call(move |conn| Ok(compute_reset_dates(conn, &event_info, &event_ids)))
      .await?
  }

  async fn reset_corporations<'a>(
    &'a self,
    event_info: &'a [EventInfo],
    event_ids: &'a [i64],
  ) -> Result<()> {
    let event_info = event_info.to_vec();
    let event_ids = event_ids.to_vec();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = compute_reset_dates(&tx, &event_info, &event_ids)
          .and_then(|dates| write_reset_dates(&tx, &dates));
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }

  async fn reset_corp_states<'a>(&'a self, event_ids: &'a [i64]) -> Result<()> {
    if event_ids.is_empty() {
      return Ok(());
    }
    let event_ids = event_ids.to_vec();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = reopen_corp_states(&tx, &event_ids);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }

  async fn reset(&self, events: Vec<EventInfo>) -> Result<()> {
    if events.is_empty() {
      return Ok(());
    }
    let event_ids: Vec<i64> = events.iter().map(|e| e.event_id).collect();
    let count = events.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = compute_reset_dates(&tx, &events, &event_ids)
          .and_then(|dates| write_reset_dates(&tx, &dates))
          .and_then(|()| reopen_corp_states(&tx, &event_ids))
          .and_then(|()| delete_events(&tx, &events));
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await??;

    tracing::info!(events = count, "reset colin events");
    Ok(())
  }
}
