//! [`LegalDb`], the legal API's own tables.

use std::path::Path;

use chrono::Utc;
use registry_core::{
  business::Business,
  filing::{Address, AddressType, Filing, FilingStatus, FilingType, LegalBusiness, NewFiling},
  store::LegalStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use serde_json::Value;

use crate::{
  Error, Result,
  encode::{FILING_COLUMNS, RawAddress, RawFiling, encode_ts},
  schema::LEGAL_SCHEMA,
};

/// The legal API database backed by a single SQLite file.
#[derive(Clone)]
pub struct LegalDb {
  conn: tokio_rusqlite::Connection,
}

impl LegalDb {
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
        conn.execute_batch(LEGAL_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn select_filing(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawFiling>> {
  conn
    .query_row(
      &format!("SELECT {FILING_COLUMNS} FROM filings WHERE id = ?1"),
      params![id],
      RawFiling::from_row,
    )
    .optional()
}

fn legal_business_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegalBusiness> {
  Ok(LegalBusiness {
    id:         row.get(0)?,
    identifier: row.get(1)?,
    legal_name: row.get(2)?,
    legal_type: row.get(3)?,
  })
}

fn type_key(filing_json: &Value) -> Option<String> {
  FilingType::present_in(filing_json)
    .first()
    .map(|t| t.key().to_owned())
}

// ─── LegalStore impl ─────────────────────────────────────────────────────────

impl LegalStore for LegalDb {
  type Error = Error;

  // ── Businesses ────────────────────────────────────────────────────────────

  async fn upsert_business<'a>(&'a self, business: &'a Business) -> Result<LegalBusiness> {
    let identifier = business.identifier.clone();
    let legal_name = business.legal_name.clone();
    let legal_type = business.legal_type.clone();

    let legal = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO businesses (identifier, legal_name, legal_type)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (identifier) DO UPDATE
             SET legal_name = excluded.legal_name,
                 legal_type = excluded.legal_type
           RETURNING id, identifier, legal_name, legal_type",
          params![identifier, legal_name, legal_type],
          legal_business_from_row,
        )?)
      })
      .await?;

    Ok(legal)
  }

  async fn find_business<'a>(&'a self, identifier: &'a str) -> Result<Option<LegalBusiness>> {
    let identifier = identifier.to_owned();

    let legal = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, identifier, legal_name, legal_type
               FROM businesses WHERE identifier = ?1",
              params![identifier],
              legal_business_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(legal)
  }

  async fn business(&self, business_id: i64) -> Result<Option<LegalBusiness>> {
    let legal = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, identifier, legal_name, legal_type
               FROM businesses WHERE id = ?1",
              params![business_id],
              legal_business_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(legal)
  }

  async fn set_address(&self, business_id: i64, address: Address) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO addresses
             (business_id, address_type, street, city, region, postal_code, country)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (business_id, address_type) DO UPDATE
             SET street = excluded.street,
                 city = excluded.city,
                 region = excluded.region,
                 postal_code = excluded.postal_code,
                 country = excluded.country",
          params![
            business_id,
            address.address_type.as_str(),
            address.street,
            address.city,
            address.region,
            address.postal_code,
            address.country,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn mailing_address(&self, business_id: i64) -> Result<Option<Address>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT address_type, street, city, region, postal_code, country
               FROM addresses WHERE business_id = ?1 AND address_type = ?2",
              params![business_id, AddressType::Mailing.as_str()],
              |row| {
                Ok(RawAddress {
                  address_type: row.get(0)?,
                  street:       row.get(1)?,
                  city:         row.get(2)?,
                  region:       row.get(3)?,
                  postal_code:  row.get(4)?,
                  country:      row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAddress::into_address).transpose()
  }

  // ── Filings ───────────────────────────────────────────────────────────────

  async fn create_filing(&self, input: NewFiling) -> Result<Filing> {
    let filing_type = type_key(&input.filing_json);
    let filing_json = serde_json::to_string(&input.filing_json)?;
    let filing_date = encode_ts(Utc::now());
    let status = input.status.as_str();

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO filings
             (business_id, filing_type, filing_date, filing_json, status, submitter)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            input.business_id,
            filing_type,
            filing_date,
            filing_json,
            status,
            input.submitter
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(select_filing(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
      })
      .await?;

    raw.into_filing()
  }

  async fn update_filing(
    &self,
    filing_id: i64,
    filing_json: Value,
    status: FilingStatus,
    submitter: Option<String>,
  ) -> Result<Option<Filing>> {
    let filing_type = type_key(&filing_json);
    let filing_json = serde_json::to_string(&filing_json)?;
    let filing_date = encode_ts(Utc::now());
    let status = status.as_str();

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE filings
           SET filing_type = ?1, filing_date = ?2, filing_json = ?3,
               status = ?4, submitter = ?5
           WHERE id = ?6",
          params![filing_type, filing_date, filing_json, status, submitter, filing_id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_filing(conn, filing_id)?)
      })
      .await?;

    raw.map(RawFiling::into_filing).transpose()
  }

  async fn get_filing(&self, filing_id: i64) -> Result<Option<Filing>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_filing(conn, filing_id)?))
      .await?;
    raw.map(RawFiling::into_filing).transpose()
  }

  async fn list_filings(
    &self,
    business_id: i64,
    statuses: Vec<FilingStatus>,
  ) -> Result<Vec<Filing>> {
    let wanted: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();

    let raws: Vec<RawFiling> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FILING_COLUMNS} FROM filings
           WHERE business_id = ?1
           ORDER BY filing_date, id"
        ))?;
        let rows = stmt
          .query_map(params![business_id], RawFiling::from_row)?
          .filter(|r| r.as_ref().map_or(true, |r| wanted.contains(&r.status.as_str())))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFiling::into_filing).collect()
  }

  async fn latest_filing_of_type(
    &self,
    business_id: i64,
    filing_type: FilingType,
  ) -> Result<Option<Filing>> {
    let key = filing_type.key();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {FILING_COLUMNS} FROM filings
                 WHERE business_id = ?1 AND filing_type = ?2
                 ORDER BY filing_date DESC, id DESC
                 LIMIT 1"
              ),
              params![business_id, key],
              RawFiling::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawFiling::into_filing).transpose()
  }

  async fn set_payment_token(&self, filing_id: i64, token: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE filings SET payment_token = ?1 WHERE id = ?2",
          params![token, filing_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_filing_status(&self, filing_id: i64, status: FilingStatus) -> Result<()> {
    let status = status.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE filings SET status = ?1 WHERE id = ?2",
          params![status, filing_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_colin_event_id(
    &self,
    filing_id: i64,
    colin_event_id: i64,
  ) -> Result<Option<Filing>> {
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE filings SET colin_event_id = ?1 WHERE id = ?2",
          params![colin_event_id, filing_id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_filing(conn, filing_id)?)
      })
      .await?;
    raw.map(RawFiling::into_filing).transpose()
  }

  // ── Legacy synchronisation ────────────────────────────────────────────────

  async fn pending_colin_filings(&self) -> Result<Vec<Filing>> {
    let completed = FilingStatus::Completed.as_str();

    let raws: Vec<RawFiling> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FILING_COLUMNS} FROM filings
           WHERE status = ?1 AND colin_event_id IS NULL
           ORDER BY filing_date, id"
        ))?;
        let rows = stmt
          .query_map(params![completed], RawFiling::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFiling::into_filing).collect()
  }

  async fn find_colin_event_id(&self, colin_event_id: i64) -> Result<Option<i64>> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT colin_event_id FROM filings WHERE colin_event_id = ?1",
              params![colin_event_id],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn last_colin_event_id(&self) -> Result<Option<i64>> {
    let last = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT last_event_id FROM colin_last_update ORDER BY id DESC LIMIT 1",
              [],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(last)
  }

  async fn record_colin_event_id(&self, last_event_id: i64) -> Result<()> {
    let now = encode_ts(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO colin_last_update (last_update, last_event_id) VALUES (?1, ?2)",
          params![now, last_event_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
