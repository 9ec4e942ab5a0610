//! Href store persistence.
//!
//! Each `apply` loads the whole table, runs the transform and writes back
//! only the rows that changed, all inside one transaction on the
//! connection thread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Transaction};

use super::connection::CacheDb;
use crate::Error;
use crate::model::{HrefRecord, HrefStore, ProfileData};
use crate::store::{HrefStoreAccess, Transform};

struct HrefRow {
    rel_me_href: String,
    website_url: String,
    profile_json: String,
    viewed_at: i64,
    updated_at: Option<i64>,
}

fn millis_to_datetime(ms: i64, href: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| Error::CorruptRecord(format!("{href}: timestamp {ms} out of range")))
}

impl TryFrom<HrefRow> for HrefRecord {
    type Error = Error;

    fn try_from(row: HrefRow) -> Result<Self, Error> {
        let profile_data: ProfileData = serde_json::from_str(&row.profile_json)?;
        let viewed_at = millis_to_datetime(row.viewed_at, &row.rel_me_href)?;
        let updated_at = row
            .updated_at
            .map(|ms| millis_to_datetime(ms, &row.rel_me_href))
            .transpose()?;

        Ok(HrefRecord { rel_me_href: row.rel_me_href, website_url: row.website_url, profile_data, viewed_at, updated_at })
    }
}

fn load_all(tx: &Transaction<'_>) -> Result<HrefStore, Error> {
    let mut stmt =
        tx.prepare("SELECT rel_me_href, website_url, profile_json, viewed_at, updated_at FROM hrefs")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(HrefRow {
                rel_me_href: row.get(0)?,
                website_url: row.get(1)?,
                profile_json: row.get(2)?,
                viewed_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    rows.into_iter()
        .map(|row| HrefRecord::try_from(row).map(|record| (record.rel_me_href.clone(), record)))
        .collect()
}

fn upsert(tx: &Transaction<'_>, record: &HrefRecord) -> Result<(), Error> {
    let profile_type = if record.profile_data.is_profile() { "profile" } else { "notProfile" };
    let profile_json = serde_json::to_string(&record.profile_data)?;

    tx.execute(
        "INSERT INTO hrefs (rel_me_href, website_url, profile_type, profile_json, viewed_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(rel_me_href) DO UPDATE SET
            website_url = excluded.website_url,
            profile_type = excluded.profile_type,
            profile_json = excluded.profile_json,
            viewed_at = excluded.viewed_at,
            updated_at = excluded.updated_at",
        params![
            &record.rel_me_href,
            &record.website_url,
            profile_type,
            profile_json,
            record.viewed_at.timestamp_millis(),
            record.updated_at.map(|t| t.timestamp_millis()),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl HrefStoreAccess for CacheDb {
    async fn apply(&self, transform: Transform) -> Result<HrefStore, Error> {
        self.conn
            .call(move |conn| -> Result<HrefStore, Error> {
                let tx = conn.transaction()?;
                let current = load_all(&tx)?;

                let Some(next) = transform(&current) else {
                    return Ok(current);
                };

                let mut removed = 0usize;
                for key in current.keys().filter(|key| !next.contains_key(*key)) {
                    tx.execute("DELETE FROM hrefs WHERE rel_me_href = ?1", params![key])?;
                    removed += 1;
                }

                let mut written = 0usize;
                for (key, record) in &next {
                    if current.get(key) != Some(record) {
                        upsert(&tx, record)?;
                        written += 1;
                    }
                }

                tx.commit()?;
                tracing::trace!(removed, written, "href store transform committed");
                Ok(next)
            })
            .await
            .map_err(Error::from)
    }
}
