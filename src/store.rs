//! Page Store (C6): transactional persistence for `site`, `page`, `lemma`,
//! and `indexx` (spec.md §4.6, §6).
//!
//! Backed by `sqlx::SqlitePool`, following the connection-setup idiom of
//! the teacher crate's own SQLite layer (`link_index::LinkIndex::open`):
//! WAL journal mode, a busy timeout instead of failing immediately under
//! contention, and manual `Row::get` mapping rather than `FromRow` derives,
//! since the `status` column needs a conversion step the derive can't
//! express directly.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::errors::{IndexError, IndexResult};
use crate::model::{IndexEntry, Lemma, Page, Site, SiteStatus};

/// One `(site, lemma, frequency)` row awaiting persistence, keyed by an
/// existing `db_id` when the lemma was already known.
#[derive(Debug, Clone)]
pub struct LemmaRecord {
    pub db_id: Option<i64>,
    pub site_id: i64,
    pub text: String,
    pub frequency: i64,
}

/// One `(page, lemma, rank)` row awaiting persistence.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}

pub struct PageStore {
    pool: SqlitePool,
}

impl PageStore {
    /// Open (creating if missing) the SQLite database at `path` and run the
    /// embedded schema migration. `path` may be `:memory:` for tests, in
    /// which case the pool is pinned to a single connection so every call
    /// sees the same in-memory database.
    pub async fn connect(path: &str) -> IndexResult<Self> {
        let is_memory = path == ":memory:";

        let options = if is_memory {
            SqliteConnectOptions::from_str(":memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(Path::new(path))
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(Duration::from_secs(30))
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(if is_memory { 1 } else { 8 })
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            IndexError::Db(sqlx::Error::Migrate(Box::new(e)))
        })?;

        Ok(Self { pool })
    }

    fn row_to_site(row: &sqlx::sqlite::SqliteRow) -> IndexResult<Site> {
        let status_raw: String = row.try_get("status")?;
        let status = SiteStatus::parse(&status_raw)
            .ok_or_else(|| IndexError::Db(sqlx::Error::Decode(
                format!("unknown site status {status_raw:?}").into(),
            )))?;
        Ok(Site {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            name: row.try_get("name")?,
            status,
            status_time: row.try_get("status_time")?,
            last_error: row.try_get("last_error")?,
        })
    }

    /// Truncate `indexx`, `lemma`, `page`, `site` in that order (spec.md
    /// §4.6). Called exactly once per run by the Coordinator (spec.md §4.8's
    /// policy-(b) fix), never per-site.
    pub async fn reset_all(&self) -> IndexResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM indexx").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM lemma").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM page").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM site").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn create_site(&self, url: &str, name: &str) -> IndexResult<Site> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO site (url, name, status, status_time, last_error) VALUES (?, ?, ?, ?, NULL)",
        )
        .bind(url)
        .bind(name)
        .bind(SiteStatus::Indexing.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Site {
            id,
            url: url.to_string(),
            name: name.to_string(),
            status: SiteStatus::Indexing,
            status_time: now,
            last_error: None,
        })
    }

    pub async fn find_site_by_url(&self, url: &str) -> IndexResult<Option<Site>> {
        let row = sqlx::query(
            "SELECT id, url, name, status, status_time, last_error FROM site WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_site).transpose()
    }

    /// Find the configured site whose own host matches `host` (spec.md
    /// §4.10 step 1). Sites are few in a single-process crawler, so this
    /// scans rather than maintaining a separate host index.
    pub async fn find_site_by_host(&self, host: &str) -> IndexResult<Option<Site>> {
        let rows = sqlx::query("SELECT id, url, name, status, status_time, last_error FROM site")
            .fetch_all(&self.pool)
            .await?;

        for row in &rows {
            let site = Self::row_to_site(row)?;
            let Ok(parsed) = url::Url::parse(&site.url) else {
                continue;
            };
            if let Some(site_host) = parsed.host_str() {
                if crate::normalize::is_internal(host, site_host) {
                    return Ok(Some(site));
                }
            }
        }
        Ok(None)
    }

    pub async fn find_page(&self, site_id: i64, path: &str) -> IndexResult<Option<Page>> {
        let row = sqlx::query(
            "SELECT id, site_id, path, code, content FROM page WHERE site_id = ? AND path = ?",
        )
        .bind(site_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Page {
                id: row.try_get("id")?,
                site_id: row.try_get("site_id")?,
                path: row.try_get("path")?,
                code: row.try_get("code")?,
                content: row.try_get("content")?,
            })
        })
        .transpose()
    }

    /// Insert or reuse the `(site_id, path)` row. A unique-constraint
    /// violation from a concurrent racer is non-fatal: reload the row the
    /// winner created and return that instead (spec.md §4.7's tie-break
    /// rule).
    pub async fn save_page(
        &self,
        site_id: i64,
        path: &str,
        code: i32,
        content: &str,
    ) -> IndexResult<Page> {
        let inserted = sqlx::query(
            "INSERT INTO page (site_id, path, code, content) VALUES (?, ?, ?, ?)",
        )
        .bind(site_id)
        .bind(path)
        .bind(code)
        .bind(content)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(result) => Ok(Page {
                id: result.last_insert_rowid(),
                site_id,
                path: path.to_string(),
                code,
                content: content.to_string(),
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                self.find_page(site_id, path)
                    .await?
                    .ok_or_else(|| IndexError::Db(sqlx::Error::RowNotFound))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing page's fetched status/content (spec.md §4.10
    /// step 2: a re-index replaces the stored document rather than
    /// appending a second row for the same path).
    pub async fn update_page_content(&self, page_id: i64, code: i32, content: &str) -> IndexResult<()> {
        sqlx::query("UPDATE page SET code = ?, content = ? WHERE id = ?")
            .bind(code)
            .bind(content)
            .bind(page_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_lemma(&self, site_id: i64, text: &str) -> IndexResult<Option<Lemma>> {
        let row = sqlx::query(
            "SELECT id, site_id, lemma, frequency FROM lemma WHERE site_id = ? AND lemma = ?",
        )
        .bind(site_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Lemma {
                id: row.try_get("id")?,
                site_id: row.try_get("site_id")?,
                text: row.try_get("lemma")?,
                frequency: row.try_get("frequency")?,
            })
        })
        .transpose()
    }

    /// Upsert a batch of lemma rows, returning each row's database id in
    /// the same order as `records`. Idempotent: a record that already
    /// carries a `db_id` is updated in place; a fresh record is inserted
    /// (or, on a unique-constraint race, reconciled against the winner's
    /// row, matching the same tie-break rule `save_page` uses).
    pub async fn save_lemmas_batch(&self, records: &[LemmaRecord]) -> IndexResult<Vec<i64>> {
        let mut ids = Vec::with_capacity(records.len());
        let mut tx = self.pool.begin().await?;

        for record in records {
            let id = if let Some(db_id) = record.db_id {
                sqlx::query("UPDATE lemma SET frequency = ? WHERE id = ?")
                    .bind(record.frequency)
                    .bind(db_id)
                    .execute(&mut *tx)
                    .await?;
                db_id
            } else {
                let inserted = sqlx::query(
                    "INSERT INTO lemma (site_id, lemma, frequency) VALUES (?, ?, ?)",
                )
                .bind(record.site_id)
                .bind(&record.text)
                .bind(record.frequency)
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(result) => result.last_insert_rowid(),
                    Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                        let row = sqlx::query("SELECT id FROM lemma WHERE site_id = ? AND lemma = ?")
                            .bind(record.site_id)
                            .bind(&record.text)
                            .fetch_one(&mut *tx)
                            .await?;
                        let existing_id: i64 = row.try_get("id")?;
                        sqlx::query("UPDATE lemma SET frequency = ? WHERE id = ?")
                            .bind(record.frequency)
                            .bind(existing_id)
                            .execute(&mut *tx)
                            .await?;
                        existing_id
                    }
                    Err(e) => return Err(e.into()),
                }
            };
            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Upsert `(page, lemma)` index rows. `ON CONFLICT` on the
    /// `(page_id, lemma_id)` unique constraint keeps this idempotent within
    /// a run (invariant 2 / spec.md §4.6).
    pub async fn save_indices_batch(&self, records: &[IndexRecord]) -> IndexResult<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO indexx (page_id, lemma_id, rankk) VALUES (?, ?, ?)
                 ON CONFLICT(page_id, lemma_id) DO UPDATE SET rankk = excluded.rankk",
            )
            .bind(record.page_id)
            .bind(record.lemma_id)
            .bind(record.rank)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Delete every index row for `page_id`, returning the deleted rows so
    /// the caller (the Single-page Re-indexer) can decrement each
    /// referenced lemma's frequency (spec.md §4.10 step 4).
    pub async fn delete_indices_for_page(&self, page_id: i64) -> IndexResult<Vec<IndexEntry>> {
        let rows = sqlx::query(
            "SELECT id, page_id, lemma_id, rankk FROM indexx WHERE page_id = ?",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        let deleted = rows
            .iter()
            .map(|row| {
                Ok(IndexEntry {
                    id: row.try_get("id")?,
                    page_id: row.try_get("page_id")?,
                    lemma_id: row.try_get("lemma_id")?,
                    rank: row.try_get("rankk")?,
                })
            })
            .collect::<IndexResult<Vec<_>>>()?;

        sqlx::query("DELETE FROM indexx WHERE page_id = ?")
            .bind(page_id)
            .execute(&self.pool)
            .await?;

        Ok(deleted)
    }

    /// Decrement each deleted index's referenced lemma frequency by its
    /// rank, clamped at zero (spec.md §4.10 step 4).
    pub async fn adjust_lemma_frequencies(&self, deleted: &[IndexEntry]) -> IndexResult<()> {
        let mut tx = self.pool.begin().await?;
        for entry in deleted {
            sqlx::query(
                "UPDATE lemma SET frequency = MAX(0, frequency - ?) WHERE id = ?",
            )
            .bind(entry.rank as i64)
            .bind(entry.lemma_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn update_site_status(
        &self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> IndexResult<()> {
        sqlx::query("UPDATE site SET status = ?, status_time = ?, last_error = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(last_error)
            .bind(site_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
