//! Work repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide paged reads, count, lookup and write APIs over `works`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Rows with `deleted_at` set are invisible to every read method.
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `save` never touches `author_id` or `created_at`.

use crate::db::UnitOfWork;
use crate::model::work::{ContentType, NewWork, Work, WorkId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const WORK_SELECT_SQL: &str = "SELECT
    id,
    type,
    title,
    description,
    author_id,
    thumbnail_url,
    content_url,
    version,
    created_at,
    updated_at,
    deleted_at
FROM works";

/// Persistence port for works.
pub trait WorkRepository {
    /// Counts live (not soft-deleted) works.
    fn count_all(&self, conn: &Connection) -> RepoResult<u64>;
    /// Returns at most `limit` live works ordered by id, skipping `offset`.
    fn get_all(&self, conn: &Connection, offset: u32, limit: u32) -> RepoResult<Vec<Work>>;
    /// Returns one live work or `RepoError::NotFound`.
    fn find_by_id(&self, conn: &Connection, id: WorkId) -> RepoResult<Work>;
    /// Inserts a work and returns the persisted row.
    fn create(&self, uow: &UnitOfWork<'_>, work: &NewWork) -> RepoResult<Work>;
    /// Overwrites mutable fields of a live work and returns the persisted row.
    fn save(&self, uow: &UnitOfWork<'_>, work: &Work) -> RepoResult<Work>;
    /// Tombstones a live work.
    fn delete_by_id(&self, uow: &UnitOfWork<'_>, id: WorkId) -> RepoResult<()>;
}

/// SQLite-backed work repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteWorkRepository;

impl SqliteWorkRepository {
    pub fn new() -> Self {
        Self
    }
}

impl WorkRepository for SqliteWorkRepository {
    fn count_all(&self, conn: &Connection) -> RepoResult<u64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM works WHERE deleted_at IS NULL;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative work count `{count}`")))
    }

    fn get_all(&self, conn: &Connection, offset: u32, limit: u32) -> RepoResult<Vec<Work>> {
        let mut stmt = conn.prepare(&format!(
            "{WORK_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(limit), i64::from(offset)])?;
        let mut works = Vec::new();
        while let Some(row) = rows.next()? {
            works.push(parse_work_row(row)?);
        }
        Ok(works)
    }

    fn find_by_id(&self, conn: &Connection, id: WorkId) -> RepoResult<Work> {
        let mut stmt = conn.prepare(&format!(
            "{WORK_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_work_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn create(&self, uow: &UnitOfWork<'_>, work: &NewWork) -> RepoResult<Work> {
        let conn = uow.connection()?;
        work.validate()?;

        conn.execute(
            "INSERT INTO works (
                type,
                title,
                description,
                author_id,
                thumbnail_url,
                content_url,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                work.kind.as_str(),
                work.title.as_str(),
                work.description.as_str(),
                work.author_id.as_str(),
                work.thumbnail_url.as_str(),
                work.content_url.as_str(),
                work.version,
            ],
        )?;

        self.find_by_id(conn, conn.last_insert_rowid())
    }

    fn save(&self, uow: &UnitOfWork<'_>, work: &Work) -> RepoResult<Work> {
        let conn = uow.connection()?;
        work.validate()?;

        let changed = conn.execute(
            "UPDATE works
             SET
                type = ?1,
                title = ?2,
                description = ?3,
                thumbnail_url = ?4,
                content_url = ?5,
                version = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7
               AND deleted_at IS NULL;",
            params![
                work.kind.as_str(),
                work.title.as_str(),
                work.description.as_str(),
                work.thumbnail_url.as_str(),
                work.content_url.as_str(),
                work.version,
                work.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(work.id));
        }

        self.find_by_id(conn, work.id)
    }

    fn delete_by_id(&self, uow: &UnitOfWork<'_>, id: WorkId) -> RepoResult<()> {
        let conn = uow.connection()?;
        let changed = conn.execute(
            "UPDATE works
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_work_row(row: &Row<'_>) -> RepoResult<Work> {
    let type_text: String = row.get("type")?;
    let kind = ContentType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid content type `{type_text}` in works.type"))
    })?;

    let work = Work {
        id: row.get("id")?,
        kind,
        title: row.get("title")?,
        description: row.get("description")?,
        author_id: row.get("author_id")?,
        thumbnail_url: row.get("thumbnail_url")?,
        content_url: row.get("content_url")?,
        version: row.get("version")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    work.validate()?;
    Ok(work)
}
