//! Append-only activity repository.
//!
//! # Invariants
//! - There is no update or delete path for activities.
//! - Lists are ordered newest first (`id DESC`).

use crate::db::UnitOfWork;
use crate::model::activity::{Activity, ActivityType, NewActivity};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Params, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    type,
    user_id,
    work_id,
    work_title,
    work_version,
    created_at
FROM activities";

/// Audit-log port.
pub trait ActivityRepository {
    fn get_all(&self, conn: &Connection) -> RepoResult<Vec<Activity>>;
    fn find_by_user_id(&self, conn: &Connection, user_id: &str) -> RepoResult<Vec<Activity>>;
    /// Appends one record inside the caller's unit of work.
    fn create(&self, uow: &UnitOfWork<'_>, activity: &NewActivity) -> RepoResult<Activity>;
}

/// SQLite-backed activity repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteActivityRepository;

impl SqliteActivityRepository {
    pub fn new() -> Self {
        Self
    }
}

impl ActivityRepository for SqliteActivityRepository {
    fn get_all(&self, conn: &Connection) -> RepoResult<Vec<Activity>> {
        query_activities(
            conn,
            &format!("{ACTIVITY_SELECT_SQL} ORDER BY id DESC;"),
            [],
        )
    }

    fn find_by_user_id(&self, conn: &Connection, user_id: &str) -> RepoResult<Vec<Activity>> {
        query_activities(
            conn,
            &format!("{ACTIVITY_SELECT_SQL} WHERE user_id = ?1 ORDER BY id DESC;"),
            [user_id],
        )
    }

    fn create(&self, uow: &UnitOfWork<'_>, activity: &NewActivity) -> RepoResult<Activity> {
        let conn = uow.connection()?;
        if activity.user_id.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "activity user_id must not be empty".to_string(),
            ));
        }

        conn.execute(
            "INSERT INTO activities (
                type,
                user_id,
                work_id,
                work_title,
                work_version
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                activity.kind.as_str(),
                activity.user_id.as_str(),
                activity.work_id,
                activity.work_title.as_str(),
                activity.work_version,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let mut created = query_activities(
            conn,
            &format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"),
            [id],
        )?;
        created.pop().ok_or_else(|| {
            RepoError::InvalidData(format!("activity {id} missing after insert"))
        })
    }
}

fn query_activities(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<Vec<Activity>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut activities = Vec::new();
    while let Some(row) = rows.next()? {
        activities.push(parse_activity_row(row)?);
    }
    Ok(activities)
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let type_text: String = row.get("type")?;
    let kind = ActivityType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid activity type `{type_text}` in activities.type"
        ))
    })?;

    Ok(Activity {
        id: row.get("id")?,
        kind,
        user_id: row.get("user_id")?,
        work_id: row.get("work_id")?,
        work_title: row.get("work_title")?,
        work_version: row.get("work_version")?,
        created_at: row.get("created_at")?,
    })
}
