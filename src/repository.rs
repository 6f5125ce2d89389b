//! Relational persistence for reports, tags, and report-tag associations.
//!
//! The [`ReportRepository`] trait is the seam used by ingestion, the tag
//! update path, and the HTTP handlers. [`SqliteRepository`] is the production
//! implementation over a [`SqlitePool`].
//!
//! Lookups for a report id that does not exist return an empty result rather
//! than an error. Updating or deleting an association that does not exist is
//! a no-op.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::db;
use crate::error::Result;
use crate::models::{NewReport, Report, ReportSummary, ReportTag, Tag, TagAssignment};
use crate::tags::TagDiff;

/// Storage operations for reports and their tag associations.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_by_file_name`](ReportRepository::find_by_file_name) | Idempotence guard for ingestion |
/// | [`find_by_id`](ReportRepository::find_by_id) | Full report including text |
/// | [`list_all`](ReportRepository::list_all) | Listing projection ordered by name |
/// | [`insert_report`](ReportRepository::insert_report) | Insert and return the generated id |
/// | [`list_tags_for_report`](ReportRepository::list_tags_for_report) | Associations joined with the catalog |
/// | [`apply_tag_diff`](ReportRepository::apply_tag_diff) | Apply a diff in one transaction |
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Confirm the store is reachable.
    async fn ping(&self) -> Result<()>;

    async fn find_by_file_name(&self, file_name: &str) -> Result<Option<Report>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>>;

    /// All reports ordered by name, without their full text.
    async fn list_all(&self) -> Result<Vec<ReportSummary>>;

    async fn exists(&self, id: i64) -> Result<bool>;

    /// Insert a report and return the id the store assigned to it.
    async fn insert_report(&self, report: &NewReport) -> Result<i64>;

    /// The whole tag catalog ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Tags with an association row for this report, ordered by tag name.
    async fn list_tags_for_report(&self, report_id: i64) -> Result<Vec<ReportTag>>;

    /// Tags with no association row for this report, ordered by tag name.
    async fn list_unassigned_tags_for_report(&self, report_id: i64) -> Result<Vec<Tag>>;

    async fn insert_association(&self, report_id: i64, assignment: &TagAssignment) -> Result<()>;

    async fn update_association(&self, report_id: i64, assignment: &TagAssignment) -> Result<()>;

    async fn delete_association(&self, report_id: i64, tag_id: i64) -> Result<()>;

    /// Apply every insert, update, and delete of `diff` atomically.
    async fn apply_tag_diff(&self, report_id: i64, diff: &TagDiff) -> Result<()>;
}

/// SQLite implementation of [`ReportRepository`].
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the underlying pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const REPORT_COLUMNS: &str = "id, file_name, name, author, synopsis, text";

fn row_to_report(row: &SqliteRow) -> Report {
    Report {
        id: row.get("id"),
        file_name: row.get("file_name"),
        name: row.get("name"),
        author: row.get("author"),
        synopsis: row.get("synopsis"),
        text: row.get("text"),
    }
}

fn row_to_tag(row: &SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
    }
}

async fn insert_association_with<'e, E>(
    executor: E,
    report_id: i64,
    assignment: &TagAssignment,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    // A concurrent request may have inserted the same pair first; the pair
    // stays unique and the latest active flag wins.
    sqlx::query(
        r#"
        INSERT INTO report_tag (report_id, tag_id, active) VALUES (?, ?, ?)
        ON CONFLICT(report_id, tag_id) DO UPDATE SET active = excluded.active
        "#,
    )
    .bind(report_id)
    .bind(assignment.tag_id)
    .bind(assignment.active)
    .execute(executor)
    .await?;
    Ok(())
}

async fn update_association_with<'e, E>(
    executor: E,
    report_id: i64,
    assignment: &TagAssignment,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE report_tag SET active = ? WHERE report_id = ? AND tag_id = ?")
        .bind(assignment.active)
        .bind(report_id)
        .bind(assignment.tag_id)
        .execute(executor)
        .await?;
    Ok(())
}

async fn delete_association_with<'e, E>(executor: E, report_id: i64, tag_id: i64) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM report_tag WHERE report_id = ? AND tag_id = ?")
        .bind(report_id)
        .bind(tag_id)
        .execute(executor)
        .await?;
    Ok(())
}

#[async_trait]
impl ReportRepository for SqliteRepository {
    async fn ping(&self) -> Result<()> {
        db::ping(&self.pool).await
    }

    async fn find_by_file_name(&self, file_name: &str) -> Result<Option<Report>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM report WHERE file_name = ?",
            REPORT_COLUMNS
        ))
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_report))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query(&format!("SELECT {} FROM report WHERE id = ?", REPORT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_report))
    }

    async fn list_all(&self) -> Result<Vec<ReportSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, author, file_name, synopsis FROM report ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "listed reports");

        Ok(rows
            .iter()
            .map(|row| ReportSummary {
                id: row.get("id"),
                name: row.get("name"),
                author: row.get("author"),
                file_name: row.get("file_name"),
                synopsis: row.get("synopsis"),
            })
            .collect())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert_report(&self, report: &NewReport) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO report (file_name, name, author, synopsis, text) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&report.file_name)
        .bind(&report.name)
        .bind(&report.author)
        .bind(&report.synopsis)
        .bind(&report.text)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, color FROM tag ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_tag).collect())
    }

    async fn list_tags_for_report(&self, report_id: i64) -> Result<Vec<ReportTag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.color, rt.active
            FROM report_tag AS rt
            INNER JOIN tag AS t ON rt.tag_id = t.id
            WHERE rt.report_id = ?
            ORDER BY t.name ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ReportTag {
                tag: row_to_tag(row),
                active: row.get("active"),
            })
            .collect())
    }

    async fn list_unassigned_tags_for_report(&self, report_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.color
            FROM tag AS t
            WHERE EXISTS (SELECT 1 FROM report WHERE id = ?)
              AND NOT EXISTS (
                SELECT 1 FROM report_tag AS rt
                WHERE rt.report_id = ? AND rt.tag_id = t.id
              )
            ORDER BY t.name ASC
            "#,
        )
        .bind(report_id)
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_tag).collect())
    }

    async fn insert_association(&self, report_id: i64, assignment: &TagAssignment) -> Result<()> {
        insert_association_with(&self.pool, report_id, assignment).await
    }

    async fn update_association(&self, report_id: i64, assignment: &TagAssignment) -> Result<()> {
        update_association_with(&self.pool, report_id, assignment).await
    }

    async fn delete_association(&self, report_id: i64, tag_id: i64) -> Result<()> {
        delete_association_with(&self.pool, report_id, tag_id).await
    }

    async fn apply_tag_diff(&self, report_id: i64, diff: &TagDiff) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for assignment in &diff.to_insert {
            insert_association_with(&mut *tx, report_id, assignment).await?;
        }
        for assignment in &diff.to_update {
            update_association_with(&mut *tx, report_id, assignment).await?;
        }
        for assignment in &diff.to_delete {
            delete_association_with(&mut *tx, report_id, assignment.tag_id).await?;
        }

        tx.commit().await?;

        debug!(
            report_id,
            inserted = diff.to_insert.len(),
            updated = diff.to_update.len(),
            deleted = diff.to_delete.len(),
            "applied tag diff"
        );
        Ok(())
    }
}
