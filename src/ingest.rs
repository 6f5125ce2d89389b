//! Startup reconciliation of the documents directory.
//!
//! Every file in `[documents].root` should have a report row and a search
//! index entry. [`Reconciler::reconcile_all`] walks the directory once and
//! handles each file independently: a file whose report already exists is
//! skipped, anything else is parsed, inserted, and indexed. A failure on one
//! file is logged and recorded in the [`IngestSummary`]; the remaining files
//! are still processed.
//!
//! The existence check is the only guard. A report that reached the store
//! but not the index (or the reverse) is never repaired by a later run.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, DocumentsConfig};
use crate::error::{Error, Result};
use crate::index::{self, SearchIndex};
use crate::models::NewReport;
use crate::parser::parse_document;
use crate::repository::{ReportRepository, SqliteRepository};
use crate::{db, migrate};

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new report was stored and indexed under this id.
    Created(i64),
    /// A report with this file name already existed.
    AlreadyPresent(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub file_name: String,
    pub error: String,
}

/// Per-run totals, kept after startup and served at `GET /ingestion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub scanned: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: Vec<IngestFailure>,
}

impl IngestSummary {
    pub fn record(&mut self, file_name: &str, outcome: &Result<ReconcileOutcome>) {
        self.scanned += 1;
        match outcome {
            Ok(ReconcileOutcome::Created(_)) => self.created += 1,
            Ok(ReconcileOutcome::AlreadyPresent(_)) => self.skipped += 1,
            Err(e) => self.failed.push(IngestFailure {
                file_name: file_name.to_string(),
                error: e.to_string(),
            }),
        }
    }
}

pub struct Reconciler<'a> {
    repo: &'a dyn ReportRepository,
    index: &'a dyn SearchIndex,
    documents: &'a DocumentsConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        repo: &'a dyn ReportRepository,
        index: &'a dyn SearchIndex,
        documents: &'a DocumentsConfig,
    ) -> Self {
        Self {
            repo,
            index,
            documents,
        }
    }

    /// Reconcile every file in the documents directory.
    ///
    /// Only an unreadable directory is an error; per-file failures end up in
    /// the returned summary.
    pub async fn reconcile_all(&self) -> Result<IngestSummary> {
        let file_names = list_documents(self.documents)?;
        let mut summary = IngestSummary::default();

        for file_name in &file_names {
            let outcome = self.reconcile_one(file_name).await;
            if let Err(ref e) = outcome {
                warn!(file = %file_name, error = %e, "failed to ingest report");
            }
            summary.record(file_name, &outcome);
        }

        info!(
            root = %self.documents.root.display(),
            scanned = summary.scanned,
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "ingestion finished"
        );
        Ok(summary)
    }

    /// Make sure `file_name` has a report row and an index entry.
    pub async fn reconcile_one(&self, file_name: &str) -> Result<ReconcileOutcome> {
        if let Some(existing) = self.repo.find_by_file_name(file_name).await? {
            info!(file = %file_name, id = existing.id, "report already present, skipping");
            return Ok(ReconcileOutcome::AlreadyPresent(existing.id));
        }

        let path = self.documents.root.join(file_name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;

        let parsed = parse_document(&content, self.documents.synopsis_lines);
        let new_report = NewReport {
            file_name: file_name.to_string(),
            name: parsed.name,
            author: parsed.author,
            synopsis: parsed.synopsis,
            text: parsed.text,
        };

        let id = self.repo.insert_report(&new_report).await?;
        let report = new_report.with_id(id);

        if let Err(e) = self.index.index(&report).await {
            warn!(
                file = %file_name,
                id,
                index = self.index.name(),
                "report stored but not indexed; later runs will not retry it"
            );
            return Err(e);
        }

        info!(file = %file_name, id, "added report");
        Ok(ReconcileOutcome::Created(id))
    }
}

/// File names directly under `documents.root` that pass the glob filters,
/// sorted by name. Hidden files are always skipped.
pub fn list_documents(documents: &DocumentsConfig) -> Result<Vec<String>> {
    let root = &documents.root;
    if !root.is_dir() {
        return Err(Error::io(
            root.display().to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "documents root is not a directory"),
        ));
    }

    let include_set = build_globset(&documents.include_globs)?;
    let exclude_set = build_globset(&documents.exclude_globs)?;

    let mut names = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || exclude_set.is_match(&name) {
            continue;
        }
        if !include_set.is_match(&name) {
            continue;
        }
        names.push(name);
    }

    Ok(names)
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(root));
    let io = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
    Error::io(path.display().to_string(), io)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::MalformedInput(format!("glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::MalformedInput(format!("glob set: {}", e)))
}

/// CLI entry point: reconcile once and print the summary.
pub async fn run_ingest(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let repo = SqliteRepository::new(pool);
    let index = index::create_index(&config.index)?;

    let reconciler = Reconciler::new(&repo, index.as_ref(), &config.documents);
    let summary = reconciler.reconcile_all().await;
    repo.close().await;
    let summary = summary?;

    println!("ingest {}", config.documents.root.display());
    println!("  scanned: {}", summary.scanned);
    println!("  created: {}", summary.created);
    println!("  skipped: {}", summary.skipped);
    println!("  failed: {}", summary.failed.len());
    for failure in &summary.failed {
        println!("    {}: {}", failure.file_name, failure.error);
    }
    println!("ok");

    Ok(())
}
