//! Report search.
//!
//! A non-empty term is sent to the search index and returns scored hits in
//! the index's order. An empty (or all-whitespace) term never reaches the
//! index: it returns the unscored listing of every report, ordered by name.

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::index::{self, SearchIndex};
use crate::models::{ReportSummary, SearchHit};
use crate::repository::{ReportRepository, SqliteRepository};

/// Either the plain listing or ranked hits; serialized as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResults {
    Listing(Vec<ReportSummary>),
    Ranked(Vec<SearchHit>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Listing(reports) => reports.len(),
            SearchResults::Ranked(hits) => hits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub async fn search_reports(
    repo: &dyn ReportRepository,
    index: &dyn SearchIndex,
    term: Option<&str>,
) -> Result<SearchResults> {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(SearchResults::Listing(repo.list_all().await?)),
        Some(term) => {
            let hits = index.search(term).await?;
            debug!(term, hits = hits.len(), index = index.name(), "searched reports");
            Ok(SearchResults::Ranked(hits))
        }
    }
}

/// CLI entry point for `docket list` and `docket search`.
pub async fn run_search(config: &Config, term: Option<&str>) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let repo = SqliteRepository::new(pool);
    let index = index::create_index(&config.index)?;

    let results = search_reports(&repo, index.as_ref(), term).await;
    repo.close().await;

    match results? {
        SearchResults::Listing(reports) if reports.is_empty() => println!("No reports."),
        SearchResults::Ranked(hits) if hits.is_empty() => println!("No results."),
        SearchResults::Listing(reports) => {
            for r in &reports {
                println!("{:>5}  {:<32} {:<24} {}", r.id, r.name, r.author, r.file_name);
            }
        }
        SearchResults::Ranked(hits) => {
            for (i, hit) in hits.iter().enumerate() {
                let r = &hit.report;
                println!(
                    "{}. [{:.3}] {} ({})",
                    i + 1,
                    hit.score,
                    if r.name.is_empty() { "(untitled)" } else { r.name.as_str() },
                    r.file_name
                );
                println!("    id: {}  author: {}", r.id, r.author);
            }
        }
    }

    Ok(())
}
