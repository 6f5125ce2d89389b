//! Report retrieval by id.
//!
//! Used by both `docket get` and `GET /reports/{id}`.

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::models::Report;
use crate::repository::{ReportRepository, SqliteRepository};

/// Fetch a full report, text included, or [`Error::NotFound`].
pub async fn get_report(repo: &dyn ReportRepository, id: i64) -> Result<Report> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("report {}", id)))
}

/// CLI entry point: prints the report and its tags to stdout.
pub async fn run_get(config: &Config, id: i64) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let repo = SqliteRepository::new(pool);

    let report = get_report(&repo, id).await;
    let tags = repo.list_tags_for_report(id).await;
    repo.close().await;
    let report = report?;
    let tags = tags?;

    println!("--- Report ---");
    println!("id:        {}", report.id);
    println!(
        "name:      {}",
        if report.name.is_empty() { "(untitled)" } else { report.name.as_str() }
    );
    println!("author:    {}", report.author);
    println!("file_name: {}", report.file_name);
    if !tags.is_empty() {
        let rendered: Vec<String> = tags
            .iter()
            .map(|t| {
                if t.active {
                    t.tag.name.clone()
                } else {
                    format!("{} (inactive)", t.tag.name)
                }
            })
            .collect();
        println!("tags:      {}", rendered.join(", "));
    }
    println!();

    println!("--- Synopsis ---");
    println!("{}", report.synopsis);
    println!();

    println!("--- Text ---");
    print!("{}", report.text);

    Ok(())
}
