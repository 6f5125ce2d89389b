//! Core data models used throughout docket.
//!
//! These types represent the reports, tags, and tag associations that flow
//! between the store, the search index, and the HTTP API. JSON field names
//! are camelCase to match the API contract.

use serde::{Deserialize, Serialize};

/// A persisted report, including its full text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub file_name: String,
    pub name: String,
    pub author: String,
    pub synopsis: String,
    pub text: String,
}

/// Listing projection of a [`Report`]. Never carries the full text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub file_name: String,
    pub synopsis: String,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id,
            name: report.name.clone(),
            author: report.author.clone(),
            file_name: report.file_name.clone(),
            synopsis: report.synopsis.clone(),
        }
    }
}

/// A report that has been parsed but not yet assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub file_name: String,
    pub name: String,
    pub author: String,
    pub synopsis: String,
    pub text: String,
}

impl NewReport {
    pub fn with_id(self, id: i64) -> Report {
        Report {
            id,
            file_name: self.file_name,
            name: self.name,
            author: self.author,
            synopsis: self.synopsis,
            text: self.text,
        }
    }
}

/// A search result: the listing projection plus the index's relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub report: ReportSummary,
    pub score: f64,
}

/// An entry of the global tag catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
}

/// A tag joined with its association state for one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTag {
    #[serde(flatten)]
    pub tag: Tag,
    pub active: bool,
}

impl ReportTag {
    pub fn assignment(&self) -> TagAssignment {
        TagAssignment {
            tag_id: self.tag.id,
            active: self.active,
        }
    }
}

/// Client-submitted (or server-held) association state for one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAssignment {
    pub tag_id: i64,
    pub active: bool,
}

/// The three-way partition served by `GET /reports/{id}/tagLists`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLists {
    pub active_tag_list: Vec<Tag>,
    pub inactive_tag_list: Vec<Tag>,
    pub unassigned_tag_list: Vec<Tag>,
}
