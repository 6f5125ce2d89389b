use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::SearchIndex;
use crate::error::Result;
use crate::models::{Report, ReportSummary, SearchHit};

/// Process-local index scoring reports by how often the query's words occur
/// in their text. Ties keep ascending id order.
pub struct InMemoryIndex {
    docs: RwLock<BTreeMap<i64, Report>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: i64) -> bool {
        self.docs.read().map(|d| d.contains_key(&id)).unwrap_or(false)
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn index(&self, report: &Report) -> Result<()> {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.insert(report.id, report.clone());
        Ok(())
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let terms = tokenize(term);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<SearchHit> = docs
            .values()
            .filter_map(|report| {
                let tokens = tokenize(&report.text);
                let score = tokens.iter().filter(|t| terms.contains(t)).count() as f64;
                (score > 0.0).then(|| SearchHit {
                    report: ReportSummary::from(report),
                    score,
                })
            })
            .collect();

        // Stable sort keeps id order for equal scores.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, text: &str) -> Report {
        Report {
            id,
            file_name: format!("{}.txt", id),
            name: format!("Report {}", id),
            author: "tester".to_string(),
            synopsis: String::new(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ranks_by_term_frequency() {
        let index = InMemoryIndex::new();
        index.index(&report(1, "lung nodule")).await.unwrap();
        index.index(&report(2, "Lung lung LUNG opacity")).await.unwrap();
        index.index(&report(3, "cardiac silhouette")).await.unwrap();

        let hits = index.search("lung").await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.report.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let index = InMemoryIndex::new();
        index.index(&report(1, "alpha")).await.unwrap();
        index.index(&report(1, "beta")).await.unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.search("alpha").await.unwrap().is_empty());
        assert_eq!(index.search("beta").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_id_order() {
        let index = InMemoryIndex::new();
        index.index(&report(3, "fracture")).await.unwrap();
        index.index(&report(1, "fracture")).await.unwrap();
        let hits = index.search("fracture").await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.report.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
