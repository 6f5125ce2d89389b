//! Tag diffing and tag-list views.
//!
//! A client submits the full list of tag assignments it wants a report to
//! have. [`compute_diff`] compares that list with the server's current
//! associations and produces three sets, disjoint on tag id:
//!
//! - **update**: tag present on both sides with a different `active` flag
//!   (the client's flag wins)
//! - **insert**: tag only the client mentions
//! - **delete**: tag only the server holds
//!
//! Applying the diff leaves the server holding exactly the client's list, so
//! diffing the same client list again yields an empty diff.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{ReportTag, TagAssignment, TagLists};
use crate::repository::ReportRepository;

/// Operations that bring a report's associations in line with a client list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDiff {
    pub to_insert: Vec<TagAssignment>,
    pub to_update: Vec<TagAssignment>,
    /// Server-side state of the associations being removed.
    pub to_delete: Vec<TagAssignment>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute the diff between `server` and `client`. Each set is ordered by tag id.
///
/// `client` must not mention a tag id twice; [`validate_client_list`] checks that.
pub fn compute_diff(server: &[TagAssignment], client: &[TagAssignment]) -> TagDiff {
    let mut server_map: BTreeMap<i64, bool> =
        server.iter().map(|a| (a.tag_id, a.active)).collect();
    let mut client_map: BTreeMap<i64, bool> =
        client.iter().map(|a| (a.tag_id, a.active)).collect();

    let mut diff = TagDiff::default();

    let shared: Vec<i64> = client_map
        .keys()
        .filter(|id| server_map.contains_key(id))
        .copied()
        .collect();

    for tag_id in shared {
        let (Some(server_active), Some(client_active)) =
            (server_map.remove(&tag_id), client_map.remove(&tag_id))
        else {
            continue;
        };
        if server_active != client_active {
            diff.to_update.push(TagAssignment {
                tag_id,
                active: client_active,
            });
        }
    }

    diff.to_insert = client_map
        .into_iter()
        .map(|(tag_id, active)| TagAssignment { tag_id, active })
        .collect();
    diff.to_delete = server_map
        .into_iter()
        .map(|(tag_id, active)| TagAssignment { tag_id, active })
        .collect();

    diff
}

/// Reject client lists that repeat a tag id or name a tag outside the catalog.
pub fn validate_client_list(client: &[TagAssignment], catalog_ids: &HashSet<i64>) -> Result<()> {
    let mut seen = HashSet::with_capacity(client.len());
    for assignment in client {
        if !seen.insert(assignment.tag_id) {
            return Err(Error::MalformedInput(format!(
                "tag {} listed more than once",
                assignment.tag_id
            )));
        }
        if !catalog_ids.contains(&assignment.tag_id) {
            return Err(Error::MalformedInput(format!(
                "tag {} does not exist",
                assignment.tag_id
            )));
        }
    }
    Ok(())
}

/// Replace a report's tag associations with the client's list.
///
/// Returns [`Error::NotFound`] when the report does not exist.
pub async fn update_report_tags(
    repo: &dyn ReportRepository,
    report_id: i64,
    client: &[TagAssignment],
) -> Result<TagDiff> {
    if !repo.exists(report_id).await? {
        return Err(Error::NotFound(format!("report {}", report_id)));
    }

    let catalog_ids: HashSet<i64> = repo.list_tags().await?.iter().map(|t| t.id).collect();
    validate_client_list(client, &catalog_ids)?;

    let server: Vec<TagAssignment> = repo
        .list_tags_for_report(report_id)
        .await?
        .iter()
        .map(ReportTag::assignment)
        .collect();

    let diff = compute_diff(&server, client);
    if !diff.is_empty() {
        repo.apply_tag_diff(report_id, &diff).await?;
    }

    info!(
        report_id,
        inserted = diff.to_insert.len(),
        updated = diff.to_update.len(),
        deleted = diff.to_delete.len(),
        "updated report tags"
    );
    Ok(diff)
}

/// Split a report's tags into active, inactive, and never-assigned lists.
pub async fn tag_lists(repo: &dyn ReportRepository, report_id: i64) -> Result<TagLists> {
    let assigned = repo.list_tags_for_report(report_id).await?;
    let unassigned = repo.list_unassigned_tags_for_report(report_id).await?;

    let mut lists = TagLists {
        unassigned_tag_list: unassigned,
        ..TagLists::default()
    };
    for report_tag in assigned {
        if report_tag.active {
            lists.active_tag_list.push(report_tag.tag);
        } else {
            lists.inactive_tag_list.push(report_tag.tag);
        }
    }
    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(tag_id: i64, active: bool) -> TagAssignment {
        TagAssignment { tag_id, active }
    }

    /// Apply a diff to an in-memory association map.
    fn apply(server: &[TagAssignment], diff: &TagDiff) -> Vec<TagAssignment> {
        let mut state: BTreeMap<i64, bool> = server.iter().map(|x| (x.tag_id, x.active)).collect();
        for x in &diff.to_insert {
            state.insert(x.tag_id, x.active);
        }
        for x in &diff.to_update {
            if let Some(v) = state.get_mut(&x.tag_id) {
                *v = x.active;
            }
        }
        for x in &diff.to_delete {
            state.remove(&x.tag_id);
        }
        state.into_iter().map(|(id, active)| a(id, active)).collect()
    }

    #[test]
    fn test_update_insert_delete() {
        let server = vec![a(1, true), a(2, false)];
        let client = vec![a(1, false), a(3, true)];
        let diff = compute_diff(&server, &client);
        assert_eq!(diff.to_update, vec![a(1, false)]);
        assert_eq!(diff.to_insert, vec![a(3, true)]);
        assert_eq!(diff.to_delete, vec![a(2, false)]);
    }

    #[test]
    fn test_matching_flags_produce_nothing() {
        let server = vec![a(1, true), a(2, false)];
        let diff = compute_diff(&server, &server);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_empty_client_deletes_everything() {
        let server = vec![a(4, true), a(2, false)];
        let diff = compute_diff(&server, &[]);
        assert!(diff.to_insert.is_empty());
        assert!(diff.to_update.is_empty());
        assert_eq!(diff.to_delete, vec![a(2, false), a(4, true)]);
    }

    #[test]
    fn test_empty_server_inserts_everything() {
        let client = vec![a(9, false), a(5, true)];
        let diff = compute_diff(&[], &client);
        assert_eq!(diff.to_insert, vec![a(5, true), a(9, false)]);
        assert!(diff.to_delete.is_empty());
    }

    #[test]
    fn test_sets_are_disjoint() {
        let server = vec![a(1, true), a(2, true), a(3, false), a(4, true)];
        let client = vec![a(2, false), a(3, false), a(5, true), a(6, false)];
        let diff = compute_diff(&server, &client);

        let mut ids = HashSet::new();
        for x in diff.to_insert.iter().chain(&diff.to_update).chain(&diff.to_delete) {
            assert!(ids.insert(x.tag_id), "tag {} appears in two sets", x.tag_id);
        }
    }

    #[test]
    fn test_applied_diff_matches_client_and_is_fixed_point() {
        let server = vec![a(1, true), a(2, true), a(3, false), a(4, true)];
        let client = vec![a(2, false), a(3, false), a(5, true), a(6, false)];

        let diff = compute_diff(&server, &client);
        let after = apply(&server, &diff);

        let mut expected = client.clone();
        expected.sort_by_key(|x| x.tag_id);
        assert_eq!(after, expected);

        assert!(compute_diff(&after, &client).is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let catalog: HashSet<i64> = [1, 2].into_iter().collect();
        let err = validate_client_list(&[a(1, true), a(1, false)], &catalog).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_validate_rejects_unknown_tag() {
        let catalog: HashSet<i64> = [1, 2].into_iter().collect();
        let err = validate_client_list(&[a(7, true)], &catalog).unwrap_err();
        assert!(err.to_string().contains("tag 7"));
    }

    #[test]
    fn test_validate_accepts_catalog_tags() {
        let catalog: HashSet<i64> = [1, 2].into_iter().collect();
        validate_client_list(&[a(1, true), a(2, false)], &catalog).unwrap();
    }
}
