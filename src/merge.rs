// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Merges the starred and trending repository lists.
///
/// The merged list keeps the first occurrence of every `full_name` and
/// preserves input order, the starred list first.
use std::{collections::HashSet, path::Path};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::Error,
    record::{RepositoryRecord, RepositorySource},
    store,
};

/// Result of a merge, with the counts reported to the caller.
#[derive(Debug, Clone, Serialize,)]
pub struct MergeOutcome
{
    /// Deduplicated repositories in first-seen order.
    pub repositories: Vec<RepositoryRecord,>,
    /// Number of records before deduplication.
    pub total:        usize,
    /// Number of records after deduplication.
    pub unique:       usize,
}

/// Drops every record whose `full_name` was already seen.
pub fn dedupe_by_full_name(records: Vec<RepositoryRecord,>,) -> Vec<RepositoryRecord,>
{
    let mut seen = HashSet::with_capacity(records.len(),);
    let mut unique = Vec::with_capacity(records.len(),);

    for record in records {
        if seen.insert(record.full_name.clone(),) {
            unique.push(record,);
        } else {
            debug!("Skipping duplicate repository: {}", record);
        }
    }

    unique
}

/// Tags and merges the two lists.
///
/// Records of `starred` are tagged [`RepositorySource::Starred`]; records of
/// `trending` without a source are tagged [`RepositorySource::Trending`].
///
/// # Example
///
/// ```
/// use minlogo::{RepositoryRecord, merge_repositories};
///
/// let starred = vec![RepositoryRecord::new("a", "one",)];
/// let trending = vec![RepositoryRecord::new("a", "one",), RepositoryRecord::new("b", "two",)];
/// let outcome = merge_repositories(starred, trending,);
/// assert_eq!((outcome.total, outcome.unique), (3, 2));
/// ```
pub fn merge_repositories(
    starred: Vec<RepositoryRecord,>,
    trending: Vec<RepositoryRecord,>,
) -> MergeOutcome
{
    let starred = starred.into_iter().map(|record| RepositoryRecord {
        source: Some(RepositorySource::Starred,),
        ..record
    },);
    let trending = trending.into_iter().map(|record| RepositoryRecord {
        source: record.source.or(Some(RepositorySource::Trending,),),
        ..record
    },);

    let all: Vec<RepositoryRecord,> = starred.chain(trending,).collect();
    let total = all.len();
    let repositories = dedupe_by_full_name(all,);
    let unique = repositories.len();

    MergeOutcome {
        repositories,
        total,
        unique,
    }
}

/// Merges the list files that exist and writes the merged list.
///
/// # Errors
///
/// Returns [`Error`] when a present input cannot be read or the output cannot
/// be written.
pub fn merge_files(
    starred_path: &Path,
    trending_path: &Path,
    output_path: &Path,
) -> Result<MergeOutcome, Error,>
{
    let starred = store::load_records_if_present(starred_path,)?.unwrap_or_default();
    let trending = store::load_records_if_present(trending_path,)?.unwrap_or_default();

    let outcome = merge_repositories(starred, trending,);
    store::save_records(output_path, &outcome.repositories,)?;

    info!("Merged {} repos, {} unique", outcome.total, outcome.unique);
    Ok(outcome,)
}
