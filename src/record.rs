// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository records flowing between pipeline stages.
//!
//! A [`RepositoryRecord`] is created by a lister and never mutated afterwards.
//! Later stages attach optional fields through consuming helpers
//! ([`RepositoryRecord::with_logo`], [`RepositoryRecord::with_filter`]) which
//! keep the identity fields untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Provenance of a repository record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySource
{
    /// Most-starred search results.
    Starred,
    /// Trending listing without a known period.
    Trending,
    /// Daily trending listing.
    TrendingDaily,
    /// Weekly trending listing.
    TrendingWeekly,
    /// Monthly trending listing.
    TrendingMonthly,
}

/// Repository metadata persisted in the JSON state files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct RepositoryRecord
{
    pub owner:         String,
    pub name:          String,
    /// `owner/name`, unique across a merged list.
    pub full_name:     String,
    #[serde(default)]
    pub stars:         u64,
    #[serde(default)]
    pub description:   Option<String,>,
    #[serde(default)]
    pub url:           String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url:    Option<String,>,
    #[serde(default = "unknown_language")]
    pub language:      String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source:        Option<RepositorySource,>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path:    Option<PathBuf,>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_ext:      Option<String,>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_path: Option<PathBuf,>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_count:   Option<i64,>,
}

fn unknown_language() -> String
{
    "Unknown".to_owned()
}

impl RepositoryRecord
{
    /// Creates a record for `owner/name` with the canonical GitHub URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use minlogo::RepositoryRecord;
    ///
    /// let record = RepositoryRecord::new("rust-lang", "rust",);
    /// assert_eq!(record.full_name, "rust-lang/rust");
    /// assert_eq!(record.url, "https://github.com/rust-lang/rust");
    /// ```
    pub fn new(owner: impl Into<String,>, name: impl Into<String,>,) -> Self
    {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{owner}/{name}");

        Self {
            url: format!("https://github.com/{full_name}"),
            owner,
            name,
            full_name,
            stars: 0,
            description: None,
            avatar_url: None,
            language: unknown_language(),
            source: None,
            image_path: None,
            logo_ext: None,
            filtered_path: None,
            color_count: None,
        }
    }

    /// Returns the record with the downloaded logo location attached.
    pub fn with_logo(self, image_path: &Path, extension: &str,) -> Self
    {
        Self {
            image_path: Some(image_path.to_path_buf(),),
            logo_ext: Some(extension.to_owned(),),
            ..self
        }
    }

    /// Returns the record with the filter outcome attached.
    pub fn with_filter(self, filtered_path: &Path, color_count: i64,) -> Self
    {
        Self {
            filtered_path: Some(filtered_path.to_path_buf(),),
            color_count: Some(color_count,),
            ..self
        }
    }

    /// Deterministic logo file stem: `{owner}_{name}`.
    pub fn logo_stem(&self,) -> String
    {
        format!("{}_{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepositoryRecord
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.write_str(&self.full_name,)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn source_serializes_as_snake_case()
    {
        let json = serde_json::to_string(&RepositorySource::TrendingWeekly,)
            .expect("serialization failed",);
        assert_eq!(json, "\"trending_weekly\"");
    }

    #[test]
    fn record_deserializes_with_missing_optional_fields()
    {
        let json = r#"{"owner":"o","name":"n","full_name":"o/n","description":null}"#;
        let record: RepositoryRecord = serde_json::from_str(json,).expect("invalid record",);

        assert_eq!(record.language, "Unknown");
        assert_eq!(record.stars, 0);
        assert!(record.source.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn enrichment_keeps_identity_fields()
    {
        let record = RepositoryRecord::new("owner", "repo",);
        let enriched = record
            .clone()
            .with_logo(Path::new("dataset/raw/owner_repo.svg",), "svg",)
            .with_filter(Path::new("dataset/filtered/owner_repo.svg",), -2,);

        assert_eq!(enriched.full_name, record.full_name);
        assert_eq!(enriched.logo_ext.as_deref(), Some("svg"));
        assert_eq!(enriched.color_count, Some(-2));
        assert_eq!(enriched.logo_stem(), "owner_repo");
    }

    #[test]
    fn unset_enrichment_fields_are_not_serialized()
    {
        let json = serde_json::to_string(&RepositoryRecord::new("a", "b",),)
            .expect("serialization failed",);
        assert!(!json.contains("image_path"));
        assert!(!json.contains("color_count"));
        assert!(json.contains("\"full_name\":\"a/b\""));
    }
}
