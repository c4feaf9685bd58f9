// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Best-effort discovery of a repository logo.
//!
//! The locator first probes a prioritized table of conventional paths and
//! returns the first hit. When none of them exists it walks the repository
//! root, descending only into asset-like directories, and picks the first
//! image whose name mentions "logo" or "icon", falling back to the first image
//! found. All lookups go through a [`ContentSource`], which keeps the
//! heuristics independent from the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LocatorTables;

/// Kind of a repository content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind
{
    File,
    Dir,
    /// Symlinks, submodules and anything else.
    #[serde(other)]
    Other,
}

/// Entry of a repository directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ContentEntry
{
    #[serde(rename = "type")]
    pub kind:         EntryKind,
    pub name:         String,
    pub path:         String,
    #[serde(default)]
    pub download_url: Option<String,>,
}

impl ContentEntry
{
    pub fn is_file(&self,) -> bool
    {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self,) -> bool
    {
        self.kind == EntryKind::Dir
    }
}

/// Read access to repository contents.
///
/// Implementations absorb every failure: a probe that cannot be answered is
/// reported as absent (`None`) or as an empty listing.
#[async_trait]
pub trait ContentSource: Send + Sync
{
    /// Bytes of the file at `path`, or `None` when it is missing, not a file,
    /// or cannot be downloaded.
    async fn fetch_file(&self, owner: &str, repo: &str, path: &str,) -> Option<Vec<u8,>,>;

    /// Entries of the directory at `path` (`""` for the root), or an empty list
    /// when it is missing or not a directory.
    async fn list_directory(&self, owner: &str, repo: &str, path: &str,) -> Vec<ContentEntry,>;
}

/// Logo located inside a repository.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct LocatedLogo
{
    /// Repository-relative path of the image.
    pub path:      String,
    /// Raw image bytes.
    pub bytes:     Vec<u8,>,
    /// Lowercase extension, one of the allowed image extensions.
    pub extension: String,
}

/// Logo locator parameterized by its lookup tables and content source.
pub struct LogoLocator<S,>
{
    source: S,
    tables: LocatorTables,
}

impl<S: ContentSource,> LogoLocator<S,>
{
    pub fn new(source: S, tables: LocatorTables,) -> Self
    {
        Self {
            source,
            tables,
        }
    }

    pub fn tables(&self,) -> &LocatorTables
    {
        &self.tables
    }

    /// Finds a logo for `owner/repo`.
    ///
    /// Returns `None` only after every candidate path and the directory walk
    /// have come up empty, or when the file selected by the walk cannot be
    /// fetched.
    pub async fn locate(&self, owner: &str, repo: &str,) -> Option<LocatedLogo,>
    {
        if let Some(logo,) = self.probe_candidates(owner, repo,).await {
            info!("Found {} in {}/{}", logo.path, owner, repo);
            return Some(logo,);
        }

        let images = self.list_images(owner, repo,).await;
        let selected = select_image(&images,)?;
        debug!("Selected {} among {} listed images in {}/{}", selected, images.len(), owner, repo);

        let extension = self.tables.image_extension(selected,)?;
        let bytes = self.source.fetch_file(owner, repo, selected,).await?;
        info!("Found {} in {}/{} by listing", selected, owner, repo);

        Some(LocatedLogo {
            path: selected.to_owned(),
            bytes,
            extension,
        },)
    }

    async fn probe_candidates(&self, owner: &str, repo: &str,) -> Option<LocatedLogo,>
    {
        for path in &self.tables.candidate_paths {
            let Some(extension,) = self.tables.image_extension(path,) else {
                continue;
            };

            if let Some(bytes,) = self.source.fetch_file(owner, repo, path,).await {
                return Some(LocatedLogo {
                    path: path.clone(),
                    bytes,
                    extension,
                },);
            }
        }

        None
    }

    /// Lists image paths in traversal order: the files of a directory first,
    /// then its asset-like subdirectories depth-first in listing order.
    async fn list_images(&self, owner: &str, repo: &str,) -> Vec<String,>
    {
        let mut images = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(directory,) = pending.pop() {
            let entries = self.source.list_directory(owner, repo, &directory,).await;
            let mut subdirectories = Vec::new();

            for entry in entries {
                if entry.is_file() {
                    if self.tables.image_extension(&entry.name,).is_some() {
                        images.push(entry.path,);
                    }
                } else if entry.is_dir() && self.tables.is_asset_directory(&entry.name,) {
                    subdirectories.push(entry.path,);
                }
            }

            pending.extend(subdirectories.into_iter().rev(),);
        }

        images
    }
}

/// First path whose file name contains "logo" or "icon", else the first path.
fn select_image(images: &[String],) -> Option<&str,>
{
    images
        .iter()
        .find(|path| {
            let name = path.rsplit('/',).next().unwrap_or(path.as_str(),).to_ascii_lowercase();
            name.contains("logo",) || name.contains("icon",)
        },)
        .or_else(|| images.first(),)
        .map(String::as_str,)
}

#[cfg(test)]
pub(crate) mod tests
{
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::*;

    /// In-memory repository tree recording every probe.
    #[derive(Default, Clone,)]
    pub(crate) struct MemorySource
    {
        files:       HashMap<String, Vec<u8,>,>,
        directories: HashMap<String, Vec<ContentEntry,>,>,
        broken:      Vec<String,>,
        pub calls:   Arc<Mutex<Vec<String,>,>,>,
    }

    impl MemorySource
    {
        fn key(owner: &str, repo: &str, path: &str,) -> String
        {
            format!("{owner}/{repo}:{path}")
        }

        pub(crate) fn with_file(mut self, owner: &str, repo: &str, path: &str, bytes: &[u8],) -> Self
        {
            self.files.insert(Self::key(owner, repo, path,), bytes.to_vec(),);
            self
        }

        /// Lists a file that cannot be downloaded.
        pub(crate) fn with_broken_file(mut self, owner: &str, repo: &str, path: &str,) -> Self
        {
            self.broken.push(Self::key(owner, repo, path,),);
            self
        }

        pub(crate) fn with_listing(
            mut self,
            owner: &str,
            repo: &str,
            path: &str,
            entries: &[(&str, EntryKind,)],
        ) -> Self
        {
            let listing = entries
                .iter()
                .map(|(name, kind,)| ContentEntry {
                    kind:         *kind,
                    name:         (*name).to_owned(),
                    path:         if path.is_empty() {
                        (*name).to_owned()
                    } else {
                        format!("{path}/{name}")
                    },
                    download_url: None,
                },)
                .collect();
            self.directories.insert(Self::key(owner, repo, path,), listing,);
            self
        }

        pub(crate) fn fetched(&self,) -> Vec<String,>
        {
            self.calls
                .lock()
                .expect("poisoned",)
                .iter()
                .filter_map(|call| call.strip_prefix("fetch ",).map(str::to_owned,),)
                .collect()
        }

        pub(crate) fn listed(&self,) -> Vec<String,>
        {
            self.calls
                .lock()
                .expect("poisoned",)
                .iter()
                .filter_map(|call| call.strip_prefix("list ",).map(str::to_owned,),)
                .collect()
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource
    {
        async fn fetch_file(&self, owner: &str, repo: &str, path: &str,) -> Option<Vec<u8,>,>
        {
            self.calls.lock().expect("poisoned",).push(format!("fetch {path}"),);
            let key = Self::key(owner, repo, path,);
            if self.broken.contains(&key,) {
                return None;
            }
            self.files.get(&key,).cloned()
        }

        async fn list_directory(&self, owner: &str, repo: &str, path: &str,) -> Vec<ContentEntry,>
        {
            self.calls.lock().expect("poisoned",).push(format!("list {path}"),);
            self.directories.get(&Self::key(owner, repo, path,),).cloned().unwrap_or_default()
        }
    }

    fn locator(source: MemorySource,) -> LogoLocator<MemorySource,>
    {
        LogoLocator::new(source, LocatorTables::default(),)
    }

    #[tokio::test]
    async fn returns_root_svg_from_candidate_table()
    {
        let source = MemorySource::default()
            .with_file("acme", "widget", "logo.svg", b"<svg/>",)
            .with_listing("acme", "widget", "", &[("logo.svg", EntryKind::File,)],);

        let logo = locator(source.clone(),).locate("acme", "widget",).await.expect("logo",);

        assert_eq!(logo.bytes, b"<svg/>");
        assert_eq!(logo.extension, "svg");
        assert_eq!(source.fetched(), vec!["logo.svg".to_owned()]);
        assert!(source.listed().is_empty());
    }

    #[tokio::test]
    async fn finds_icon_in_assets_directory_by_listing()
    {
        let source = MemorySource::default()
            .with_listing(
                "acme",
                "gadget",
                "",
                &[("README.md", EntryKind::File,), ("assets", EntryKind::Dir,)],
            )
            .with_listing("acme", "gadget", "assets", &[("icon.png", EntryKind::File,)],)
            .with_file("acme", "gadget", "assets/icon.png", b"\x89PNG",);

        let tables = LocatorTables {
            candidate_paths: vec!["logo.svg".to_owned(), "logo.png".to_owned()],
            ..LocatorTables::default()
        };
        let logo = LogoLocator::new(source.clone(), tables,)
            .locate("acme", "gadget",)
            .await
            .expect("logo",);

        assert_eq!(logo.bytes, b"\x89PNG");
        assert_eq!(logo.extension, "png");
        assert_eq!(logo.path, "assets/icon.png");
        assert_eq!(source.listed(), vec!["".to_owned(), "assets".to_owned()]);
    }

    #[tokio::test]
    async fn stops_probing_after_first_hit()
    {
        let source = MemorySource::default()
            .with_file("o", "r", "assets/logo.svg", b"a",)
            .with_file("o", "r", "assets/logo.png", b"b",);

        let logo = locator(source.clone(),).locate("o", "r",).await.expect("logo",);

        assert_eq!(logo.path, "assets/logo.svg");
        let expected: Vec<String,> =
            LocatorTables::default().candidate_paths.iter().take(5,).cloned().collect();
        assert_eq!(source.fetched(), expected);
    }

    #[tokio::test]
    async fn skips_candidates_with_disallowed_extensions()
    {
        let source = MemorySource::default()
            .with_file("o", "r", "logo.txt", b"text",)
            .with_file("o", "r", "logo.gif", b"gif",);
        let tables = LocatorTables {
            candidate_paths: vec!["logo.txt".to_owned(), "logo.gif".to_owned()],
            ..LocatorTables::default()
        };

        let logo = LogoLocator::new(source.clone(), tables,).locate("o", "r",).await.expect("logo",);

        assert_eq!(logo.extension, "gif");
        assert_eq!(source.fetched(), vec!["logo.gif".to_owned()]);
    }

    #[tokio::test]
    async fn prefers_logo_named_file_over_earlier_images()
    {
        let source = MemorySource::default()
            .with_listing(
                "o",
                "r",
                "",
                &[("screenshot.png", EntryKind::File,), ("docs", EntryKind::Dir,)],
            )
            .with_listing("o", "r", "docs", &[("Project-Logo.JPG", EntryKind::File,)],)
            .with_file("o", "r", "docs/Project-Logo.JPG", b"jpg",);

        let logo = locator(source,).locate("o", "r",).await.expect("logo",);

        assert_eq!(logo.path, "docs/Project-Logo.JPG");
        assert_eq!(logo.extension, "jpg");
    }

    #[tokio::test]
    async fn falls_back_to_first_listed_image()
    {
        let source = MemorySource::default()
            .with_listing(
                "o",
                "r",
                "",
                &[("images", EntryKind::Dir,), ("banner.gif", EntryKind::File,)],
            )
            .with_listing("o", "r", "images", &[("screenshot.png", EntryKind::File,)],)
            .with_file("o", "r", "banner.gif", b"gif",)
            .with_file("o", "r", "images/screenshot.png", b"png",);

        let logo = locator(source,).locate("o", "r",).await.expect("logo",);

        assert_eq!(logo.path, "banner.gif");
    }

    #[tokio::test]
    async fn descends_only_into_allowed_directories()
    {
        let source = MemorySource::default()
            .with_listing(
                "o",
                "r",
                "",
                &[
                    ("src", EntryKind::Dir,),
                    ("Design", EntryKind::Dir,),
                    ("node_modules", EntryKind::Dir,),
                ],
            )
            .with_listing("o", "r", "Design", &[("img", EntryKind::Dir,)],)
            .with_listing("o", "r", "Design/img", &[("mark.svg", EntryKind::File,)],)
            .with_file("o", "r", "Design/img/mark.svg", b"<svg/>",);

        let logo = locator(source.clone(),).locate("o", "r",).await.expect("logo",);

        assert_eq!(logo.path, "Design/img/mark.svg");
        assert_eq!(
            source.listed(),
            vec!["".to_owned(), "Design".to_owned(), "Design/img".to_owned()]
        );
    }

    #[tokio::test]
    async fn root_files_precede_subdirectory_results()
    {
        let source = MemorySource::default()
            .with_listing(
                "o",
                "r",
                "",
                &[("assets", EntryKind::Dir,), ("a.png", EntryKind::File,)],
            )
            .with_listing("o", "r", "assets", &[("b.png", EntryKind::File,)],);

        let images = locator(source,).list_images("o", "r",).await;

        assert_eq!(images, vec!["a.png".to_owned(), "assets/b.png".to_owned()]);
    }

    #[tokio::test]
    async fn failed_download_of_selected_file_yields_absence()
    {
        let source = MemorySource::default()
            .with_listing(
                "o",
                "r",
                "",
                &[("logo.webp.png", EntryKind::File,), ("icon.png", EntryKind::File,)],
            )
            .with_broken_file("o", "r", "logo.webp.png",)
            .with_file("o", "r", "icon.png", b"png",);
        let tables = LocatorTables {
            candidate_paths: Vec::new(),
            ..LocatorTables::default()
        };

        let located = LogoLocator::new(source.clone(), tables,).locate("o", "r",).await;

        assert!(located.is_none());
        assert_eq!(source.fetched(), vec!["logo.webp.png".to_owned()]);
    }

    #[tokio::test]
    async fn empty_repository_yields_absence()
    {
        let source = MemorySource::default();
        assert!(locator(source,).locate("o", "empty",).await.is_none());
    }

    #[test]
    fn content_entries_decode_github_listing()
    {
        let json = r#"[
            {"type":"file","name":"logo.svg","path":"logo.svg","download_url":"https://raw.example/logo.svg","sha":"x"},
            {"type":"dir","name":"assets","path":"assets","download_url":null},
            {"type":"submodule","name":"vendor","path":"vendor"}
        ]"#;
        let entries: Vec<ContentEntry,> = serde_json::from_str(json,).expect("valid listing",);

        assert!(entries[0].is_file());
        assert!(entries[1].is_dir());
        assert_eq!(entries[2].kind, EntryKind::Other);
        assert_eq!(entries[0].download_url.as_deref(), Some("https://raw.example/logo.svg"));
    }
}
