// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Secondary icon dataset built from the Simple Icons project.
//!
//! The collector reads the Simple Icons metadata document, downloads one SVG
//! per icon into the icon directory and writes a caption file next to every
//! downloaded SVG. Captions hold three prompt variants, one per line, and are
//! also gathered into a combined `annotations.json`.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration
};

use async_trait::async_trait;
use masterror::AppError;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::{DatasetLayout, IconSettings, millis},
    error::{self, Error},
    fetcher::save_logo,
    github,
    progress::batch_bar,
    slug::slug_or_title,
    store
};

const ANNOTATIONS_FILE: &str = "annotations.json";

/// One icon of the Simple Icons catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRecord {
    pub title:      String,
    pub slug:       String,
    #[serde(default)]
    pub hex:        String,
    #[serde(default)]
    pub source:     String,
    #[serde(default)]
    pub guidelines: String,
    #[serde(default = "empty_object")]
    pub license:    Value,
    /// Downloaded SVG, once stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path:       Option<PathBuf>
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Caption entry of `annotations.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconAnnotation {
    pub slug:    String,
    pub title:   String,
    pub prompts: Vec<String>
}

#[derive(Debug, Deserialize)]
struct RawIcon {
    #[serde(default)]
    title:      String,
    #[serde(default)]
    slug:       Option<String>,
    #[serde(default)]
    hex:        Option<String>,
    #[serde(default)]
    source:     Option<String>,
    #[serde(default)]
    guidelines: Option<String>,
    #[serde(default)]
    license:    Option<Value>
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetadataDocument {
    List(Vec<RawIcon>),
    Wrapped { icons: Vec<RawIcon> }
}

/// Parses the metadata document, accepting both the bare array layout and
/// the older `{"icons": [...]}` layout.
///
/// Entries without a slug get one derived from their title; entries where
/// neither yields a slug are dropped.
///
/// # Errors
///
/// Returns [`Error::Serialize`] when the document matches neither layout.
pub fn parse_icon_metadata(document: &str) -> Result<Vec<IconRecord>, Error> {
    let raw = match serde_json::from_str::<MetadataDocument>(document)? {
        MetadataDocument::List(icons) | MetadataDocument::Wrapped { icons } => icons
    };

    Ok(raw
        .into_iter()
        .filter_map(|icon| {
            let slug = slug_or_title(icon.slug.as_deref(), &icon.title)?;
            Some(IconRecord {
                slug,
                title: icon.title,
                hex: icon.hex.unwrap_or_default(),
                source: icon.source.unwrap_or_default(),
                guidelines: icon.guidelines.unwrap_or_default(),
                license: icon.license.unwrap_or_else(empty_object),
                path: None
            })
        })
        .collect())
}

/// Source of icon SVG documents.
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Fetches the SVG of `slug`.
    async fn fetch_svg(&self, slug: &str) -> Result<Vec<u8>, AppError>;
}

/// Icons served from a raw-file base URL.
#[derive(Debug, Clone)]
pub struct RemoteIcons {
    client:   Octocrab,
    base_url: String
}

impl RemoteIcons {
    pub fn new(client: Octocrab, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into()
        }
    }
}

#[async_trait]
impl IconSource for RemoteIcons {
    async fn fetch_svg(&self, slug: &str) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/{slug}.svg", self.base_url.trim_end_matches('/'));
        github::fetch_bytes(&self.client, &url).await
    }
}

/// Stores `<slug>.svg` for every icon in `output_dir`.
///
/// Icons whose SVG is already present are kept without a request. Returns the
/// icons that have a stored SVG, with `path` set, in input order.
pub async fn download_icons<S: IconSource>(
    source: &S,
    icons: Vec<IconRecord>,
    output_dir: &Path,
    delay: Duration
) -> Vec<IconRecord> {
    let bar = batch_bar(icons.len(), "Downloading SVGs");
    let mut stored = Vec::with_capacity(icons.len());

    for mut icon in icons {
        bar.inc(1);
        let path = output_dir.join(format!("{}.svg", icon.slug));

        if path.exists() {
            debug!("{} already present", path.display());
            icon.path = Some(path);
            stored.push(icon);
            continue;
        }

        match source.fetch_svg(&icon.slug).await {
            Ok(bytes) => {
                if save_logo(&bytes, &path) {
                    icon.path = Some(path);
                    stored.push(icon);
                }
            }
            Err(error) => warn!("Error downloading {}: {}", icon.slug, error.render_message())
        }

        sleep(delay).await;
    }

    bar.finish_with_message(format!("{} stored", stored.len()));
    stored
}

/// Prompt variants describing the icon titled `title`.
pub fn caption_prompts(title: &str) -> Vec<String> {
    vec![
        format!(
            "minimalist tech logo of {title}, geometric shape, flat design, single color, vector style, clean lines, software project icon, white background"
        ),
        format!("{title} icon, simple geometric logo, minimal design, monochrome, tech brand identity"),
        format!("flat vector logo for {title}, minimal style, single color icon, clean geometric shape"),
    ]
}

/// Writes `<slug>.txt` for every icon and the combined annotations file.
///
/// # Errors
///
/// Returns [`Error::Write`] when a caption or the annotations file cannot be
/// written.
pub fn write_annotations(
    icons: &[IconRecord],
    output_dir: &Path
) -> Result<Vec<IconAnnotation>, Error> {
    fs::create_dir_all(output_dir).map_err(|source| error::write_error(output_dir, source))?;

    let mut annotations = Vec::with_capacity(icons.len());
    for icon in icons {
        let prompts = caption_prompts(&icon.title);
        let caption_path = output_dir.join(format!("{}.txt", icon.slug));
        fs::write(&caption_path, prompts.join("\n"))
            .map_err(|source| error::write_error(&caption_path, source))?;

        annotations.push(IconAnnotation {
            slug: icon.slug.clone(),
            title: icon.title.clone(),
            prompts
        });
    }

    store::save_records(&output_dir.join(ANNOTATIONS_FILE), &annotations)?;
    info!("Generated annotations for {} icons", annotations.len());
    Ok(annotations)
}

/// Counts reported by [`collect_icons`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSummary {
    pub listed:     usize,
    pub downloaded: usize
}

/// Keeps the first `limit` icons; `0` keeps every icon.
pub fn limit_icons(mut icons: Vec<IconRecord>, limit: usize) -> Vec<IconRecord> {
    if limit > 0 && icons.len() > limit {
        icons.truncate(limit);
        info!("Limited to {} icons", limit);
    }
    icons
}

/// Runs the icon collector end to end.
///
/// # Errors
///
/// Returns [`Error`] when the metadata cannot be fetched or parsed, or when
/// a state file cannot be written.
pub async fn collect_icons(
    client: &Octocrab,
    settings: &IconSettings,
    layout: &DatasetLayout
) -> Result<IconSummary, Error> {
    let document = github::fetch_text(client, &settings.metadata_url).await?;
    let icons = parse_icon_metadata(&document)?;
    info!("Found {} icons", icons.len());

    let source = RemoteIcons::new(client.clone(), settings.icons_url.as_str());
    store_icons(&source, icons, settings, layout).await
}

/// Limits `icons`, saves their metadata, downloads them from `source` and
/// writes the captions.
///
/// # Errors
///
/// Returns [`Error`] when a state file cannot be written.
pub async fn store_icons<S: IconSource>(
    source: &S,
    icons: Vec<IconRecord>,
    settings: &IconSettings,
    layout: &DatasetLayout
) -> Result<IconSummary, Error> {
    let icons = limit_icons(icons, settings.limit);
    store::save_records(&layout.icons_metadata_path(), &icons)?;

    let listed = icons.len();
    let downloaded =
        download_icons(source, icons, &layout.icons_dir(), millis(settings.delay_ms)).await;
    info!("Downloaded {} / {} icons", downloaded.len(), listed);

    write_annotations(&downloaded, &layout.icons_dir())?;

    Ok(IconSummary {
        listed,
        downloaded: downloaded.len()
    })
}
