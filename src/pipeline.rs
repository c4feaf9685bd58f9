// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Stage drivers wiring the components to the dataset layout.
///
/// Every stage reads the state files of the previous one and writes its own,
/// so stages can run separately from the CLI or back to back through
/// [`run_all`].
use std::path::Path;

use octocrab::Octocrab;
use tracing::{info, warn};

use crate::{
    config::{PipelineConfig, RasterizeSettings, millis},
    error::Error,
    fetcher::download_logos,
    filter::{FilterSummary, filter_logos},
    github::GitHubContents,
    icons::{IconSummary, collect_icons},
    locator::{ContentSource, LogoLocator},
    merge::{MergeOutcome, merge_files},
    rasterize::batch_rasterize,
    record::RepositoryRecord,
    starred::fetch_starred,
    store,
    trending::fetch_all_trending,
};

/// Lists the most-starred repositories into the starred list file.
///
/// # Errors
///
/// Returns [`Error`] when the list cannot be written.
pub async fn run_starred(client: &Octocrab, config: &PipelineConfig,) -> Result<usize, Error,>
{
    let repositories = fetch_starred(client, &config.starred,).await;
    store::save_records(&config.dataset.starred_path(), &repositories,)?;
    info!("Saved {} repos to {}", repositories.len(), config.dataset.starred_path().display());
    Ok(repositories.len(),)
}

/// Lists the trending repositories into the trending list file.
///
/// # Errors
///
/// Returns [`Error`] when the list cannot be written.
pub async fn run_trending(client: &Octocrab, config: &PipelineConfig,) -> Result<usize, Error,>
{
    let repositories = fetch_all_trending(client, &config.trending,).await;
    store::save_records(&config.dataset.trending_path(), &repositories,)?;
    info!("Saved {} repos to {}", repositories.len(), config.dataset.trending_path().display());
    Ok(repositories.len(),)
}

/// Merges the starred and trending lists into the merged list file.
///
/// # Errors
///
/// Returns [`Error`] when a present list cannot be read or the merged list
/// cannot be written.
pub fn run_merge(config: &PipelineConfig,) -> Result<MergeOutcome, Error,>
{
    let layout = &config.dataset;
    merge_files(&layout.starred_path(), &layout.trending_path(), &layout.merged_path(),)
}

/// Downloads logos for the merged list through the GitHub contents API.
///
/// # Errors
///
/// See [`run_download_with`].
pub async fn run_download(client: &Octocrab, config: &PipelineConfig,) -> Result<usize, Error,>
{
    run_download_with(GitHubContents::new(client.clone(),), config,).await
}

/// Downloads logos for the merged list from `source` and writes the
/// post-download metadata file.
///
/// # Errors
///
/// Returns [`Error`] when the merged list cannot be read or the metadata
/// cannot be written.
pub async fn run_download_with<S: ContentSource,>(
    source: S,
    config: &PipelineConfig,
) -> Result<usize, Error,>
{
    let layout = &config.dataset;
    let repositories: Vec<RepositoryRecord,> = store::load_records(&layout.merged_path(),)?;
    let locator = LogoLocator::new(source, config.locator.clone(),);

    let stored = download_logos(
        &locator,
        &repositories,
        &layout.raw_dir(),
        millis(config.download.delay_ms,),
    )
    .await;

    store::save_records(&layout.metadata_path(), &stored,)?;
    info!("Downloaded {} logos", stored.len());
    Ok(stored.len(),)
}

/// Filters the downloaded logos into the filtered directory.
///
/// # Errors
///
/// See [`filter_logos`].
pub fn run_filter(config: &PipelineConfig,) -> Result<FilterSummary, Error,>
{
    let layout = &config.dataset;
    filter_logos(
        &layout.metadata_path(),
        &layout.filtered_dir(),
        &layout.filtered_metadata_path(),
        &layout.analysis_path(),
        &config.filter,
    )
}

/// Collects the Simple Icons dataset.
///
/// # Errors
///
/// See [`collect_icons`].
pub async fn run_icons(client: &Octocrab, config: &PipelineConfig,) -> Result<IconSummary, Error,>
{
    collect_icons(client, &config.icons, &config.dataset,).await
}

/// Rasterizes every SVG of `input` into `output`.
///
/// # Errors
///
/// Returns [`Error`] when the input directory cannot be listed.
pub async fn run_rasterize(
    input: &Path,
    output: &Path,
    settings: &RasterizeSettings,
) -> Result<usize, Error,>
{
    batch_rasterize(input, output, settings.size, settings.backend,).await
}

/// Outcome of one step of [`run_all`].
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct StepReport
{
    pub step:      &'static str,
    pub succeeded: bool,
    pub summary:   String,
}

fn report(step: &'static str, outcome: Result<String, Error,>,) -> StepReport
{
    match outcome {
        Ok(summary,) => {
            info!("[{}] {}", step, summary);
            StepReport {
                step, succeeded: true, summary,
            }
        }
        Err(error,) => {
            let summary = error.to_display_string();
            warn!("[{}] failed: {}", step, summary);
            StepReport {
                step, succeeded: false, summary,
            }
        }
    }
}

/// Runs starred, trending, merge with download, then filter.
///
/// A failing step is reported and the next step still runs on whatever state
/// files exist.
pub async fn run_all(client: &Octocrab, config: &PipelineConfig,) -> Vec<StepReport,>
{
    let mut reports = Vec::with_capacity(4,);

    info!("[Step 1/4] Fetching most-starred repositories");
    let starred = run_starred(client, config,).await;
    reports.push(report("starred", starred.map(|count| format!("{count} starred repos"),),),);

    info!("[Step 2/4] Fetching trending repositories");
    let trending = run_trending(client, config,).await;
    reports.push(report("trending", trending.map(|count| format!("{count} trending repos"),),),);

    info!("[Step 3/4] Downloading logos");
    let download = match run_merge(config,) {
        Ok(_,) => run_download(client, config,).await,
        Err(error,) => Err(error,),
    };
    reports.push(report("download", download.map(|count| format!("{count} logos"),),),);

    info!("[Step 4/4] Filtering minimal logos");
    let filter = run_filter(config,);
    reports.push(report(
        "filter",
        filter.map(|summary| format!("{} minimal logos", summary.passed),),
    ),);

    reports
}
