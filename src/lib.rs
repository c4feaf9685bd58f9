//! Dataset preparation for minimalist software-project logos.
//!
//! The library lists candidate repositories (most-starred search results and
//! trending pages), locates and downloads one logo per repository, filters the
//! logos down to a minimal flat-color subset and rasterizes vector artwork to
//! fixed-size PNG files. A secondary icon dataset with captions is collected
//! from Simple Icons. Every stage persists its result as a JSON state file so
//! stages can be rerun independently; see [`DatasetLayout`] for the file
//! names.

mod config;
mod error;
mod fetcher;
mod filter;
mod github;
mod icons;
mod locator;
mod merge;
mod pipeline;
mod progress;
mod rasterize;
mod record;
mod slug;
mod starred;
mod store;
mod trending;

pub use config::{
    DatasetLayout, DownloadSettings, FilterSettings, IconSettings, LocatorTables, PipelineConfig,
    RasterBackend, RasterizeSettings, StarredSettings, TrendingPeriod, TrendingSettings,
    load_config, parse_config,
};
pub use error::{Error, io_error, write_error};
pub use fetcher::{download_logos, save_logo};
pub use filter::{
    DominantColor, FAILED_COLOR_COUNT, FilterResult, FilterSummary, VECTOR_COLOR_COUNT,
    count_colors, dominant_colors, evaluate_image, filter_logos, is_vector, median_cut,
};
pub use github::{GitHubContents, build_client};
pub use icons::{
    IconAnnotation, IconRecord, IconSource, IconSummary, RemoteIcons, caption_prompts,
    collect_icons, download_icons, limit_icons, parse_icon_metadata, store_icons,
    write_annotations,
};
pub use locator::{ContentEntry, ContentSource, EntryKind, LocatedLogo, LogoLocator};
pub use merge::{MergeOutcome, dedupe_by_full_name, merge_files, merge_repositories};
pub use pipeline::{
    StepReport, run_all, run_download, run_download_with, run_filter, run_icons, run_merge,
    run_rasterize, run_starred, run_trending,
};
pub use rasterize::{
    CONVERSION_TIMEOUT, ImageMagickRasterizer, InkscapeRasterizer, Rasterizer, ResvgRasterizer,
    batch_rasterize, convert_vector, first_available, rasterize_directory, select_rasterizer,
};
pub use record::{RepositoryRecord, RepositorySource};
pub use slug::{SlugStrategy, slug_or_title};
pub use starred::fetch_starred;
pub use store::{load_records, load_records_if_present, save_records};
pub use trending::{fetch_all_trending, fetch_trending, parse_trending_page, trending_url};
