//! Configuration document describing every tunable of the pipeline.
//!
//! The types in this module mirror the structure of the optional YAML file
//! accepted by the CLI through `--config`. Every section and every key is
//! optional: omitted values fall back to the defaults documented on each
//! field, so an empty document is equivalent to [`PipelineConfig::default`].
//! The configuration is built once at startup and passed explicitly into the
//! stages; nothing mutates it afterwards.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// Candidate logo paths probed directly, in priority order.
const DEFAULT_CANDIDATE_PATHS: &[&str] = &[
    "logo.svg",
    "icon.svg",
    "logo.png",
    "icon.png",
    "assets/logo.svg",
    "assets/icon.svg",
    "assets/logo.png",
    "assets/icon.png",
    "docs/logo.svg",
    "docs/icon.svg",
    "docs/logo.png",
    "docs/icon.png",
    "images/logo.svg",
    "images/icon.svg",
    "images/logo.png",
    "images/icon.png",
    "static/logo.svg",
    "static/icon.svg",
    "static/logo.png",
    "static/icon.png",
    "public/logo.svg",
    "public/icon.svg",
    "public/logo.png",
    "public/icon.png",
    "src/logo.svg",
    "src/icon.svg",
    "app/logo.svg",
    "app/icon.svg",
    "brand/logo.svg",
    "brand/icon.svg",
    "media/logo.svg",
    "media/icon.svg",
    "resources/logo.svg",
    "resources/icon.svg",
];

/// Directory names the recursive listing is allowed to descend into.
const DEFAULT_ASSET_DIRECTORIES: &[&str] = &[
    "assets",
    "images",
    "static",
    "public",
    "docs",
    "media",
    "brand",
    "resources",
    "art",
    "design",
    "img",
];

/// File extensions accepted as logo images.
const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["png", "svg", "jpg", "jpeg", "gif"];

const DEFAULT_TRENDING_LANGUAGES: &[&str] =
    &["", "python", "javascript", "typescript", "go", "rust", "java"];

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use minlogo::PipelineConfig;
///
/// let yaml = r#"
/// filter:
///   max_colors: 6
/// starred:
///   limit: 200
/// "#;
/// let config: PipelineConfig = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.filter.max_colors, 6);
/// assert_eq!(config.starred.limit, 200);
/// assert_eq!(config.filter.min_size, (64, 64));
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig
{
    /// Location of the persisted state files and image directories.
    pub dataset:   DatasetLayout,
    /// Parameters of the most-starred search lister.
    pub starred:   StarredSettings,
    /// Parameters of the trending page lister.
    pub trending:  TrendingSettings,
    /// Parameters of the logo download stage.
    pub download:  DownloadSettings,
    /// Thresholds of the minimal-style filter.
    pub filter:    FilterSettings,
    /// Parameters of the vector rasterizer.
    pub rasterize: RasterizeSettings,
    /// Parameters of the Simple Icons collector.
    pub icons:     IconSettings,
    /// Static lookup tables used by the logo locator.
    pub locator:   LocatorTables,
}

/// Layout of the dataset directory.
///
/// Only the root is configurable; the file names below it are fixed so that
/// subsequent runs find the state written by previous ones.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetLayout
{
    /// Root directory of all pipeline outputs (default: `dataset`).
    pub root: PathBuf,
}

impl Default for DatasetLayout
{
    fn default() -> Self
    {
        Self {
            root: PathBuf::from("dataset",),
        }
    }
}

impl DatasetLayout
{
    /// Most-starred repositories list.
    pub fn starred_path(&self,) -> PathBuf
    {
        self.root.join("starred_repos.json",)
    }

    /// Trending repositories list.
    pub fn trending_path(&self,) -> PathBuf
    {
        self.root.join("trending_repos.json",)
    }

    /// Merged, deduplicated repositories list.
    pub fn merged_path(&self,) -> PathBuf
    {
        self.root.join("all_repos.json",)
    }

    /// Repositories with a downloaded logo.
    pub fn metadata_path(&self,) -> PathBuf
    {
        self.root.join("metadata.json",)
    }

    /// Repositories whose logo passed the minimal-style filter.
    pub fn filtered_metadata_path(&self,) -> PathBuf
    {
        self.root.join("filtered_metadata.json",)
    }

    /// Filter diagnostics for every evaluated image.
    pub fn analysis_path(&self,) -> PathBuf
    {
        self.root.join("analysis_results.json",)
    }

    /// Simple Icons metadata.
    pub fn icons_metadata_path(&self,) -> PathBuf
    {
        self.root.join("simple_icons_metadata.json",)
    }

    /// Downloaded logos.
    pub fn raw_dir(&self,) -> PathBuf
    {
        self.root.join("raw",)
    }

    /// Logos accepted by the filter.
    pub fn filtered_dir(&self,) -> PathBuf
    {
        self.root.join("filtered",)
    }

    /// Simple Icons SVGs, rasterized PNGs and captions.
    pub fn icons_dir(&self,) -> PathBuf
    {
        self.root.join("simple_icons",)
    }
}

/// Parameters of the repository search lister.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct StarredSettings
{
    /// Maximum number of repositories to collect (default: 1000).
    pub limit:          usize,
    /// Page size, constrained to `1..=100` by the search API (default: 100).
    #[serde(deserialize_with = "deserialize_per_page")]
    pub per_page:       u8,
    /// Search query (default: `stars:>1000`).
    pub query:          String,
    /// Delay after every successful page in milliseconds (default: 2000).
    pub page_delay_ms:  u64,
    /// Delay after a failed page in milliseconds (default: 5000).
    pub error_delay_ms: u64,
}

impl Default for StarredSettings
{
    fn default() -> Self
    {
        Self {
            limit:          1000,
            per_page:       100,
            query:          "stars:>1000".to_owned(),
            page_delay_ms:  2000,
            error_delay_ms: 5000,
        }
    }
}

/// Time window of a trending listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum TrendingPeriod
{
    Daily,
    Weekly,
    Monthly,
}

impl TrendingPeriod
{
    /// Value of the `since` query parameter.
    pub fn as_str(self,) -> &'static str
    {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Parameters of the trending lister.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct TrendingSettings
{
    /// Languages to list; an empty string means all languages.
    pub languages: Vec<String,>,
    /// Periods to list for every language (default: daily, weekly).
    pub periods:   Vec<TrendingPeriod,>,
    /// Delay between listings in milliseconds (default: 1000).
    pub delay_ms:  u64,
}

impl Default for TrendingSettings
{
    fn default() -> Self
    {
        Self {
            languages: DEFAULT_TRENDING_LANGUAGES.iter().map(|lang| (*lang).to_owned(),).collect(),
            periods:   vec![TrendingPeriod::Daily, TrendingPeriod::Weekly],
            delay_ms:  1000,
        }
    }
}

/// Parameters of the logo download stage.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSettings
{
    /// Delay between repositories in milliseconds (default: 1000).
    pub delay_ms: u64,
}

impl Default for DownloadSettings
{
    fn default() -> Self
    {
        Self {
            delay_ms: 1000,
        }
    }
}

/// Thresholds of the minimal-style filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings
{
    /// Maximum number of distinct colors of an accepted image (default: 10).
    pub max_colors:         u32,
    /// Minimum accepted `(width, height)` (default: 64x64).
    pub min_size:           (u32, u32,),
    /// Maximum accepted `(width, height)` (default: 2048x2048).
    pub max_size:           (u32, u32,),
    /// Number of distinct colors counted before giving up (default: 256).
    pub analysis_cap:       u32,
    /// Bounding box of the color-count thumbnail (default: 100).
    pub count_thumbnail:    u32,
    /// Bounding box of the dominant-color thumbnail (default: 150).
    pub dominant_thumbnail: u32,
    /// Number of dominant colors reported (default: 5).
    pub dominant_colors:    usize,
}

impl Default for FilterSettings
{
    fn default() -> Self
    {
        Self {
            max_colors:         10,
            min_size:           (64, 64,),
            max_size:           (2048, 2048,),
            analysis_cap:       256,
            count_thumbnail:    100,
            dominant_thumbnail: 150,
            dominant_colors:    5,
        }
    }
}

/// Backend selection for the vector rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,)]
#[serde(rename_all = "snake_case")]
pub enum RasterBackend
{
    /// First available backend, in-process renderer first.
    #[default]
    Auto,
    /// In-process renderer.
    Resvg,
    /// `inkscape` command-line tool.
    Inkscape,
    /// ImageMagick `convert` command-line tool.
    Imagemagick,
}

/// Parameters of the vector rasterizer.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct RasterizeSettings
{
    /// Output width and height in pixels (default: 512).
    pub size:    u32,
    /// Backend selection (default: auto).
    pub backend: RasterBackend,
}

impl Default for RasterizeSettings
{
    fn default() -> Self
    {
        Self {
            size: 512, backend: RasterBackend::Auto,
        }
    }
}

/// Parameters of the Simple Icons collector.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct IconSettings
{
    /// Maximum number of icons to download; `0` downloads all (default: 500).
    pub limit:        usize,
    /// Delay between downloads in milliseconds (default: 100).
    pub delay_ms:     u64,
    /// Metadata document listing every icon.
    pub metadata_url: String,
    /// Base URL of the icon SVG files.
    pub icons_url:    String,
}

impl Default for IconSettings
{
    fn default() -> Self
    {
        Self {
            limit:        500,
            delay_ms:     100,
            metadata_url: "https://raw.githubusercontent.com/simple-icons/simple-icons/develop/data/simple-icons.json"
                .to_owned(),
            icons_url:    "https://raw.githubusercontent.com/simple-icons/simple-icons/develop/icons"
                .to_owned(),
        }
    }
}

/// Static lookup tables injected into the logo locator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorTables
{
    /// Relative paths probed directly, earlier entries preferred.
    pub candidate_paths:   Vec<String,>,
    /// Lowercase directory names the recursive listing descends into.
    pub asset_directories: Vec<String,>,
    /// Lowercase image extensions, without the leading dot.
    pub image_extensions:  Vec<String,>,
}

impl Default for LocatorTables
{
    fn default() -> Self
    {
        Self {
            candidate_paths:   to_owned_list(DEFAULT_CANDIDATE_PATHS,),
            asset_directories: to_owned_list(DEFAULT_ASSET_DIRECTORIES,),
            image_extensions:  to_owned_list(DEFAULT_IMAGE_EXTENSIONS,),
        }
    }
}

impl LocatorTables
{
    /// Lowercased extension of `path` when it belongs to the allowed set.
    ///
    /// # Examples
    ///
    /// ```
    /// use minlogo::LocatorTables;
    ///
    /// let tables = LocatorTables::default();
    /// assert_eq!(tables.image_extension("docs/Logo.SVG").as_deref(), Some("svg"));
    /// assert!(tables.image_extension("README.md").is_none());
    /// ```
    pub fn image_extension(&self, path: &str,) -> Option<String,>
    {
        let file_name = path.rsplit('/',).next().unwrap_or(path,);
        let (_, extension,) = file_name.rsplit_once('.',)?;
        let extension = extension.to_ascii_lowercase();
        self.image_extensions.iter().any(|allowed| *allowed == extension,).then_some(extension,)
    }

    /// Whether the recursive listing may descend into a directory named `name`.
    pub fn is_asset_directory(&self, name: &str,) -> bool
    {
        let lowered = name.to_ascii_lowercase();
        self.asset_directories.iter().any(|allowed| *allowed == lowered,)
    }
}

fn to_owned_list(values: &[&str],) -> Vec<String,>
{
    values.iter().map(|value| (*value).to_owned(),).collect()
}

/// Converts a millisecond setting into a [`Duration`].
pub fn millis(value: u64,) -> Duration
{
    Duration::from_millis(value,)
}

/// Loads the configuration from an optional YAML file.
///
/// Without a path the defaults are returned.
///
/// # Errors
///
/// Returns [`Error::Io`](Error::Io) when the file cannot be read,
/// [`Error::Parse`](Error::Parse) when it is not valid YAML for this document
/// and [`Error::Validation`](Error::Validation) when values contradict each
/// other.
pub fn load_config(path: Option<&Path,>,) -> Result<PipelineConfig, Error,>
{
    match path {
        Some(path,) => {
            let contents =
                fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
            parse_config(&contents,)
        }
        None => Ok(PipelineConfig::default(),),
    }
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// See [`load_config`].
pub fn parse_config(contents: &str,) -> Result<PipelineConfig, Error,>
{
    let config: PipelineConfig = if contents.trim().is_empty() {
        PipelineConfig::default()
    } else {
        serde_yaml::from_str(contents,)?
    };
    validate(&config,)?;
    Ok(config,)
}

fn validate(config: &PipelineConfig,) -> Result<(), Error,>
{
    let filter = &config.filter;
    if filter.min_size.0 > filter.max_size.0 || filter.min_size.1 > filter.max_size.1 {
        return Err(Error::validation("filter.min_size must not exceed filter.max_size",),);
    }
    if filter.analysis_cap == 0 || filter.count_thumbnail == 0 || filter.dominant_thumbnail == 0 {
        return Err(Error::validation(
            "filter.analysis_cap and thumbnail bounds must be positive",
        ),);
    }
    if config.rasterize.size == 0 {
        return Err(Error::validation("rasterize.size must be positive",),);
    }
    if config.locator.image_extensions.is_empty() {
        return Err(Error::validation("locator.image_extensions cannot be empty",),);
    }
    Ok((),)
}

fn deserialize_per_page<'de, D,>(deserializer: D,) -> Result<u8, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = u8::deserialize(deserializer,)?;
    if value == 0 || value > 100 {
        return Err(serde::de::Error::custom("starred.per_page must be between 1 and 100",),);
    }
    Ok(value,)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn empty_document_yields_defaults()
    {
        let config = parse_config("",).expect("empty configuration is valid",);

        assert_eq!(config.dataset.root, PathBuf::from("dataset"));
        assert_eq!(config.filter, FilterSettings::default());
        assert_eq!(config.rasterize.size, 512);
        assert_eq!(config.rasterize.backend, RasterBackend::Auto);
        assert_eq!(config.trending.languages.len(), 7);
        assert_eq!(config.locator, LocatorTables::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults()
    {
        let yaml = r"
dataset:
  root: out
filter:
  max_colors: 4
  min_size: [16, 16]
rasterize:
  backend: inkscape
";
        let config = parse_config(yaml,).expect("valid configuration",);

        assert_eq!(config.dataset.metadata_path(), PathBuf::from("out/metadata.json"));
        assert_eq!(config.filter.max_colors, 4);
        assert_eq!(config.filter.min_size, (16, 16));
        assert_eq!(config.filter.max_size, (2048, 2048));
        assert_eq!(config.rasterize.backend, RasterBackend::Inkscape);
        assert_eq!(config.download.delay_ms, 1000);
    }

    #[test]
    fn rejects_unknown_keys()
    {
        let error = parse_config("filter:\n  max_colours: 3\n",).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn rejects_out_of_range_per_page()
    {
        let error = parse_config("starred:\n  per_page: 250\n",).unwrap_err();
        assert!(error.to_string().contains("per_page must be between 1 and 100"));
    }

    #[test]
    fn rejects_inverted_size_bounds()
    {
        let yaml = "filter:\n  min_size: [512, 512]\n  max_size: [256, 256]\n";
        let error = parse_config(yaml,).unwrap_err();
        match error {
            Error::Validation {
                message,
            } => assert_eq!(message, "filter.min_size must not exceed filter.max_size"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn load_config_reports_missing_file()
    {
        let error = load_config(Some(Path::new("/nonexistent/minlogo.yaml",),),).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
    }

    #[test]
    fn candidate_paths_prefer_svg_and_root()
    {
        let tables = LocatorTables::default();
        assert_eq!(tables.candidate_paths[0], "logo.svg");
        assert_eq!(tables.candidate_paths[2], "logo.png");
        assert!(tables.candidate_paths.iter().all(|path| tables.image_extension(path).is_some()));
    }

    #[test]
    fn asset_directory_match_is_case_insensitive()
    {
        let tables = LocatorTables::default();
        assert!(tables.is_asset_directory("Assets"));
        assert!(tables.is_asset_directory("img"));
        assert!(!tables.is_asset_directory("src"));
    }

    #[test]
    fn image_extension_requires_a_dot()
    {
        let tables = LocatorTables::default();
        assert!(tables.image_extension("png").is_none());
        assert!(tables.image_extension("assets.d/logo").is_none());
        assert_eq!(tables.image_extension("a/b/Photo.JPeG").as_deref(), Some("jpeg"));
    }
}
