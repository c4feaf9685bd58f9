// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Minimal-style filter for downloaded logos.
//!
//! An image is accepted when it is a vector file, or when it is a raster image
//! within the configured size bounds using no more than the configured number
//! of distinct colors. Accepted raster images additionally carry up to five
//! dominant colors computed by median-cut quantization; those are diagnostic
//! only and never affect the decision.
//!
//! Evaluation never fails: decode and I/O problems become a rejected
//! [`FilterResult`] whose reason carries the error message.

use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf}
};

use image::{DynamicImage, ImageReader, imageops::FilterType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::FilterSettings,
    error::{self, Error},
    progress::batch_bar,
    record::RepositoryRecord,
    store
};

/// `color_count` of a vector image, which is exempt from pixel analysis.
pub const VECTOR_COLOR_COUNT: i64 = -2;
/// `color_count` of an image that could not be analyzed.
pub const FAILED_COLOR_COUNT: i64 = -1;

const VECTOR_EXTENSION: &str = "svg";

/// Quantized color and the number of pixels it represents.
///
/// Serialized as `[pixel_count, [r, g, b]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominantColor(pub u64, pub [u8; 3]);

/// Outcome of evaluating one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Evaluated image.
    pub path:            PathBuf,
    /// Whether the image belongs to the minimal subset.
    pub passed:          bool,
    /// Rejection reasons, in the order they were detected.
    pub reasons:         Vec<String>,
    /// Distinct colors, or one of the sentinels: [`VECTOR_COLOR_COUNT`],
    /// [`FAILED_COLOR_COUNT`], `analysis_cap + 1` for too many colors.
    pub color_count:     i64,
    /// Dominant colors sorted by descending pixel count.
    pub dominant_colors: Vec<DominantColor>,
    /// Image `(width, height)`; `(0, 0)` when unknown.
    pub size:            (u32, u32)
}

impl FilterResult {
    fn pending(path: &Path) -> Self {
        Self {
            path:            path.to_path_buf(),
            passed:          false,
            reasons:         Vec::new(),
            color_count:     0,
            dominant_colors: Vec::new(),
            size:            (0, 0)
        }
    }

    fn reject(mut self, reason: String) -> Self {
        self.reasons.push(reason);
        self.passed = false;
        self
    }
}

/// Whether `path` has the vector extension (case-insensitive).
pub fn is_vector(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(VECTOR_EXTENSION))
}

/// Decides whether the image at `path` is minimal enough.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use minlogo::{FilterSettings, evaluate_image};
///
/// let result = evaluate_image(Path::new("dataset/raw/rust-lang_rust.png"), &FilterSettings::default());
/// println!("{} -> {} ({:?})", result.path.display(), result.passed, result.reasons);
/// ```
pub fn evaluate_image(path: &Path, settings: &FilterSettings) -> FilterResult {
    let mut result = FilterResult::pending(path);

    if is_vector(path) {
        result.color_count = VECTOR_COLOR_COUNT;
        result.passed = true;
        return result;
    }

    let (width, height) = match dimensions(path) {
        Ok(size) => size,
        Err(message) => {
            result.color_count = FAILED_COLOR_COUNT;
            return result.reject(format!("Error: {message}"));
        }
    };
    result.size = (width, height);

    if width < settings.min_size.0 || height < settings.min_size.1 {
        return result.reject(format!("Too small: {width}x{height}"));
    }
    if width > settings.max_size.0 || height > settings.max_size.1 {
        return result.reject(format!("Too large: {width}x{height}"));
    }

    let image = match decode(path) {
        Ok(image) => image,
        Err(message) => {
            result.color_count = FAILED_COLOR_COUNT;
            return result.reject(format!("Error: {message}"));
        }
    };

    let color_count = count_colors(&image, settings.count_thumbnail, settings.analysis_cap);
    result.color_count = color_count;
    if color_count > i64::from(settings.max_colors) {
        return result.reject(format!("Too many colors: {color_count}"));
    }

    result.dominant_colors =
        dominant_colors(&image, settings.dominant_thumbnail, settings.dominant_colors);
    result.passed = true;
    result
}

/// Reads the image header only. Allocation limits apply to decoding, so
/// they are lifted here to let oversized images reach the bounds check.
fn dimensions(path: &Path) -> Result<(u32, u32), String> {
    let mut reader = ImageReader::open(path)
        .map_err(|error| error.to_string())?
        .with_guessed_format()
        .map_err(|error| error.to_string())?;
    reader.no_limits();
    reader.into_dimensions().map_err(|error| error.to_string())
}

fn decode(path: &Path) -> Result<DynamicImage, String> {
    ImageReader::open(path)
        .map_err(|error| error.to_string())?
        .with_guessed_format()
        .map_err(|error| error.to_string())?
        .decode()
        .map_err(|error| error.to_string())
}

/// Shrinks `image` to fit within `bound` x `bound`, never enlarging it.
///
/// Nearest-neighbour sampling keeps the palette of flat artwork intact: it
/// only ever drops colors, never blends new ones.
fn shrink(image: &DynamicImage, bound: u32) -> Cow<'_, DynamicImage> {
    if image.width() <= bound && image.height() <= bound {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image.resize(bound, bound, FilterType::Nearest))
    }
}

/// Counts distinct RGB colors of the shrunk image, up to `cap`.
///
/// Returns `cap + 1` as soon as more than `cap` colors are seen.
pub fn count_colors(image: &DynamicImage, thumbnail: u32, cap: u32) -> i64 {
    let rgb = shrink(image, thumbnail).to_rgb8();
    let limit = cap as usize;
    let mut seen = HashSet::with_capacity(limit.min(1024) + 1);

    for pixel in rgb.pixels() {
        seen.insert(pixel.0);
        if seen.len() > limit {
            return i64::from(cap) + 1;
        }
    }

    seen.len() as i64
}

/// Up to `count` dominant colors of the shrunk image.
pub fn dominant_colors(image: &DynamicImage, thumbnail: u32, count: usize) -> Vec<DominantColor> {
    let rgb = shrink(image, thumbnail).to_rgb8();
    let mut histogram: HashMap<[u8; 3], u64> = HashMap::new();
    for pixel in rgb.pixels() {
        *histogram.entry(pixel.0).or_default() += 1;
    }

    median_cut(histogram.into_iter().collect(), count)
}

/// Quantizes a color histogram into at most `count` colors.
///
/// Starting from one box holding every color, the most populated box that
/// still holds more than one color is split at the weighted median of its
/// widest channel, until `count` boxes exist or nothing can be split. Each box
/// is reported as its pixel-weighted mean color.
pub fn median_cut(histogram: Vec<([u8; 3], u64)>, count: usize) -> Vec<DominantColor> {
    if histogram.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut boxes = vec![ColorBox::new(histogram)];
    while boxes.len() < count {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, color_box)| color_box.colors.len() > 1)
            .max_by_key(|(_, color_box)| (color_box.population(), color_box.widest_range()))
            .map(|(index, _)| index);

        let Some(index) = candidate else {
            break;
        };

        let (low, high) = boxes.swap_remove(index).split();
        boxes.push(low);
        boxes.push(high);
    }

    let mut colors: Vec<DominantColor> = boxes
        .iter()
        .map(|color_box| DominantColor(color_box.population(), color_box.mean()))
        .collect();
    colors.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    colors
}

struct ColorBox {
    colors: Vec<([u8; 3], u64)>
}

impl ColorBox {
    fn new(colors: Vec<([u8; 3], u64)>) -> Self {
        Self {
            colors
        }
    }

    fn population(&self) -> u64 {
        self.colors.iter().map(|(_, weight)| weight).sum()
    }

    fn channel_range(&self, channel: usize) -> u8 {
        let (min, max) = self
            .colors
            .iter()
            .fold((u8::MAX, u8::MIN), |(min, max), (color, _)| {
                (min.min(color[channel]), max.max(color[channel]))
            });
        max.saturating_sub(min)
    }

    fn widest_channel(&self) -> usize {
        (0..3).max_by_key(|&channel| self.channel_range(channel)).unwrap_or(0)
    }

    fn widest_range(&self) -> u8 {
        self.channel_range(self.widest_channel())
    }

    fn split(mut self) -> (Self, Self) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|(color, _)| (color[channel], *color));

        let half = self.population().div_ceil(2);
        let mut accumulated = 0;
        let mut cut = self.colors.len() - 1;
        for (index, (_, weight)) in self.colors.iter().enumerate() {
            accumulated += weight;
            if accumulated >= half {
                cut = index + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.colors.len() - 1);

        let high = self.colors.split_off(cut);
        (self, Self::new(high))
    }

    fn mean(&self) -> [u8; 3] {
        let population = self.population().max(1);
        let mut sums = [0u64; 3];
        for (color, weight) in &self.colors {
            for (sum, component) in sums.iter_mut().zip(color) {
                *sum += u64::from(*component) * weight;
            }
        }
        sums.map(|sum| ((sum + population / 2) / population) as u8)
    }
}

/// Counts reported by [`filter_logos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    /// Records in the input metadata.
    pub total:     usize,
    /// Records whose image existed and was evaluated.
    pub evaluated: usize,
    /// Records whose image passed and was copied.
    pub passed:    usize
}

/// Filters every downloaded logo listed in `metadata_path`.
///
/// Accepted images are copied into `output_dir`; the corresponding records,
/// enriched with `filtered_path` and `color_count`, are written to
/// `filtered_metadata_path` and every [`FilterResult`] to `analysis_path`.
/// Records whose `image_path` is missing on disk are skipped.
///
/// # Errors
///
/// Returns [`Error`] when the state files cannot be read or written or the
/// output directory cannot be created. Per-image failures are recorded in the
/// analysis results instead.
pub fn filter_logos(
    metadata_path: &Path,
    output_dir: &Path,
    filtered_metadata_path: &Path,
    analysis_path: &Path,
    settings: &FilterSettings
) -> Result<FilterSummary, Error> {
    let repositories: Vec<RepositoryRecord> = store::load_records(metadata_path)?;
    fs::create_dir_all(output_dir).map_err(|source| error::write_error(output_dir, source))?;

    let bar = batch_bar(repositories.len(), "Filtering logos");
    let mut filtered = Vec::new();
    let mut analysis = Vec::with_capacity(repositories.len());

    for repository in repositories.iter() {
        bar.inc(1);
        let Some(image_path) = repository.image_path.as_deref().filter(|path| path.exists()) else {
            debug!("No stored image for {}", repository);
            continue;
        };

        let result = evaluate_image(image_path, settings);
        debug!(
            "{}: passed={} colors={} reasons={:?}",
            image_path.display(),
            result.passed,
            result.color_count,
            result.reasons
        );

        let result = if result.passed {
            accept(repository, image_path, output_dir, result, &mut filtered)
        } else {
            result
        };

        analysis.push(result);
    }

    store::save_records(filtered_metadata_path, &filtered)?;
    store::save_records(analysis_path, &analysis)?;

    let summary = FilterSummary {
        total:     repositories.len(),
        evaluated: analysis.len(),
        passed:    filtered.len()
    };
    bar.finish_with_message(format!("{} passed", summary.passed));

    let rate = if summary.total == 0 {
        0.0
    } else {
        summary.passed as f64 / summary.total as f64 * 100.0
    };
    info!("Filtered {} / {} logos", summary.passed, summary.total);
    info!("Filter rate: {:.1}%", rate);

    Ok(summary)
}

/// Copies an accepted image into `output_dir`. A failed copy turns the result
/// into a rejection so the analysis agrees with the filtered metadata.
fn accept(
    repository: &RepositoryRecord,
    image_path: &Path,
    output_dir: &Path,
    result: FilterResult,
    filtered: &mut Vec<RepositoryRecord>
) -> FilterResult {
    let Some(file_name) = image_path.file_name() else {
        return result.reject("Error: copy failed: no file name".to_owned());
    };
    let destination = output_dir.join(file_name);
    match fs::copy(image_path, &destination) {
        Ok(_) => {
            filtered.push(repository.clone().with_filter(&destination, result.color_count));
            result
        }
        Err(error) => {
            warn!(
                "Failed to copy {} to {}: {}",
                image_path.display(),
                destination.display(),
                error
            );
            result.reject(format!("Error: copy failed: {error}"))
        }
    }
}
