// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Vector to raster conversion.
//!
//! Three interchangeable backends render an SVG onto a white canvas of a
//! fixed size: the in-process `resvg` renderer, the `inkscape` CLI and the
//! ImageMagick `convert` CLI. Conversion is idempotent on the target path: an
//! existing target is never rewritten.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use resvg::{tiny_skia, usvg};
use tokio::{process::Command, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    config::RasterBackend,
    error::{self, Error},
    filter::is_vector,
    progress::batch_bar,
};

/// Upper bound for one external conversion.
pub const CONVERSION_TIMEOUT: Duration = Duration::from_secs(30,);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5,);

/// A backend able to render an SVG file into a PNG file.
#[async_trait]
pub trait Rasterizer: Send + Sync
{
    /// Backend name used in logs.
    fn name(&self,) -> &'static str;

    /// Whether the backend can run on this machine.
    async fn is_available(&self,) -> bool;

    /// Renders `source` into `target` at `width` x `height`.
    ///
    /// Returns `true` only when the target was written.
    async fn rasterize(&self, source: &Path, target: &Path, width: u32, height: u32,) -> bool;
}

/// In-process renderer.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ResvgRasterizer;

#[async_trait]
impl Rasterizer for ResvgRasterizer
{
    fn name(&self,) -> &'static str
    {
        "resvg"
    }

    async fn is_available(&self,) -> bool
    {
        true
    }

    async fn rasterize(&self, source: &Path, target: &Path, width: u32, height: u32,) -> bool
    {
        match render_svg(source, target, width, height,) {
            Ok((),) => true,
            Err(message,) => {
                warn!("resvg failed on {}: {}", source.display(), message);
                false
            }
        }
    }
}

/// Renders the SVG scaled uniformly and centered on an opaque white canvas.
fn render_svg(source: &Path, target: &Path, width: u32, height: u32,) -> Result<(), String,>
{
    let data = fs::read(source,).map_err(|error| error.to_string(),)?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default(),)
        .map_err(|error| error.to_string(),)?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height,)
        .ok_or_else(|| format!("invalid canvas size {width}x{height}"),)?;
    pixmap.fill(tiny_skia::Color::WHITE,);

    let size = tree.size();
    let scale = (width as f32 / size.width()).min(height as f32 / size.height(),);
    let offset_x = (width as f32 - size.width() * scale) / 2.0;
    let offset_y = (height as f32 - size.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, offset_x, offset_y,);

    resvg::render(&tree, transform, &mut pixmap.as_mut(),);
    pixmap.save_png(target,).map_err(|error| error.to_string(),)
}

/// `inkscape` command-line backend.
#[derive(Debug, Clone,)]
pub struct InkscapeRasterizer
{
    program: String,
}

impl Default for InkscapeRasterizer
{
    fn default() -> Self
    {
        Self::with_program("inkscape",)
    }
}

impl InkscapeRasterizer
{
    /// Uses `program` instead of `inkscape` from `PATH`.
    pub fn with_program(program: impl Into<String,>,) -> Self
    {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments converting `source` into `target`.
    pub fn arguments(source: &Path, target: &Path, width: u32, height: u32,) -> Vec<OsString,>
    {
        vec![
            source.as_os_str().to_owned(),
            "--export-filename".into(),
            target.as_os_str().to_owned(),
            "--export-width".into(),
            width.to_string().into(),
            "--export-height".into(),
            height.to_string().into(),
            "--export-background".into(),
            "white".into(),
        ]
    }
}

#[async_trait]
impl Rasterizer for InkscapeRasterizer
{
    fn name(&self,) -> &'static str
    {
        "inkscape"
    }

    async fn is_available(&self,) -> bool
    {
        probe(&self.program,).await
    }

    async fn rasterize(&self, source: &Path, target: &Path, width: u32, height: u32,) -> bool
    {
        let arguments = Self::arguments(source, target, width, height,);
        run_tool(&self.program, &arguments, CONVERSION_TIMEOUT,).await && target.exists()
    }
}

/// ImageMagick `convert` command-line backend.
#[derive(Debug, Clone,)]
pub struct ImageMagickRasterizer
{
    program: String,
}

impl Default for ImageMagickRasterizer
{
    fn default() -> Self
    {
        Self::with_program("convert",)
    }
}

impl ImageMagickRasterizer
{
    /// Uses `program` instead of `convert` from `PATH`.
    pub fn with_program(program: impl Into<String,>,) -> Self
    {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments converting `source` into `target`.
    pub fn arguments(source: &Path, target: &Path, width: u32, height: u32,) -> Vec<OsString,>
    {
        let geometry = format!("{width}x{height}");
        vec![
            "-background".into(),
            "white".into(),
            source.as_os_str().to_owned(),
            "-resize".into(),
            geometry.clone().into(),
            "-gravity".into(),
            "center".into(),
            "-extent".into(),
            geometry.into(),
            "-flatten".into(),
            target.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Rasterizer for ImageMagickRasterizer
{
    fn name(&self,) -> &'static str
    {
        "imagemagick"
    }

    async fn is_available(&self,) -> bool
    {
        probe(&self.program,).await
    }

    async fn rasterize(&self, source: &Path, target: &Path, width: u32, height: u32,) -> bool
    {
        let arguments = Self::arguments(source, target, width, height,);
        run_tool(&self.program, &arguments, CONVERSION_TIMEOUT,).await && target.exists()
    }
}

async fn probe(program: &str,) -> bool
{
    run_tool(program, &[OsString::from("--version",)], PROBE_TIMEOUT,).await
}

/// Runs `program` to completion within `limit`. The child is killed when the
/// limit expires.
async fn run_tool(program: &str, arguments: &[OsString], limit: Duration,) -> bool
{
    let mut command = Command::new(program,);
    command.args(arguments,).stdin(Stdio::null(),).kill_on_drop(true,);

    match timeout(limit, command.output(),).await {
        Ok(Ok(output,),) if output.status.success() => true,
        Ok(Ok(output,),) => {
            warn!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Ok(Err(error,),) => {
            debug!("Failed to launch {}: {}", program, error);
            false
        }
        Err(_,) => {
            warn!("{} timed out after {:?}", program, limit);
            false
        }
    }
}

/// First backend of `candidates` reporting itself available.
pub async fn first_available(
    candidates: Vec<Box<dyn Rasterizer,>,>,
) -> Option<Box<dyn Rasterizer,>,>
{
    for candidate in candidates {
        if candidate.is_available().await {
            return Some(candidate,);
        }
        debug!("Rasterizer {} is not available", candidate.name());
    }
    None
}

/// Resolves the configured backend.
///
/// [`RasterBackend::Auto`] probes resvg, then inkscape, then ImageMagick, and
/// falls back to ImageMagick when none responds.
pub async fn select_rasterizer(backend: RasterBackend,) -> Box<dyn Rasterizer,>
{
    match backend {
        RasterBackend::Resvg => Box::new(ResvgRasterizer,),
        RasterBackend::Inkscape => Box::new(InkscapeRasterizer::default(),),
        RasterBackend::Imagemagick => Box::new(ImageMagickRasterizer::default(),),
        RasterBackend::Auto => first_available(vec![
            Box::new(ResvgRasterizer,),
            Box::new(InkscapeRasterizer::default(),),
            Box::new(ImageMagickRasterizer::default(),),
        ],)
        .await
        .unwrap_or_else(|| Box::new(ImageMagickRasterizer::default(),),),
    }
}

/// Converts one vector file unless `target` already exists.
///
/// Returns `true` when the target exists afterwards.
pub async fn convert_vector(
    rasterizer: &dyn Rasterizer,
    source: &Path,
    target: &Path,
    width: u32,
    height: u32,
) -> bool
{
    if target.exists() {
        debug!("{} already exists", target.display());
        return true;
    }

    if let Some(parent,) = target.parent()
        && let Err(error,) = fs::create_dir_all(parent,)
    {
        warn!("Failed to create {}: {}", parent.display(), error);
        return false;
    }

    rasterizer.rasterize(source, target, width, height,).await
}

/// Converts every `*.svg` of `input_dir` into `output_dir/<stem>.png`.
///
/// # Errors
///
/// Returns [`Error`] when `input_dir` cannot be listed.
pub async fn batch_rasterize(
    input_dir: &Path,
    output_dir: &Path,
    size: u32,
    backend: RasterBackend,
) -> Result<usize, Error,>
{
    let rasterizer = select_rasterizer(backend,).await;
    rasterize_directory(rasterizer.as_ref(), input_dir, output_dir, size,).await
}

/// [`batch_rasterize`] with an already resolved backend.
///
/// # Errors
///
/// Returns [`Error`] when `input_dir` cannot be listed.
pub async fn rasterize_directory(
    rasterizer: &dyn Rasterizer,
    input_dir: &Path,
    output_dir: &Path,
    size: u32,
) -> Result<usize, Error,>
{
    let sources = vector_files(input_dir,)?;
    let bar = batch_bar(sources.len(), "Rasterizing",);
    let mut converted = 0;

    for source in &sources {
        bar.inc(1,);
        let Some(stem,) = source.file_stem() else {
            continue;
        };
        let target = output_dir.join(stem,).with_extension("png",);
        if convert_vector(rasterizer, source, &target, size, size,).await {
            converted += 1;
        }
    }

    bar.finish_with_message(format!("{converted} converted"),);
    info!(
        "Converted {} / {} vector files with {}",
        converted,
        sources.len(),
        rasterizer.name()
    );
    Ok(converted,)
}

fn vector_files(input_dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    let entries = fs::read_dir(input_dir,).map_err(|source| error::io_error(input_dir, source,),)?;
    let mut files: Vec<PathBuf,> = entries
        .filter_map(Result::ok,)
        .map(|entry| entry.path(),)
        .filter(|path| path.is_file() && is_vector(path,),)
        .collect();
    files.sort();
    Ok(files,)
}
