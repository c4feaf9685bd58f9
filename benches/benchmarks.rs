// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use minlogo::{RepositoryRecord, count_colors, dominant_colors, median_cut, merge_repositories};

fn flat_logo(size: u32,) -> DynamicImage
{
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| match (x * 4 / size, y * 4 / size,) {
        (0, _,) => Rgb([255, 255, 255],),
        (_, 0,) => Rgb([30, 30, 30],),
        (1 | 2, _,) => Rgb([222, 165, 132],),
        _ => Rgb([0, 122, 204],),
    },),)
}

fn photographic(size: u32,) -> DynamicImage
{
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8],)
    },),)
}

fn benchmark_color_counting(c: &mut Criterion,)
{
    let flat = flat_logo(512,);
    let noisy = photographic(512,);

    c.bench_function("count_colors_flat_512", |b| {
        b.iter(|| count_colors(black_box(&flat,), 100, 256,),)
    },);
    c.bench_function("count_colors_photographic_512", |b| {
        b.iter(|| count_colors(black_box(&noisy,), 100, 256,),)
    },);
}

fn benchmark_dominant_colors(c: &mut Criterion,)
{
    let flat = flat_logo(512,);
    c.bench_function("dominant_colors_flat_512", |b| {
        b.iter(|| dominant_colors(black_box(&flat,), 150, 5,),)
    },);

    let histogram: Vec<([u8; 3], u64,),> = (0..4096u32)
        .map(|index| ([(index % 16 * 16) as u8, (index / 16 % 16 * 16) as u8, (index / 256 * 16) as u8], u64::from(index % 7 + 1),),)
        .collect();
    c.bench_function("median_cut_4096_colors", |b| {
        b.iter(|| median_cut(black_box(histogram.clone(),), 5,),)
    },);
}

fn benchmark_merge(c: &mut Criterion,)
{
    let starred: Vec<RepositoryRecord,> =
        (0..1000).map(|index| RepositoryRecord::new(format!("owner{index}"), "repo",),).collect();
    let trending: Vec<RepositoryRecord,> = (500..1500)
        .map(|index| RepositoryRecord::new(format!("owner{index}"), "repo",),)
        .collect();

    c.bench_function("merge_1000_with_1000_overlapping", |b| {
        b.iter(|| {
            let outcome = merge_repositories(black_box(starred.clone(),), black_box(trending.clone(),),);
            black_box(outcome.unique,)
        },)
    },);
}

criterion_group!(
    benches,
    benchmark_color_counting,
    benchmark_dominant_colors,
    benchmark_merge
);
criterion_main!(benches);
