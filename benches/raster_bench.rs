use criterion::{criterion_group, criterion_main, Criterion};
use statusmaker::composer::StatusComposer;
use statusmaker::rendering::fonts::FontBook;
use statusmaker::rendering::paint::build_display_list;
use statusmaker::{ComposerConfig, Rasterizer, SkiaRasterizer, TextEffect};
use std::sync::Arc;

fn composer() -> StatusComposer {
    let mut composer = StatusComposer::new(&ComposerConfig::default());
    composer.set_text("Good morning everyone! Have a wonderful day ahead");
    composer.select_effect(TextEffect::Shadow);
    composer
}

fn bench_display_list(c: &mut Criterion) {
    let fonts = FontBook::system(&[]).expect("font directories");
    let surface = composer().surface();
    c.bench_function("build_display_list", |b| {
        b.iter(|| build_display_list(&surface, &fonts))
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let config = ComposerConfig::default();
    let rasterizer = SkiaRasterizer::new(Arc::new(FontBook::system(&[]).expect("font directories")));
    let surface = composer().surface();
    c.bench_function("rasterize_shadow_text", |b| {
        b.iter(|| rasterizer.rasterize(&surface, &config.raster).unwrap())
    });

    let mut flat = StatusComposer::new(&config);
    flat.set_background_color("#075e54");
    let surface = flat.surface();
    c.bench_function("rasterize_flat_color", |b| {
        b.iter(|| rasterizer.rasterize(&surface, &config.raster).unwrap())
    });
}

criterion_group!(benches, bench_display_list, bench_rasterize);
criterion_main!(benches);
