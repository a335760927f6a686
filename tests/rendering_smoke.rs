use statusmaker::background::BackgroundMode;
use statusmaker::composer::StatusComposer;
use statusmaker::rendering::fonts::FontBook;
use statusmaker::upload::encode_data_url;
use statusmaker::{ComposerConfig, Error, RasterOptions, Rasterizer, Session, SkiaRasterizer, TextEffect};
use std::path::PathBuf;
use std::sync::Arc;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("statusmaker-smoke-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).expect("valid png").to_rgba8()
}

#[test]
fn default_surface_exports_at_twice_the_viewport() {
    let config = ComposerConfig::default();
    let composer = StatusComposer::new(&config);
    let rasterizer = SkiaRasterizer::new(Arc::new(FontBook::system(&[]).unwrap()));
    let shot = rasterizer.rasterize(&composer.surface(), &config.raster).unwrap();
    assert!(shot.is_png());
    assert_eq!((shot.width, shot.height), (720, 1280));
    let img = decode(&shot.png_data);
    assert_eq!(img.dimensions(), (720, 1280));
}

#[test]
fn text_changes_pixels_when_fonts_exist() {
    let fonts = FontBook::system(&[]).unwrap();
    if fonts.is_empty() {
        println!("Skipping: no system fonts");
        return;
    }
    let rasterizer = SkiaRasterizer::new(Arc::new(fonts));
    let options = RasterOptions {
        scale: 1.0,
        ..RasterOptions::default()
    };
    let mut composer = StatusComposer::new(&ComposerConfig::default());
    composer.set_background_color("#000000");
    composer.set_text(" ");
    let blank = rasterizer.rasterize(&composer.surface(), &options).unwrap();

    composer.set_text("Hello");
    composer.select_effect(TextEffect::Bold);
    let text = rasterizer.rasterize(&composer.surface(), &options).unwrap();
    assert_ne!(blank.digest(), text.digest());

    let lit = decode(&text.png_data).pixels().filter(|p| p[0] > 128).count();
    assert!(lit > 0, "expected white glyph pixels");
}

#[test]
fn image_background_covers_the_surface() {
    let mut buf = std::io::Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    let data_url = encode_data_url(buf.get_ref());

    let mut composer = StatusComposer::new(&ComposerConfig::default());
    let ticket = composer.begin_image_upload(Some("blue.png".into())).unwrap();
    assert!(composer.complete_image_upload(&ticket, data_url));

    let rasterizer = SkiaRasterizer::new(Arc::new(FontBook::empty()));
    let options = RasterOptions {
        scale: 1.0,
        ..RasterOptions::default()
    };
    let shot = rasterizer.rasterize(&composer.surface(), &options).unwrap();
    let img = decode(&shot.png_data);
    for (x, y) in [(0, 0), (359, 639), (180, 320)] {
        let p = img.get_pixel(x, y);
        assert_eq!((p[2], p[3]), (255, 255), "pixel {},{}", x, y);
    }
}

#[test]
fn file_images_are_refused_without_cross_origin() {
    let dir = scratch("cors");
    let path = dir.join("remote.png");
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
        .save(&path)
        .unwrap();
    let url = url::Url::from_file_path(&path).unwrap();

    let mut surface = StatusComposer::new(&ComposerConfig::default()).surface();
    surface.surface_style = BackgroundMode::Image(url.to_string()).declarations();

    let rasterizer = SkiaRasterizer::new(Arc::new(FontBook::empty()));
    let strict = RasterOptions {
        scale: 1.0,
        cross_origin_images: false,
        ..RasterOptions::default()
    };
    let err = rasterizer.rasterize(&surface, &strict).unwrap_err();
    assert!(matches!(err, Error::CrossOrigin(_)), "{:?}", err);

    let relaxed = RasterOptions {
        scale: 1.0,
        ..RasterOptions::default()
    };
    let shot = rasterizer.rasterize(&surface, &relaxed).unwrap();
    assert_eq!(decode(&shot.png_data).get_pixel(10, 10)[1], 255);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn session_writes_a_real_png() {
    let dir = scratch("session");
    let config = ComposerConfig {
        download_dir: dir.clone(),
        seed: Some(11),
        ..ComposerConfig::default()
    };
    let session = Session::new(config).await.unwrap();
    session.set_text("Good morning").await.unwrap();
    session.random_gradient().await.unwrap();

    let download = session.download().await.unwrap().expect("idle trigger exports");
    assert_eq!(download.path.parent(), Some(dir.as_path()));
    let bytes = std::fs::read(&download.path).unwrap();
    assert_eq!(bytes.len(), download.size);
    assert_eq!(decode(&bytes).dimensions(), (720, 1280));

    session.close().await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}
