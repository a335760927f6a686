use statusmaker::background::{active_backgrounds, BackgroundKind, BackgroundMode};
use statusmaker::composer::StatusComposer;
use statusmaker::session::ControlInput;
use statusmaker::style::gradient::PRESET_GRADIENTS;
use statusmaker::preview::PreviewSurface;
use statusmaker::{ComposerConfig, RasterOptions, Rasterizer, Result, Screenshot, Session, UploadOutcome};
use std::path::PathBuf;
use std::sync::Arc;

struct Blank;

impl Rasterizer for Blank {
    fn rasterize(&self, surface: &PreviewSurface, _: &RasterOptions) -> Result<Screenshot> {
        Ok(Screenshot::empty(surface.width as u32, surface.height as u32))
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("statusmaker-bg-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A 2x2 PNG on disk.
fn png_file(dir: &PathBuf, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 30, 30, 255]))
        .save(&path)
        .unwrap();
    path
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Color,
    Random,
    Preset(usize),
    ImageApplied,
    Clear,
}

fn apply(c: &mut StatusComposer, op: Op, rng: &mut rand::rngs::StdRng) {
    match op {
        Op::Color => c.set_background_color("#123456"),
        Op::Random => {
            c.apply_random_gradient(rng);
        }
        Op::Preset(i) => {
            c.apply_preset(i).unwrap();
        }
        Op::ImageApplied => {
            let ticket = c.begin_image_upload(Some("pic.png".into())).unwrap();
            assert!(c.complete_image_upload(&ticket, "data:image/png;base64,AAAA".into()));
        }
        Op::Clear => c.clear_background_image(),
    }
}

#[test]
fn every_sequence_leaves_one_background() {
    use rand::SeedableRng;
    let ops = [Op::Color, Op::Random, Op::Preset(5), Op::ImageApplied, Op::Clear];
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    for a in ops {
        for b in ops {
            for c in ops {
                let mut composer = StatusComposer::new(&ComposerConfig::default());
                for op in [a, b, c] {
                    apply(&mut composer, op, &mut rng);
                    let active = active_backgrounds(&composer.preview().surface);
                    assert_eq!(active.len(), 1, "{:?} -> {:?}", [a, b, c], active);
                    assert_eq!(active[0], composer.background().mode().kind());
                }
            }
        }
    }
}

#[test]
fn image_background_keeps_its_selection_until_replaced() {
    let mut c = StatusComposer::new(&ComposerConfig::default());
    let ticket = c.begin_image_upload(Some("beach.jpg".into())).unwrap();
    assert!(c.complete_image_upload(&ticket, "data:image/jpeg;base64,AAAA".into()));
    assert_eq!(c.state().file_selection, Some(PathBuf::from("beach.jpg")));
    assert_eq!(c.state().active_backgrounds, vec![BackgroundKind::Image]);

    c.set_background_color("#ffffff");
    let state = c.state();
    assert!(state.file_selection.is_none());
    assert_eq!(state.background, BackgroundMode::Color("#ffffff".into()));
    assert_eq!(state.surface_style.get("background-image"), Some("none"));
}

#[tokio::test]
async fn upload_then_preset_keeps_the_preset() {
    let dir = scratch("race");
    let a = png_file(&dir, "a.png");
    let config = ComposerConfig {
        download_dir: dir.clone(),
        ..ComposerConfig::default()
    };
    let session = Session::with_rasterizer(config, Arc::new(Blank));

    let upload = session.upload_image(Some(a)).unwrap();
    let css = session.apply_preset(4).await.unwrap();
    assert_eq!(css, PRESET_GRADIENTS[4]);
    assert_eq!(upload.finished().await.unwrap(), UploadOutcome::Superseded);

    // give a late read every chance to land
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let state = session.state().await.unwrap();
    assert_eq!(state.background, BackgroundMode::Gradient(PRESET_GRADIENTS[4].into()));
    assert_eq!(state.active_backgrounds, vec![BackgroundKind::Gradient]);
    assert!(state.file_selection.is_none());

    session.close().await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn second_upload_supersedes_the_first() {
    let dir = scratch("twice");
    let a = png_file(&dir, "a.png");
    let b = png_file(&dir, "b.png");
    let session = Session::with_rasterizer(ComposerConfig::default(), Arc::new(Blank));

    let first = session.upload_image(Some(a)).unwrap();
    let second = session.upload_image(Some(b.clone())).unwrap();
    assert_eq!(first.finished().await.unwrap(), UploadOutcome::Superseded);
    assert_eq!(second.finished().await.unwrap(), UploadOutcome::Applied);

    let state = session.state().await.unwrap();
    assert_eq!(state.active_backgrounds, vec![BackgroundKind::Image]);
    assert_eq!(state.file_selection, Some(b));
    match state.background {
        BackgroundMode::Image(url) => assert!(url.starts_with("data:image/png;base64,")),
        other => panic!("expected an image background, got {:?}", other),
    }

    session.input(ControlInput::ClearImage).await.unwrap();
    let state = session.state().await.unwrap();
    assert_eq!(state.background, BackgroundMode::default());
    assert_eq!(state.active_backgrounds, vec![BackgroundKind::Gradient]);
    assert!(state.file_selection.is_none());

    session.close().await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}
