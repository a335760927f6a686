use anyhow::Context;
use clap::Parser;
use serde_json::json;
use statusmaker::preview::FONT_FAMILIES;
use statusmaker::style::gradient::PRESET_GRADIENTS;
use statusmaker::{ComposerConfig, ComposerEvent, Session, TextAlign, TextEffect};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "statusmaker", version, about = "Compose a status image and export it as PNG")]
struct Cli {
    /// Caption text (empty shows the fallback caption)
    #[arg(long)]
    text: Option<String>,

    /// CSS font family list
    #[arg(long)]
    font: Option<String>,

    /// Font size in px
    #[arg(long, value_parser = clap::value_parser!(u32).range(12..=72))]
    size: Option<u32>,

    /// Text color (any CSS color)
    #[arg(long)]
    color: Option<String>,

    #[arg(long, value_enum)]
    align: Option<TextAlign>,

    #[arg(long, value_enum)]
    effect: Option<TextEffect>,

    /// Flat background color
    #[arg(long, group = "background")]
    bg_color: Option<String>,

    /// Random three-hue gradient background
    #[arg(long, group = "background")]
    random_gradient: bool,

    /// Gradient preset by index (see --list-presets)
    #[arg(long, group = "background")]
    preset: Option<usize>,

    /// Any CSS linear-gradient as background
    #[arg(long, group = "background")]
    preset_css: Option<String>,

    /// Background image file
    #[arg(long, group = "background")]
    image: Option<PathBuf>,

    /// Directory for the exported PNG
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for --random-gradient
    #[arg(long)]
    seed: Option<u64>,

    /// Extra font directory (repeatable)
    #[arg(long)]
    font_dir: Vec<PathBuf>,

    /// Device pixels per CSS pixel
    #[arg(long)]
    scale: Option<f32>,

    /// Fill uncovered pixels with white
    #[arg(long)]
    opaque: bool,

    /// Read JSON events from stdin, one per line
    #[arg(long)]
    script: bool,

    #[arg(long)]
    list_presets: bool,

    /// Print the selectable fonts and the installed face each resolves to
    #[arg(long)]
    list_fonts: bool,
}

impl Cli {
    fn config(&self) -> anyhow::Result<ComposerConfig> {
        let mut config = match &self.config {
            Some(path) => ComposerConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ComposerConfig::default(),
        };
        if let Some(dir) = &self.out_dir {
            config.download_dir = dir.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(scale) = self.scale {
            config.raster.scale = scale;
        }
        if self.opaque {
            config.raster.transparent_background = false;
        }
        config.font_dirs.extend(self.font_dir.iter().cloned());
        Ok(config)
    }

    /// The one-shot flags as events, in control order.
    fn events(&self) -> Vec<ComposerEvent> {
        let mut events = Vec::new();
        if let Some(value) = &self.text {
            events.push(ComposerEvent::Text { value: value.clone() });
        }
        if let Some(value) = &self.font {
            events.push(ComposerEvent::FontFamily { value: value.clone() });
        }
        if let Some(value) = self.size {
            events.push(ComposerEvent::FontSize { value });
        }
        if let Some(value) = &self.color {
            events.push(ComposerEvent::FontColor { value: value.clone() });
        }
        if let Some(value) = self.align {
            events.push(ComposerEvent::Align { value });
        }
        if let Some(value) = self.effect {
            events.push(ComposerEvent::Effect { value });
        }
        if let Some(value) = &self.bg_color {
            events.push(ComposerEvent::BgColor { value: value.clone() });
        }
        if self.random_gradient {
            events.push(ComposerEvent::RandomGradient);
        }
        if let Some(index) = self.preset {
            events.push(ComposerEvent::Preset { index });
        }
        if let Some(value) = &self.preset_css {
            events.push(ComposerEvent::PresetCss { value: value.clone() });
        }
        if let Some(path) = &self.image {
            events.push(ComposerEvent::Image { path: Some(path.clone()) });
        }
        events
    }
}

async fn run_once(session: &Session, events: Vec<ComposerEvent>) -> anyhow::Result<()> {
    for event in events {
        let outcome = session.dispatch(event).await?;
        log::debug!("{:?}", outcome);
    }
    let download = session
        .download()
        .await
        .context("export failed")?
        .context("export trigger was busy")?;
    println!("{}", download.path.display());
    Ok(())
}

async fn run_script(session: &Session) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    let mut n = 0usize;

    while let Some(line) = lines.next_line().await? {
        n += 1;
        if line.trim().is_empty() {
            continue;
        }
        let result = match serde_json::from_str::<ComposerEvent>(&line) {
            Ok(event) => match session.dispatch(event).await {
                Ok(outcome) => {
                    let mut value = serde_json::to_value(&outcome)?;
                    value["line"] = json!(n);
                    value
                }
                Err(e) => json!({ "line": n, "status": "error", "error": e.to_string() }),
            },
            Err(e) => json!({ "line": n, "status": "error", "error": format!("malformed event: {}", e) }),
        };
        out.write_all(format!("{}\n", result).as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.list_presets {
        for (i, css) in PRESET_GRADIENTS.iter().enumerate() {
            println!("{}\t{}", i, css);
        }
        return Ok(());
    }

    let config = cli.config()?;
    if cli.list_fonts {
        let rasterizer = statusmaker::new_rasterizer(&config).context("loading fonts")?;
        let fonts = rasterizer.fonts();
        for family in FONT_FAMILIES {
            let used = fonts
                .resolve(&[family.to_string()], false, false)
                .and_then(|face| fonts.family_name(&face))
                .unwrap_or_else(|| "-".to_string());
            println!("{}\t{}", family, used);
        }
        return Ok(());
    }

    let session = Session::new(config).await.context("starting session")?;
    let result = if cli.script {
        run_script(&session).await
    } else {
        run_once(&session, cli.events()).await
    };
    session.close().await?;
    result
}
