//! Async session: one event loop task owns the composer.
//!
//! Callers hold cloneable `Session` handles and talk to the loop through an
//! unbounded command channel with `oneshot` replies. Commands are handled one
//! at a time, so no caller ever observes a half-applied update. File reads,
//! rasterization and the error-label timer run outside the loop and post
//! their results back in as commands.

use crate::background::UploadTicket;
use crate::composer::{ComposerState, StatusComposer};
use crate::export::{save_download, Download, ExportTicket, RevertToken};
use crate::preview::{TextAlign, TextEffect};
use crate::rendering::Screenshot;
use crate::upload::UploadTask;
use crate::{new_rasterizer, ComposerConfig, Error, Rasterizer, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender, WeakUnboundedSender};
use tokio::sync::oneshot;

/// A change coming from one of the text or background controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    Text(String),
    FontFamily(String),
    FontSize(u32),
    FontColor(String),
    Align(TextAlign),
    Effect(TextEffect),
    BackgroundColor(String),
    PresetGradient(String),
    ClearImage,
}

/// How an image upload ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Nothing was selected
    NoSelection,
    /// The image is now the background
    Applied,
    /// Another background operation came first
    Superseded,
    /// The file could not be read; the background is unchanged
    Failed(String),
}

enum Command {
    Input(ControlInput, oneshot::Sender<()>),
    RandomGradient(oneshot::Sender<String>),
    Preset(usize, oneshot::Sender<Result<String>>),
    Upload(Option<PathBuf>, oneshot::Sender<UploadOutcome>),
    UploadLoaded(UploadTicket, Result<String>),
    Download(oneshot::Sender<Result<Option<Download>>>),
    ExportFinished(
        ExportTicket,
        Result<Screenshot>,
        oneshot::Sender<Result<Option<Download>>>,
    ),
    RevertExportLabel(RevertToken),
    Inspect(oneshot::Sender<StatusComposer>),
    Close(oneshot::Sender<()>),
}

/// Resolves when an upload is applied, superseded or failed.
#[derive(Debug)]
pub struct UploadHandle {
    rx: oneshot::Receiver<UploadOutcome>,
}

impl UploadHandle {
    pub async fn finished(self) -> Result<UploadOutcome> {
        self.rx
            .await
            .map_err(|e| Error::SessionClosed(format!("Upload canceled: {}", e)))
    }
}

/// Resolves when an export finishes. `None` means the click was ignored
/// because another export was in flight.
#[derive(Debug)]
pub struct DownloadHandle {
    rx: oneshot::Receiver<Result<Option<Download>>>,
}

impl DownloadHandle {
    pub async fn finished(self) -> Result<Option<Download>> {
        self.rx
            .await
            .map_err(|e| Error::SessionClosed(format!("Download canceled: {}", e)))?
    }
}

struct PendingUpload {
    task: UploadTask,
    reply: oneshot::Sender<UploadOutcome>,
}

struct EventLoop {
    composer: StatusComposer,
    config: ComposerConfig,
    rasterizer: Arc<dyn Rasterizer>,
    rng: StdRng,
    tx: WeakUnboundedSender<Command>,
    upload: Option<PendingUpload>,
}

impl EventLoop {
    fn sender(&self) -> Option<UnboundedSender<Command>> {
        self.tx.upgrade()
    }

    /// Abort the in-flight read if the composer no longer waits for it.
    fn reconcile_upload(&mut self) {
        let waiting = self.composer.background().pending_upload();
        if let Some(pending) = self.upload.take() {
            if waiting == Some(pending.task.generation()) {
                self.upload = Some(pending);
            } else {
                pending.task.abort();
                let _ = pending.reply.send(UploadOutcome::Superseded);
            }
        }
    }

    fn apply(&mut self, input: ControlInput) {
        let c = &mut self.composer;
        match input {
            ControlInput::Text(text) => c.set_text(text),
            ControlInput::FontFamily(family) => c.set_font_family(family),
            ControlInput::FontSize(size) => c.set_font_size(size),
            ControlInput::FontColor(color) => c.set_font_color(color),
            ControlInput::Align(align) => c.set_alignment(align),
            ControlInput::Effect(effect) => c.select_effect(effect),
            ControlInput::BackgroundColor(color) => c.set_background_color(color),
            ControlInput::PresetGradient(css) => c.apply_preset_gradient(&css),
            ControlInput::ClearImage => c.clear_background_image(),
        }
    }

    fn start_upload(&mut self, selection: Option<PathBuf>, reply: oneshot::Sender<UploadOutcome>) {
        let Some(ticket) = self.composer.begin_image_upload(selection) else {
            let _ = reply.send(UploadOutcome::NoSelection);
            return;
        };
        // the new ticket supersedes whatever was in flight
        self.reconcile_upload();
        let Some(tx) = self.sender() else { return };
        let task = UploadTask::spawn(ticket, move |ticket, result| async move {
            let _ = tx.send(Command::UploadLoaded(ticket, result));
        });
        self.upload = Some(PendingUpload { task, reply });
    }

    fn upload_loaded(&mut self, ticket: UploadTicket, result: Result<String>) {
        let outcome = match result {
            Ok(data_url) => {
                if !self.composer.complete_image_upload(&ticket, data_url) {
                    return;
                }
                UploadOutcome::Applied
            }
            Err(e) => {
                if self.composer.background().pending_upload() != Some(ticket.generation) {
                    return;
                }
                self.composer.abandon_image_upload(&ticket, &e);
                UploadOutcome::Failed(e.to_string())
            }
        };
        if let Some(pending) = self.upload.take() {
            let _ = pending.reply.send(outcome);
        }
    }

    fn start_export(&mut self, reply: oneshot::Sender<Result<Option<Download>>>) {
        let Some(ticket) = self.composer.begin_export() else {
            log::debug!("Export already in flight, ignoring click");
            let _ = reply.send(Ok(None));
            return;
        };
        let Some(tx) = self.sender() else { return };
        let surface = self.composer.surface();
        let options = self.config.raster.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || rasterizer.rasterize(&surface, &options))
                .await
                .unwrap_or_else(|e| Err(Error::RenderError(format!("rasterizer panicked: {}", e))));
            let _ = tx.send(Command::ExportFinished(ticket, result, reply));
        });
    }

    fn export_finished(
        &mut self,
        ticket: ExportTicket,
        result: Result<Screenshot>,
        reply: oneshot::Sender<Result<Option<Download>>>,
    ) {
        let saved = result.and_then(|shot| save_download(&self.config.download_dir, &shot, Utc::now()));
        match saved {
            Ok(download) => {
                log::debug!(
                    "Saved {} ({} bytes, sha256 {})",
                    download.path.display(),
                    download.size,
                    download.sha256
                );
                self.composer.finish_export(ticket);
                let _ = reply.send(Ok(Some(download)));
            }
            Err(e) => {
                if let (Some(token), Some(tx)) = (self.composer.fail_export(ticket, &e), self.sender()) {
                    let delay = Duration::from_millis(self.config.error_label_ms);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Command::RevertExportLabel(token));
                    });
                }
                let _ = reply.send(Err(e));
            }
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Input(input, resp) => {
                    self.apply(input);
                    let _ = resp.send(());
                }
                Command::RandomGradient(resp) => {
                    let css = self.composer.apply_random_gradient(&mut self.rng);
                    let _ = resp.send(css);
                }
                Command::Preset(index, resp) => {
                    let res = self.composer.apply_preset(index).map(str::to_string);
                    let _ = resp.send(res);
                }
                Command::Upload(selection, resp) => self.start_upload(selection, resp),
                Command::UploadLoaded(ticket, result) => self.upload_loaded(ticket, result),
                Command::Download(resp) => self.start_export(resp),
                Command::ExportFinished(ticket, result, resp) => {
                    self.export_finished(ticket, result, resp)
                }
                Command::RevertExportLabel(token) => {
                    self.composer.revert_export_label(token);
                }
                Command::Inspect(resp) => {
                    let _ = resp.send(self.composer.clone());
                }
                Command::Close(resp) => {
                    if let Some(pending) = self.upload.take() {
                        pending.task.abort();
                    }
                    let _ = resp.send(());
                    break;
                }
            }
            self.reconcile_upload();
        }
        log::debug!("Session loop stopped");
    }
}

/// Handle to a running composer session.
#[derive(Clone)]
pub struct Session {
    cmd_tx: UnboundedSender<Command>,
}

impl Session {
    /// Start a session with the default rasterizer. Fonts load on the
    /// blocking pool.
    pub async fn new(config: ComposerConfig) -> Result<Self> {
        let font_config = config.clone();
        let rasterizer = tokio::task::spawn_blocking(move || new_rasterizer(&font_config))
            .await
            .map_err(|e| Error::Other(format!("Font loading canceled: {}", e)))??;
        Ok(Self::with_rasterizer(config, Arc::new(rasterizer)))
    }

    /// Start a session around a custom rasterizer. Must be called inside a
    /// tokio runtime.
    pub fn with_rasterizer(config: ComposerConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let event_loop = EventLoop {
            composer: StatusComposer::new(&config),
            config,
            rasterizer,
            rng,
            tx: cmd_tx.downgrade(),
            upload: None,
        };
        tokio::spawn(event_loop.run(cmd_rx));
        log::info!("WhatsApp Status Maker ready");
        Self { cmd_tx }
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::SessionClosed("event loop is not running".into()))
    }

    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(cmd(tx))?;
        rx.await
            .map_err(|e| Error::SessionClosed(format!("Request canceled: {}", e)))
    }

    pub async fn input(&self, input: ControlInput) -> Result<()> {
        self.request(|tx| Command::Input(input, tx)).await
    }

    pub async fn set_text(&self, text: impl Into<String>) -> Result<()> {
        self.input(ControlInput::Text(text.into())).await
    }

    pub async fn select_effect(&self, effect: TextEffect) -> Result<()> {
        self.input(ControlInput::Effect(effect)).await
    }

    pub async fn set_background_color(&self, color: impl Into<String>) -> Result<()> {
        self.input(ControlInput::BackgroundColor(color.into())).await
    }

    /// Returns the applied gradient CSS.
    pub async fn random_gradient(&self) -> Result<String> {
        self.request(Command::RandomGradient).await
    }

    /// Apply preset swatch `index`; returns its CSS.
    pub async fn apply_preset(&self, index: usize) -> Result<String> {
        self.request(|tx| Command::Preset(index, tx)).await?
    }

    /// Register a file picker change. The read starts in the background; the
    /// handle reports how it ended. Commands sent after this one are ordered
    /// after the selection.
    pub fn upload_image(&self, selection: Option<PathBuf>) -> Result<UploadHandle> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Upload(selection, tx))?;
        Ok(UploadHandle { rx })
    }

    /// Click the export trigger without waiting for the result.
    pub fn request_download(&self) -> Result<DownloadHandle> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Download(tx))?;
        Ok(DownloadHandle { rx })
    }

    /// Click the export trigger and wait for the file.
    pub async fn download(&self) -> Result<Option<Download>> {
        self.request_download()?.finished().await
    }

    /// A copy of the composer as it is now.
    pub async fn snapshot(&self) -> Result<StatusComposer> {
        self.request(Command::Inspect).await
    }

    pub async fn state(&self) -> Result<ComposerState> {
        Ok(self.snapshot().await?.state())
    }

    /// Apply one scripted event.
    pub async fn dispatch(&self, event: ComposerEvent) -> Result<EventOutcome> {
        let outcome = match event {
            ComposerEvent::Text { value } => {
                self.input(ControlInput::Text(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::FontFamily { value } => {
                self.input(ControlInput::FontFamily(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::FontSize { value } => {
                self.input(ControlInput::FontSize(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::FontColor { value } => {
                self.input(ControlInput::FontColor(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::Align { value } => {
                self.input(ControlInput::Align(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::Effect { value } => {
                self.input(ControlInput::Effect(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::BgColor { value } => {
                self.input(ControlInput::BackgroundColor(value)).await?;
                EventOutcome::Ok
            }
            ComposerEvent::RandomGradient => EventOutcome::Gradient {
                css: self.random_gradient().await?,
            },
            ComposerEvent::Preset { index } => EventOutcome::Gradient {
                css: self.apply_preset(index).await?,
            },
            ComposerEvent::PresetCss { value } => {
                self.input(ControlInput::PresetGradient(value.clone())).await?;
                EventOutcome::Gradient { css: value }
            }
            ComposerEvent::Image { path } => EventOutcome::Upload {
                outcome: self.upload_image(path)?.finished().await?,
            },
            ComposerEvent::ClearImage => {
                self.input(ControlInput::ClearImage).await?;
                EventOutcome::Ok
            }
            ComposerEvent::Download => match self.download().await? {
                Some(download) => EventOutcome::Downloaded { download },
                None => EventOutcome::Busy,
            },
            ComposerEvent::Inspect => EventOutcome::State {
                state: Box::new(self.state().await?),
            },
        };
        Ok(outcome)
    }

    /// Stop the event loop. In-flight reads are aborted.
    pub async fn close(self) -> Result<()> {
        self.request(Command::Close).await
    }
}

/// Scripted input, one JSON object per line: `{"event": "text", "value": "hi"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ComposerEvent {
    Text { value: String },
    FontFamily { value: String },
    FontSize { value: u32 },
    FontColor { value: String },
    Align { value: TextAlign },
    Effect { value: TextEffect },
    BgColor { value: String },
    RandomGradient,
    Preset { index: usize },
    PresetCss { value: String },
    Image { path: Option<PathBuf> },
    ClearImage,
    Download,
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Ok,
    Gradient { css: String },
    Upload { outcome: UploadOutcome },
    Downloaded { download: Download },
    /// The export trigger was disabled
    Busy,
    State { state: Box<ComposerState> },
}
