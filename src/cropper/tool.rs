use crate::geometry::DisplayPoint;
use crate::worker::{spawn_worker_action, WorkerPoll, WorkerTicket};

use super::error::{CropError, CropResult, WorkerJob};
use super::output::{EncodedImage, SourceImage};
use super::render::{CropStyle, CropSurface};
use super::session::CropSession;
use super::CropSettings;

/// What the host hears back from the tool.
#[derive(Debug)]
pub enum CropOutcome {
    Confirmed(EncodedImage),
    Cancelled,
    Failed(CropError),
}

type OutcomeCallback = Box<dyn FnMut(CropOutcome)>;

#[derive(Debug)]
enum PendingJob {
    Decode(WorkerTicket<CropResult<SourceImage>>),
    Encode(WorkerTicket<CropResult<EncodedImage>>),
}

impl PendingJob {
    const fn kind(&self) -> WorkerJob {
        match self {
            Self::Decode(_) => WorkerJob::Decode,
            Self::Encode(_) => WorkerJob::Encode,
        }
    }
}

/// Modal crop tool: owns the drawing surface, at most one open session and
/// at most one background job.
pub struct CropTool<S: CropSurface> {
    settings: CropSettings,
    style: CropStyle,
    surface: S,
    session: Option<CropSession>,
    pending: Option<PendingJob>,
    on_outcome: OutcomeCallback,
}

impl<S: CropSurface> CropTool<S> {
    pub fn new(
        settings: CropSettings,
        surface: S,
        on_outcome: impl FnMut(CropOutcome) + 'static,
    ) -> Self {
        let style = CropStyle {
            handle_size: settings.hit_zone.handle_size,
            ..CropStyle::default()
        };
        Self {
            settings,
            style,
            surface,
            session: None,
            pending: None,
            on_outcome: Box::new(on_outcome),
        }
    }

    pub fn with_style(mut self, style: CropStyle) -> Self {
        self.style = style;
        self
    }

    pub fn settings(&self) -> &CropSettings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// True while a background confirm is encoding. The crop is frozen until
    /// the job finishes or is cancelled.
    pub fn is_confirming(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|job| job.kind() == WorkerJob::Encode)
    }

    fn notify(&mut self, outcome: CropOutcome) {
        match &outcome {
            CropOutcome::Confirmed(image) => tracing::info!(
                width = image.width,
                height = image.height,
                bytes = image.bytes.len(),
                "crop confirmed"
            ),
            CropOutcome::Cancelled => tracing::info!("crop cancelled"),
            CropOutcome::Failed(err) => tracing::warn!(%err, "crop tool failure"),
        }
        (self.on_outcome)(outcome);
    }

    fn install_session(&mut self, session: CropSession) {
        self.surface.resize(session.display());
        session.render(&mut self.surface, &self.style);
        self.session = Some(session);
    }

    fn redraw(&mut self) {
        if let Some(session) = &self.session {
            session.render(&mut self.surface, &self.style);
        }
    }

    /// Decodes `bytes` on the calling thread and opens a fresh session.
    ///
    /// Any open session or pending job is discarded first. Returns false and
    /// reports `DecodeFailure` when the bytes are not an image.
    pub fn open(&mut self, bytes: &[u8]) -> bool {
        self.pending = None;
        self.session = None;
        match CropSession::open(bytes, &self.settings) {
            Ok(session) => {
                self.install_session(session);
                true
            }
            Err(err) => {
                self.notify(CropOutcome::Failed(err));
                false
            }
        }
    }

    /// Starts decoding in the background; finish with [`CropTool::poll`].
    pub fn begin_open(&mut self, bytes: Vec<u8>) {
        self.session = None;
        self.pending = Some(PendingJob::Decode(spawn_worker_action(
            WorkerJob::Decode.label(),
            move || SourceImage::decode(&bytes),
        )));
    }

    pub fn pointer_down(&mut self, pointer: DisplayPoint) -> bool {
        if self.is_confirming() {
            tracing::debug!("pointer down ignored while confirming");
            return false;
        }
        self.session
            .as_mut()
            .is_some_and(|session| session.pointer_down(pointer))
    }

    /// Applies a drag step and redraws when the crop changed.
    pub fn pointer_move(&mut self, pointer: DisplayPoint) -> bool {
        if self.is_confirming() {
            return false;
        }
        let changed = self
            .session
            .as_mut()
            .is_some_and(|session| session.pointer_move(pointer));
        if changed {
            self.redraw();
        }
        changed
    }

    pub fn pointer_up(&mut self) -> bool {
        self.session.as_mut().is_some_and(CropSession::pointer_up)
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.session.as_mut().is_some_and(CropSession::pointer_leave)
    }

    /// Encodes the current crop and closes the tool on success.
    ///
    /// On failure the session stays open so the user can adjust and retry.
    pub fn confirm(&mut self) -> bool {
        let Some(session) = &self.session else {
            self.notify(CropOutcome::Failed(CropError::NoActiveSession));
            return false;
        };
        match session.confirm() {
            Ok(image) => {
                self.session = None;
                self.pending = None;
                self.notify(CropOutcome::Confirmed(image));
                true
            }
            Err(err) => {
                self.notify(CropOutcome::Failed(err));
                false
            }
        }
    }

    /// Starts encoding the current crop in the background.
    ///
    /// Pointer input is ignored until [`CropTool::poll`] delivers the result,
    /// so the encoded image always matches the crop on screen.
    pub fn begin_confirm(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            self.notify(CropOutcome::Failed(CropError::NoActiveSession));
            return false;
        };
        session.pointer_up();
        let job = session.encode_job();
        self.pending = Some(PendingJob::Encode(spawn_worker_action(
            WorkerJob::Encode.label(),
            job,
        )));
        true
    }

    /// Drops the session and any pending job. A late background result is
    /// ignored.
    pub fn cancel(&mut self) -> bool {
        let had_work = self.session.take().is_some() | self.pending.take().is_some();
        if had_work {
            self.notify(CropOutcome::Cancelled);
        }
        had_work
    }

    /// Drives the pending background job. Returns true when it finished.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let kind = pending.kind();

        match pending {
            PendingJob::Decode(ticket) => match ticket.poll() {
                WorkerPoll::Pending => {
                    self.pending = Some(PendingJob::Decode(ticket));
                    false
                }
                WorkerPoll::Ready(Ok(source)) => {
                    let session = CropSession::from_source(source, &self.settings);
                    self.install_session(session);
                    true
                }
                WorkerPoll::Ready(Err(err)) => {
                    self.notify(CropOutcome::Failed(err));
                    true
                }
                WorkerPoll::Lost => {
                    self.notify(CropOutcome::Failed(CropError::WorkerStopped(kind)));
                    true
                }
            },
            PendingJob::Encode(ticket) => match ticket.poll() {
                WorkerPoll::Pending => {
                    self.pending = Some(PendingJob::Encode(ticket));
                    false
                }
                WorkerPoll::Ready(Ok(image)) => {
                    self.session = None;
                    self.notify(CropOutcome::Confirmed(image));
                    true
                }
                WorkerPoll::Ready(Err(err)) => {
                    self.notify(CropOutcome::Failed(err));
                    true
                }
                WorkerPoll::Lost => {
                    self.notify(CropOutcome::Failed(CropError::WorkerStopped(kind)));
                    true
                }
            },
        }
    }
}
