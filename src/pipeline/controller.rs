use std::{
    ffi::OsStr,
    path::Path,
    sync::Arc,
    time::Duration,
};

use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    client::RecognitionApi,
    error::PipelineError,
    history::HistoryStore,
    models::ResultRecord,
    progress::{PipelinePhase, ProgressTracker},
};

/// How long a completed run keeps showing 100% before dropping back to idle.
const RESET_DELAY: Duration = Duration::from_secs(1);

/// The backend rejects anything larger; save the round trip.
const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub run_id: Uuid,
    pub phase: PipelinePhase,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub phase: PipelinePhase,
    pub percent: u8,
    pub error: Option<String>,
    pub result: Option<ResultRecord>,
}

pub type ProgressListener = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Orchestrates one upload -> recognize -> commit run at a time and owns
/// the currently displayed result. Progress updates go out through the
/// injected listener at every phase transition.
#[derive(Clone)]
pub struct PipelineController {
    client: Arc<dyn RecognitionApi>,
    history: Arc<HistoryStore>,
    tracker: Arc<Mutex<ProgressTracker>>,
    current: Arc<Mutex<Option<ResultRecord>>>,
    last_error: Arc<Mutex<Option<String>>>,
    pending_reset: Arc<Mutex<Option<CancellationToken>>>,
    on_progress: ProgressListener,
}

impl PipelineController {
    pub fn new(
        client: Arc<dyn RecognitionApi>,
        history: Arc<HistoryStore>,
        on_progress: ProgressListener,
    ) -> Self {
        Self {
            client,
            history,
            tracker: Arc::new(Mutex::new(ProgressTracker::new())),
            current: Arc::new(Mutex::new(None)),
            last_error: Arc::new(Mutex::new(None)),
            pending_reset: Arc::new(Mutex::new(None)),
            on_progress,
        }
    }

    /// Runs the whole pipeline for one file. Validation failures are
    /// rejected before any network call or tracker movement; only one run
    /// may be in flight at a time.
    pub async fn handle_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ResultRecord, PipelineError> {
        validate_file(file_name, &bytes)?;

        let run_id = Uuid::new_v4();
        {
            let mut tracker = self.tracker.lock().await;
            if tracker.is_active() {
                return Err(PipelineError::Validation(
                    "A recognition run is already in progress".into(),
                ));
            }
            self.cancel_pending_reset().await;
            *self.last_error.lock().await = None;
            *self.current.lock().await = None;
            let percent = tracker.start(run_id);
            self.emit(run_id, tracker.phase(), percent);
        }
        info!("Recognition run {run_id} started for {file_name}");

        match self.run(run_id, file_name, bytes).await {
            Ok(record) => Ok(record),
            Err(err) => {
                {
                    let mut tracker = self.tracker.lock().await;
                    let percent = tracker.fail();
                    self.emit(run_id, tracker.phase(), percent);
                }
                *self.last_error.lock().await = Some(err.message().to_string());
                error!("Recognition run {run_id} failed: {err}");
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        run_id: Uuid,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ResultRecord, PipelineError> {
        let file_id = self.client.upload(file_name, bytes).await?;
        self.advance(run_id, ProgressTracker::uploaded).await;
        self.advance(run_id, ProgressTracker::recognizing).await;

        let data = self.client.recognize(&file_id).await?;
        self.advance(run_id, ProgressTracker::response_received)
            .await;

        let record = ResultRecord::from_recognition(data, file_id, Utc::now());
        *self.current.lock().await = Some(record.clone());

        // Never surfaced to the user; the in-memory history stays usable.
        if let Err(err) = self.history.add(record.clone()) {
            error!("Failed to persist history entry: {err:#}");
        }

        self.advance(run_id, ProgressTracker::succeed).await;
        self.schedule_reset(run_id).await;

        info!(
            "Recognition run {run_id} completed ({})",
            record.document_type.as_str()
        );
        Ok(record)
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        let tracker = self.tracker.lock().await;
        PipelineSnapshot {
            phase: tracker.phase(),
            percent: tracker.percent(),
            error: self.last_error.lock().await.clone(),
            result: self.current.lock().await.clone(),
        }
    }

    pub async fn current_result(&self) -> Option<ResultRecord> {
        self.current.lock().await.clone()
    }

    /// Republishes a past result (from history) as the current one.
    pub async fn select_result(&self, record: ResultRecord) {
        *self.current.lock().await = Some(record);
    }

    async fn advance<F>(&self, run_id: Uuid, transition: F)
    where
        F: FnOnce(&mut ProgressTracker) -> u8,
    {
        let mut tracker = self.tracker.lock().await;
        let percent = transition(&mut tracker);
        self.emit(run_id, tracker.phase(), percent);
    }

    fn emit(&self, run_id: Uuid, phase: PipelinePhase, percent: u8) {
        (self.on_progress)(ProgressUpdate {
            run_id,
            phase,
            percent,
        });
    }

    /// Schedules the delayed Completed -> Idle reset. The token is kept so
    /// a newer run can cancel it; `reset_if_current` guards against a stale
    /// task firing after a new run has already re-entered Uploading.
    async fn schedule_reset(&self, run_id: Uuid) {
        let token = CancellationToken::new();
        {
            let mut guard = self.pending_reset.lock().await;
            if let Some(prior) = guard.take() {
                prior.cancel();
            }
            *guard = Some(token.clone());
        }

        let tracker = self.tracker.clone();
        let on_progress = self.on_progress.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(RESET_DELAY) => {
                    let mut tracker = tracker.lock().await;
                    if tracker.reset_if_current(run_id) {
                        on_progress(ProgressUpdate {
                            run_id,
                            phase: PipelinePhase::Idle,
                            percent: 0,
                        });
                    }
                }
            }
        });
    }

    async fn cancel_pending_reset(&self) {
        if let Some(token) = self.pending_reset.lock().await.take() {
            token.cancel();
        }
    }
}

fn validate_file(file_name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::Validation("No file selected".into()));
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(PipelineError::Validation(
                "Only image files can be recognized".into(),
            ))
        }
    }

    if bytes.len() > MAX_FILE_BYTES {
        return Err(PipelineError::Validation(
            "File exceeds the 10MB size limit".into(),
        ));
    }

    Ok(())
}
