use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stages of one pipeline run, each mapped to a fixed progress percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PipelinePhase {
    Idle,
    Uploading,
    Uploaded,
    Recognizing,
    Completed,
    Failed,
}

impl PipelinePhase {
    pub fn percent(self) -> u8 {
        match self {
            PipelinePhase::Idle => 0,
            PipelinePhase::Uploading => 10,
            PipelinePhase::Uploaded => 30,
            PipelinePhase::Recognizing => 50,
            PipelinePhase::Completed => 100,
            PipelinePhase::Failed => 0,
        }
    }
}

/// Progress state machine for a single run. The percent can diverge from
/// the phase's base value once within Recognizing: 80 marks "response
/// received, not yet committed".
///
/// Invoking a transition from an unexpected state is a programming error:
/// it panics in test builds via `debug_assert!` and is a no-op returning
/// the current percent in release builds.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    phase: PipelinePhase,
    percent: u8,
    run_id: Option<Uuid>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Idle,
            percent: 0,
            run_id: None,
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// True while a run is in flight. Completed is not active: the pipeline
    /// is done and only the delayed reset is pending.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            PipelinePhase::Uploading | PipelinePhase::Uploaded | PipelinePhase::Recognizing
        )
    }

    pub fn start(&mut self, run_id: Uuid) -> u8 {
        debug_assert!(
            !self.is_active(),
            "invalid transition: start from {:?}",
            self.phase
        );
        if !self.is_active() {
            self.phase = PipelinePhase::Uploading;
            self.percent = self.phase.percent();
            self.run_id = Some(run_id);
        }
        self.percent
    }

    pub fn uploaded(&mut self) -> u8 {
        self.advance(PipelinePhase::Uploading, PipelinePhase::Uploaded, 30)
    }

    pub fn recognizing(&mut self) -> u8 {
        self.advance(PipelinePhase::Uploaded, PipelinePhase::Recognizing, 50)
    }

    /// The recognize response arrived but the result is not committed yet.
    pub fn response_received(&mut self) -> u8 {
        self.advance(PipelinePhase::Recognizing, PipelinePhase::Recognizing, 80)
    }

    pub fn succeed(&mut self) -> u8 {
        self.advance(PipelinePhase::Recognizing, PipelinePhase::Completed, 100)
    }

    /// Any in-flight failure drops straight to Failed at 0%, no delay.
    pub fn fail(&mut self) -> u8 {
        debug_assert!(
            self.is_active(),
            "invalid transition: fail from {:?}",
            self.phase
        );
        if self.is_active() {
            self.phase = PipelinePhase::Failed;
            self.percent = 0;
        }
        self.percent
    }

    /// Returns to Idle only if the completed run is still the current one;
    /// a stale reset after a newer run has started is a no-op.
    pub fn reset_if_current(&mut self, run_id: Uuid) -> bool {
        if self.phase == PipelinePhase::Completed && self.run_id == Some(run_id) {
            self.phase = PipelinePhase::Idle;
            self.percent = 0;
            true
        } else {
            false
        }
    }

    fn advance(&mut self, expected: PipelinePhase, next: PipelinePhase, percent: u8) -> u8 {
        debug_assert!(
            self.phase == expected,
            "invalid transition: {:?} -> {next:?}",
            self.phase
        );
        if self.phase == expected {
            self.phase = next;
            self.percent = percent;
        }
        self.percent
    }
}
