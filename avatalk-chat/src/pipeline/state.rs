//! Pipeline state machine
//!
//! IDLE → TRANSCRIBING → RESPONDING → CLONING → RENDERING → DONE,
//! with DEGRADED reachable from any non-terminal state.

use crate::stages::StageFailure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineState {
    Idle,
    /// Speech recognition
    Transcribing,
    /// Language-model reply
    Responding,
    /// Voice synthesis in the reference voice
    Cloning,
    /// Talking-head render
    Rendering,
    /// Video produced
    Done,
    /// A stage failed; sentinel video returned
    Degraded,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Degraded)
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub run_id: Uuid,
    pub old_state: PipelineState,
    pub new_state: PipelineState,
    pub transitioned_at: DateTime<Utc>,
}

/// Record of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,

    /// Current state
    pub state: PipelineState,

    /// Every state visited, starting with IDLE
    pub states: Vec<PipelineState>,

    /// Final artifact; generated video or the sentinel
    pub outcome: Option<PathBuf>,

    /// Set when the run degraded
    pub failure: Option<StageFailure>,

    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: PipelineState::Idle,
            states: vec![PipelineState::Idle],
            outcome: None,
            failure: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: PipelineState) -> StateTransition {
        let transition = StateTransition {
            run_id: self.run_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.states.push(new_state);

        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    /// Absorb a failure: record it, move to DEGRADED, return the sentinel
    pub fn degrade(&mut self, failure: StageFailure, sentinel: PathBuf) -> StateTransition {
        self.failure = Some(failure);
        self.outcome = Some(sentinel);
        self.transition_to(PipelineState::Degraded)
    }

    pub fn complete(&mut self, video: PathBuf) -> StateTransition {
        self.outcome = Some(video);
        self.transition_to(PipelineState::Done)
    }

    pub fn is_degraded(&self) -> bool {
        self.state == PipelineState::Degraded
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.ended_at.unwrap_or_else(Utc::now) - self.started_at).num_milliseconds()
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
