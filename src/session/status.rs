//! Pipeline stage status tracking
//!
//! One `StatusHub` instance per service tracks the latest state of each
//! pipeline stage and broadcasts every change to subscribers (the HTTP
//! surface streams these to clients). State is per-hub, never global, so
//! tests and multiple service instances cannot observe each other.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Recording,
    Transcription,
    Notes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    #[default]
    NotStarted,
    Started,
    Finished,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub stage: Stage,
    pub state: StageState,
    /// Session the stage was operating on, when applicable.
    pub session: Option<String>,
}

pub struct StatusHub {
    states: Mutex<HashMap<Stage, StageState>>,
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            states: Mutex::new(HashMap::new()),
            tx,
        }
    }

    /// Record a stage transition and notify subscribers.
    pub fn update(&self, stage: Stage, state: StageState, session: Option<&str>) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(stage, state);
        }
        // No subscribers is fine; the state map still advanced.
        let _ = self.tx.send(StatusEvent {
            stage,
            state,
            session: session.map(str::to_string),
        });
    }

    pub fn get(&self, stage: Stage) -> StageState {
        self.states
            .lock()
            .map(|states| states.get(&stage).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HashMap<Stage, StageState> {
        self.states
            .lock()
            .map(|states| states.clone())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}
