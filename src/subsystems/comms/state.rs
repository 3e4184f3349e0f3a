//! Shared state for the comms subsystem: what handlers are allowed to reach.
//!
//! Handlers receive an `Arc<CommsState>` and only see the typed pieces below:
//! the startup availability snapshot, the status log and the story chain.
//! None of them can fail outward, so handlers never deal with store or model
//! errors.

use crate::bootstrap::probe::{AvailabilityState, Resources};
use crate::subsystems::memory::{StatusLog, StatusRecord};
use crate::subsystems::stories::{GenerationResult, StoryChain};

/// Upper bound on records returned by `GET /api/status`.
pub const LIST_LIMIT: usize = 1000;

pub struct CommsState {
    availability: AvailabilityState,
    status_log: StatusLog,
    stories: StoryChain,
}

impl CommsState {
    pub fn new(resources: Resources) -> Self {
        Self {
            availability: resources.availability,
            status_log: resources.status_log,
            stories: resources.stories,
        }
    }

    /// Flags decided once at startup.
    pub fn availability(&self) -> AvailabilityState {
        self.availability
    }

    pub async fn record_status(&self, client_name: &str) -> StatusRecord {
        self.status_log.insert(client_name).await
    }

    pub async fn list_status(&self) -> Vec<StatusRecord> {
        self.status_log.list_all(LIST_LIMIT).await
    }

    pub async fn generate(&self, prompt: &str, max_length: u32) -> GenerationResult {
        self.stories.resolve(prompt, max_length).await
    }
}
