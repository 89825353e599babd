//! The persisted-object repository port (spec §6). Schema migration,
//! embedded key-value storage, and CRUD UI are out of scope (spec §1) — this
//! module only defines the trait the core depends on and an in-memory
//! implementation for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::action::Recording;
use crate::error::{Error, Result};

#[async_trait]
pub trait RecordingRepository: Send + Sync {
    async fn save(&self, recording: Recording) -> Result<()>;
    async fn load(&self, id: &str) -> Result<Option<Recording>>;
}

/// In-memory repository, for tests and embedders that don't yet have a
/// persistence backend wired up.
#[derive(Default)]
pub struct InMemoryRecordingRepository {
    recordings: Mutex<HashMap<String, Recording>>,
}

impl InMemoryRecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordingRepository for InMemoryRecordingRepository {
    async fn save(&self, recording: Recording) -> Result<()> {
        let mut guard = self
            .recordings
            .lock()
            .map_err(|_| Error::Internal("recording repository lock poisoned".into()))?;
        guard.insert(recording.id.clone(), recording);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Recording>> {
        let guard = self
            .recordings
            .lock()
            .map_err(|_| Error::Internal("recording repository lock poisoned".into()))?;
        Ok(guard.get(id).cloned())
    }
}
