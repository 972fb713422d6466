use super::ProgressStore;
use crate::core::progress::LearnerProgress;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Progress kept for the lifetime of the process only
#[derive(Default)]
pub struct MemoryProgressStore {
    inner: RwLock<HashMap<String, LearnerProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, profile: &str) -> Result<Option<LearnerProgress>> {
        let profiles = self
            .inner
            .read()
            .map_err(|_| anyhow!("Progress store lock poisoned"))?;
        debug!(profile, found = profiles.contains_key(profile), "Progress LOAD");
        Ok(profiles.get(profile).cloned())
    }

    fn save(&self, profile: &str, progress: &LearnerProgress) -> Result<()> {
        let mut profiles = self
            .inner
            .write()
            .map_err(|_| anyhow!("Progress store lock poisoned"))?;
        debug!(profile, "Progress SAVE");
        profiles.insert(profile.to_string(), progress.clone());
        Ok(())
    }
}
