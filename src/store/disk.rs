use super::ProgressStore;
use crate::core::progress::LearnerProgress;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "progress";

/// Progress stored as JSON in a `fjall` partition, one key per profile.
pub struct DiskProgressStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskProgressStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open progress store: {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open progress partition")?;
        debug!("Opened progress store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl ProgressStore for DiskProgressStore {
    fn load(&self, profile: &str) -> Result<Option<LearnerProgress>> {
        let Some(value) = self
            .partition
            .get(profile)
            .with_context(|| format!("Failed to read progress for {profile}"))?
        else {
            debug!(profile, "Progress MISS");
            return Ok(None);
        };
        let progress = serde_json::from_slice(&value)
            .with_context(|| format!("Corrupt progress record for {profile}"))?;
        debug!(profile, "Progress HIT");
        Ok(Some(progress))
    }

    fn save(&self, profile: &str, progress: &LearnerProgress) -> Result<()> {
        let value = serde_json::to_vec(progress)?;
        self.partition
            .insert(profile, value)
            .with_context(|| format!("Failed to write progress for {profile}"))?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush progress store")?;
        debug!(profile, "Progress SAVE");
        Ok(())
    }
}
