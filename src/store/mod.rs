pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::progress::LearnerProgress;
use anyhow::Result;
use disk::DiskProgressStore;
use memory::MemoryProgressStore;
use tracing::warn;

/// Persists learner progress keyed by profile name.
pub trait ProgressStore: Send + Sync {
    fn load(&self, profile: &str) -> Result<Option<LearnerProgress>>;
    fn save(&self, profile: &str, progress: &LearnerProgress) -> Result<()>;
}

/// Opens the on-disk store under the data directory. When that is not
/// possible progress is kept in memory for this run only.
pub fn open_store(config: &AppConfig) -> Box<dyn ProgressStore> {
    let disk = config
        .default_data_path()
        .and_then(|path| DiskProgressStore::open(path.join("progress")));
    match disk {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "Progress will not be saved, using in-memory store");
            Box::new(MemoryProgressStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_uses_data_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = AppConfig {
            data_path: Some(temp_dir.path().to_string_lossy().into_owned()),
            ..AppConfig::default()
        };

        let store = open_store(&config);
        store.save("default", &LearnerProgress::new(200))?;
        drop(store);

        assert!(temp_dir.path().join("progress").exists());
        let reopened = open_store(&config);
        assert_eq!(
            reopened.load("default")?.map(|p| p.xp_to_next_level()),
            Some(200)
        );
        Ok(())
    }
}
