//! Size-based log file rotation

use crate::logger::config::RotationConfig;
use jiff::Zoned;
use std::fs;
use std::path::{Path, PathBuf};

/// Decides when the active log file rotates and prunes old rotations
pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    /// Move the active file aside and drop rotations beyond `max_files`
    pub fn rotate(&self, current_path: &Path) -> anyhow::Result<()> {
        let rotated_path = rotated_path(current_path);

        if current_path.exists() {
            fs::rename(current_path, &rotated_path)?;
        }

        self.cleanup_old_files(current_path)
    }

    fn cleanup_old_files(&self, base_path: &Path) -> anyhow::Result<()> {
        let parent = match base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let stem = base_path.file_stem().unwrap_or_default().to_string_lossy();

        let mut rotated_files: Vec<PathBuf> = fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let file_name = path.file_name().unwrap_or_default().to_string_lossy();
                file_name.starts_with(&*stem) && path.as_path() != base_path
            })
            .collect();

        // Oldest first
        rotated_files.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());

        while rotated_files.len() > self.config.max_files {
            let oldest = rotated_files.remove(0);
            fs::remove_file(oldest)?;
        }

        Ok(())
    }
}

fn rotated_path(base_path: &Path) -> PathBuf {
    let timestamp = Zoned::now().strftime("%Y%m%d_%H%M%S_%f");
    let stem = base_path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = base_path.extension().unwrap_or_default().to_string_lossy();

    let new_name = if ext.is_empty() {
        format!("{}.{}", stem, timestamp)
    } else {
        format!("{}.{}.{}", stem, timestamp, ext)
    };

    base_path.with_file_name(new_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_should_rotate_by_size() {
        let manager = RotationManager::new(RotationConfig {
            max_size: 100,
            max_files: 3,
        });
        assert!(!manager.should_rotate(99));
        assert!(manager.should_rotate(100));
        assert!(manager.should_rotate(1000));
    }

    #[test]
    fn test_rotate_moves_active_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("app.log");
        fs::write(&log_path, "line\n").unwrap();

        let manager = RotationManager::new(RotationConfig {
            max_size: 1,
            max_files: 3,
        });
        manager.rotate(&log_path).unwrap();

        assert!(!log_path.exists());
        let rotated: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(rotated.len(), 1);
    }

    #[test]
    fn test_cleanup_keeps_at_most_max_files() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("app.log");
        for i in 0..5 {
            fs::write(dir.path().join(format!("app.2024010{}_000000.log", i)), "x").unwrap();
        }

        let manager = RotationManager::new(RotationConfig {
            max_size: 1,
            max_files: 2,
        });
        manager.rotate(&log_path).unwrap();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }
}
