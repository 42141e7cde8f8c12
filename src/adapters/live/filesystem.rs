//! Live filesystem adapter using `std::fs`.

use std::path::{Path, PathBuf};

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Readers see either the old file or the new one, never a partial write.
        let staging = staging_path(path);
        if let Err(err) = std::fs::write(&staging, contents) {
            let _ = std::fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(std::fs::rename(&staging, path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Sibling of `path` that a write is staged in before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let name = path.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_missing_directories_and_overwrites() {
        let dir = std::env::temp_dir().join("ghscout_live_fs_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("store").join("targets.csv");

        LiveFileSystem.write(&path, "first").unwrap();
        LiveFileSystem.write(&path, "second").unwrap();

        assert!(LiveFileSystem.exists(&path));
        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "second");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn overwrite_replaces_the_whole_file_and_leaves_no_staging_file() {
        let dir = std::env::temp_dir().join("ghscout_live_fs_replace_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("targets.csv");
        let long = "alice,1700000000,true,0\n".repeat(500);

        LiveFileSystem.write(&path, &long).unwrap();
        LiveFileSystem.write(&path, "bob,0,false,0\n").unwrap();

        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "bob,0,false,0\n");
        assert!(!staging_path(&path).exists());
        let entries = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_write_leaves_the_previous_file_intact() {
        let dir = std::env::temp_dir().join("ghscout_live_fs_failed_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("targets.csv");
        LiveFileSystem.write(&path, "alice,0,false,0\n").unwrap();
        // A directory squatting on the staging name makes the staged write fail.
        std::fs::create_dir_all(staging_path(&path)).unwrap();

        assert!(LiveFileSystem.write(&path, "bob,0,false,0\n").is_err());
        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "alice,0,false,0\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
