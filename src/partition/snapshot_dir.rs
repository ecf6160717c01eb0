//! Partition snapshot directory check
//!
//! The losing side of a split takes a snapshot before it stops. That only
//! works if the configured directory is usable, so it is verified up front:
//! - it exists
//! - it is a directory
//! - a probe file can be created and removed in it

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Why the snapshot directory cannot be used.
#[derive(Debug, Error)]
pub enum SnapshotDirError {
    /// No path configured while partition detection is on
    #[error("partition detection is enabled but no snapshot path is configured")]
    NotConfigured,

    /// Path does not exist
    #[error("partition snapshot path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("partition snapshot path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Probe file could not be written or removed
    #[error("partition snapshot directory is not writable: {}", .path.display())]
    NotWritable {
        /// Directory being checked
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Verify that `dir` can receive a partition snapshot.
pub fn test_partition_detection_directory(dir: &Path) -> Result<(), SnapshotDirError> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SnapshotDirError::NotFound(dir.to_path_buf()));
        }
        Err(source) => {
            return Err(SnapshotDirError::NotWritable {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(SnapshotDirError::NotADirectory(dir.to_path_buf()));
    }

    let probe = dir.join(format!(".faultline-probe-{}", Uuid::new_v4()));
    let not_writable = |source| SnapshotDirError::NotWritable {
        path: dir.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(not_writable)?;
    let written = file.write_all(b"probe").and_then(|_| file.sync_all());
    drop(file);
    let removed = fs::remove_file(&probe);

    written.map_err(not_writable)?;
    removed.map_err(not_writable)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writable_directory_passes_and_leaves_no_probe() {
        let dir = TempDir::new().unwrap();

        test_partition_detection_directory(dir.path()).unwrap();

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = test_partition_detection_directory(&missing).unwrap_err();
        assert!(matches!(err, SnapshotDirError::NotFound(p) if p == missing));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("snapshot");
        fs::write(&file, b"x").unwrap();

        let err = test_partition_detection_directory(&file).unwrap_err();
        assert!(matches!(err, SnapshotDirError::NotADirectory(_)));
    }
}
