//! Live filesystem adapter using `std::fs`.

use std::path::Path;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_written_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"coverage").unwrap();

        let fs = LiveFileSystem;
        assert!(fs.exists(&path));
        assert_eq!(fs.read(&path).unwrap(), b"coverage");
    }

    #[test]
    fn missing_file_errors() {
        let fs = LiveFileSystem;
        assert!(!fs.exists(Path::new("/nonexistent/sample.txt")));
        assert!(fs.read(Path::new("/nonexistent/sample.txt")).is_err());
    }
}
