use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes the current process id to `path`, removed again on clean shutdown
/// (spec.md §6 "Persisted state: none beyond an optional PID file").
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn write(path: impl AsRef<Path>) -> io::Result<PidFile> {
        let path = path.as_ref().to_path_buf();
        fs::write(&path, std::process::id().to_string())?;
        Ok(PidFile { path })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
