//! File discovery and archiving

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::DataFormat;
use crate::error::{PipelineError, PipelineResult};

/// A discovered input file
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Content hash (if computed)
    pub content_hash: Option<String>,
}

impl DiscoveredFile {
    /// Create a new discovered file
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            content_hash: None,
        }
    }

    /// File name as a string
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Compute and cache the SHA-256 of the file contents
    pub fn compute_hash(&mut self) -> PipelineResult<&str> {
        if self.content_hash.is_none() {
            let content = fs::read(&self.path)
                .map_err(|e| PipelineError::io_with_path(&self.path, "hashing file", e))?;
            self.content_hash = Some(format!("{:x}", Sha256::digest(&content)));
        }
        Ok(self.content_hash.as_deref().unwrap_or_default())
    }
}

/// Files in `dir` whose name starts with `prefix` and carries the format's extension
///
/// Results are sorted by path so concatenation order is reproducible.
pub fn discover_files(
    dir: &Path,
    prefix: &str,
    format: DataFormat,
) -> PipelineResult<Vec<DiscoveredFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/{}*.{}",
        glob::Pattern::escape(&dir.display().to_string()),
        glob::Pattern::escape(prefix),
        format.extension()
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| PipelineError::ConfigInvalid(format!("invalid file pattern {pattern}: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                let metadata = fs::metadata(&path)
                    .map_err(|e| PipelineError::io_with_path(&path, "reading metadata", e))?;
                files.push(DiscoveredFile::new(path, metadata.len()));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Error accessing path: {}", e),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// A consumed file moved into an archive directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Archive name: `<stem>_<stamp>.<ext>`
pub fn archived_name(path: &Path, stamp: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    }
}

/// Move a file, falling back to copy + remove across filesystems
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}

/// Move every file into `archive_dir`, suffixing names with the run stamp
///
/// Existing archive entries are never overwritten.
pub fn archive_files<P: AsRef<Path>>(
    files: &[P],
    archive_dir: &Path,
    stamp: &str,
) -> PipelineResult<Vec<ArchiveEntry>> {
    fs::create_dir_all(archive_dir)
        .map_err(|e| PipelineError::io_with_path(archive_dir, "creating archive directory", e))?;

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let source = file.as_ref();
        let destination = archive_dir.join(archived_name(source, stamp));
        if destination.exists() {
            return Err(PipelineError::io_with_path(
                &destination,
                "archiving",
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "archive entry exists"),
            ));
        }
        move_file(source, &destination)
            .map_err(|e| PipelineError::io_with_path(source, "archiving", e))?;
        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            "Archived file"
        );
        entries.push(ArchiveEntry {
            source: source.to_path_buf(),
            destination,
        });
    }
    Ok(entries)
}

/// Create each directory if missing
pub fn ensure_dirs(dirs: &[&Path]) -> PipelineResult<()> {
    for dir in dirs {
        fs::create_dir_all(dir)
            .map_err(|e| PipelineError::io_with_path(*dir, "creating directory", e))?;
    }
    Ok(())
}
