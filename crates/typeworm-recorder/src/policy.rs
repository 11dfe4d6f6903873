//! Path preconditions, record templates and playback queues
//!
//! Everything here runs before any file is opened for writing or any device
//! is acquired.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use typeworm_core::{Error, Result};

/// Integer placeholder in record session templates
pub const PLACEHOLDER: &str = "%d";

/// Files to play back in order, and where to begin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackQueue {
    pub paths: Vec<PathBuf>,
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    /// Timeline extension, without the dot
    pub extension: String,
}

impl PathPolicy {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    fn require_extension(&self, path: &Path) -> Result<()> {
        if self.has_extension(path) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "file must have a .{} extension: {}",
                self.extension,
                path.display()
            )))
        }
    }

    /// A playback target must exist and carry the extension.
    pub fn check_playback(&self, path: &Path) -> Result<()> {
        self.require_extension(path)?;
        if !path.exists() {
            return Err(Error::precondition(format!(
                "file must exist for playback mode: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// A record target must carry the extension, and may only exist when
    /// overwriting.
    pub fn check_record(&self, path: &Path, overwrite: bool) -> Result<()> {
        self.require_extension(path)?;
        if path.exists() && !overwrite {
            return Err(Error::precondition(format!(
                "file already exists, and the overwrite flag was not set: {}",
                path.display()
            ))
            .with_suggestions(vec!["Pass --overwrite to record over it".to_string()]));
        }
        Ok(())
    }

    /// A record session template has exactly one placeholder, in the file
    /// name, and carries the extension.
    pub fn check_template(&self, template: &Path) -> Result<()> {
        let text = template.to_str().ok_or_else(|| {
            Error::invalid_argument(format!("path must be valid UTF-8: {}", template.display()))
        })?;
        if let Some(parent) = template.parent().and_then(Path::to_str) {
            if parent.contains(PLACEHOLDER) {
                return Err(Error::invalid_argument(
                    "file parent directories cannot include format specifiers",
                ));
            }
        }
        let name = template
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid_argument(format!("path has no file name: {}", text)))?;
        match name.matches(PLACEHOLDER).count() {
            1 => {}
            0 => {
                return Err(Error::invalid_argument(format!(
                    "file name must include one {} integer format specifier in session mode",
                    PLACEHOLDER
                ))
                .with_suggestions(vec![format!("e.g. --path out_{}.{}", PLACEHOLDER, self.extension)]))
            }
            _ => {
                return Err(Error::invalid_argument(
                    "file name cannot include more than one integer format specifier",
                ))
            }
        }
        self.require_extension(template)
    }

    /// Substitute `index` for the placeholder
    pub fn render_template(&self, template: &Path, index: usize) -> PathBuf {
        PathBuf::from(
            template
                .to_string_lossy()
                .replacen(PLACEHOLDER, &index.to_string(), 1),
        )
    }

    /// Build the playback session queue.
    ///
    /// A directory is the queue root and starts at its first file. A file
    /// starts the queue formed by its directory at its own position.
    pub fn discover_queue(&self, path: &Path) -> Result<PlaybackQueue> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::precondition(format!(
                "path must exist for playback mode: {}",
                path.display()
            )),
            _ => Error::io("inspect", path, e),
        })?;

        if meta.is_dir() {
            let paths = self.list_dir(path)?;
            if paths.is_empty() {
                return Err(Error::precondition(format!(
                    "directory contains no .{} files: {}",
                    self.extension,
                    path.display()
                )));
            }
            return Ok(PlaybackQueue { paths, start: 0 });
        }

        self.require_extension(path)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let paths = self.list_dir(&dir)?;
        let target = match path.file_name() {
            Some(name) => dir.join(name),
            None => path.to_path_buf(),
        };
        let start = paths.iter().position(|p| *p == target).ok_or_else(|| {
            Error::invalid_argument(format!(
                "file is not part of the playback queue of {}: {}",
                dir.display(),
                path.display()
            ))
        })?;
        Ok(PlaybackQueue { paths, start })
    }

    /// Files directly in `dir` with the extension, sorted by path string
    pub fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io("list", dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("list", dir, e))?;
            let path = entry.path();
            if path.is_file() && self.has_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        Ok(paths)
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new("tw")
    }
}
