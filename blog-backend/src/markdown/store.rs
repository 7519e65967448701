//! Root-confined CRUD over `.md` content files
//!
//! Callers only ever see logical paths: `/`-separated paths relative to the
//! store root, returned by [`MarkdownStore::save_file`] and handed back
//! unchanged. Every operation that takes one resolves it against the root and
//! runs the safety checks in [`MarkdownStore::is_valid_file_path`] before the
//! filesystem is touched.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::error::{MarkdownError, MarkdownResult};
use super::file_ops;

/// Markdown file store rooted at a single directory
#[derive(Debug, Clone)]
pub struct MarkdownStore {
    root: PathBuf,
}

impl MarkdownStore {
    /// Open a store at `root`, creating the directory (and parents) if missing.
    ///
    /// The root is made absolute and canonical so every later containment
    /// check compares against the same resolved path.
    pub fn new(root: impl AsRef<Path>) -> MarkdownResult<Self> {
        let configured = root.as_ref();
        let display = configured.display().to_string();
        if configured.as_os_str().is_empty() {
            return Err(MarkdownError::InvalidArgument("root directory required"));
        }

        let absolute = if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| MarkdownError::io("resolve root directory", &display, e))?
                .join(configured)
        };
        let absolute = file_ops::normalize(&absolute);

        fs::create_dir_all(&absolute)
            .map_err(|e| MarkdownError::io("create root directory", &display, e))?;
        let root = absolute
            .canonicalize()
            .map_err(|e| MarkdownError::io("resolve root directory", &display, e))?;

        log::info!("[MARKDOWN] Content root: {}", root.display());
        Ok(Self { root })
    }

    /// Get the store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to a new file derived from `filename` and return its logical path.
    ///
    /// The hint is sanitized and suffixed with a timestamp and random component,
    /// so repeated saves of the same hint never overwrite each other.
    pub fn save_file(&self, filename: &str, content: Option<&str>) -> MarkdownResult<String> {
        if filename.trim().is_empty() {
            return Err(MarkdownError::InvalidArgument("filename required"));
        }
        let content = content.unwrap_or_default();

        let filename = file_ops::ensure_md_extension(filename);
        let unique = file_ops::unique_filename(&filename);
        let full_path = self.root.join(&unique);

        if !self.is_valid_file_path(&full_path) {
            return Err(MarkdownError::UnsafePath(unique));
        }

        file_ops::write_atomic(&full_path, content)
            .map_err(|e| MarkdownError::io("save", &unique, e))?;

        let logical = file_ops::relative_path(&self.root, &full_path)
            .ok_or_else(|| MarkdownError::UnsafePath(unique.clone()))?;

        log::debug!("[MARKDOWN] Saved {} ({} bytes)", logical, content.len());
        Ok(logical)
    }

    /// Read the full content of an existing file
    pub fn read_file(&self, path: &str) -> MarkdownResult<String> {
        let full_path = self.resolve(path)?;
        self.existing_file(path, &full_path)?;

        fs::read_to_string(&full_path).map_err(|e| MarkdownError::io("read", path, e))
    }

    /// Replace the content of an existing file. Never creates a file.
    pub fn update_file(&self, path: &str, content: Option<&str>) -> MarkdownResult<()> {
        let full_path = self.resolve(path)?;
        self.existing_file(path, &full_path)?;

        let content = content.unwrap_or_default();
        file_ops::write_atomic(&full_path, content)
            .map_err(|e| MarkdownError::io("update", path, e))?;

        log::debug!("[MARKDOWN] Updated {} ({} bytes)", path, content.len());
        Ok(())
    }

    /// Remove an existing file. Parent directories are left in place.
    pub fn delete_file(&self, path: &str) -> MarkdownResult<()> {
        let full_path = self.resolve(path)?;
        self.existing_file(path, &full_path)?;

        fs::remove_file(&full_path).map_err(|e| MarkdownError::io("delete", path, e))?;

        log::debug!("[MARKDOWN] Deleted {}", path);
        Ok(())
    }

    /// Non-failing probe: false for unsafe paths, missing files and I/O errors.
    pub fn file_exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full_path) => full_path.is_file(),
            Err(_) => false,
        }
    }

    /// Size of an existing file in bytes
    pub fn file_size(&self, path: &str) -> MarkdownResult<u64> {
        let full_path = self.resolve(path)?;
        let metadata = self.existing_file(path, &full_path)?;
        Ok(metadata.len())
    }

    /// Logical paths of every `.md` file under the root, in no particular order
    pub fn list_files(&self) -> MarkdownResult<Vec<String>> {
        let root_display = self.root.display().to_string();
        let files = file_ops::list_markdown(&self.root)
            .map_err(|e| MarkdownError::io("list", root_display, e))?;

        Ok(files
            .into_iter()
            .filter_map(|p| file_ops::relative_path(&self.root, &p))
            .collect())
    }

    /// Resolve a logical path to an absolute path under the root.
    pub fn absolute_path(&self, path: &str) -> MarkdownResult<PathBuf> {
        if path.trim().is_empty() {
            return Err(MarkdownError::InvalidArgument("file path required"));
        }
        Ok(file_ops::normalize(&self.root.join(path)))
    }

    /// Check that `path` (logical or absolute) is a `.md` file confined to the root.
    ///
    /// Rejects `..` segments even when they would fold back inside the root,
    /// any resolved path outside the root, `~` in the root-relative part, and
    /// names without a `.md` extension. An existing target must also stay
    /// inside the root once symlinks are resolved.
    pub fn is_valid_file_path(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return false;
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return false;
        }

        let resolved = file_ops::normalize(&self.root.join(path));
        let relative = match resolved.strip_prefix(&self.root) {
            Ok(r) if !r.as_os_str().is_empty() => r,
            _ => return false,
        };

        if relative.components().any(|c| c == Component::ParentDir)
            || relative.to_string_lossy().contains('~')
        {
            return false;
        }

        let has_md_name = resolved
            .file_name()
            .and_then(|n| n.to_str())
            .map(file_ops::has_md_extension)
            .unwrap_or(false);
        if !has_md_name {
            return false;
        }

        match resolved.canonicalize() {
            Ok(real) => real.starts_with(&self.root),
            Err(_) => true,
        }
    }

    fn resolve(&self, path: &str) -> MarkdownResult<PathBuf> {
        let full_path = self.absolute_path(path)?;
        if !self.is_valid_file_path(path) {
            return Err(MarkdownError::UnsafePath(path.to_string()));
        }
        Ok(full_path)
    }

    fn existing_file(&self, path: &str, full_path: &Path) -> MarkdownResult<fs::Metadata> {
        let metadata = match fs::metadata(full_path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MarkdownError::NotFound(path.to_string()));
            }
            Err(e) => return Err(MarkdownError::io("stat", path, e)),
        };

        if !metadata.is_file() {
            return Err(MarkdownError::io(
                "access",
                path,
                io::Error::new(io::ErrorKind::Other, "not a regular file"),
            ));
        }

        Ok(metadata)
    }
}
