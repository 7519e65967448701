//! File operations for the markdown store
//!
//! Filename derivation, lexical path normalization, crash-safe writes and
//! recursive listing of `.md` files.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::Local;
use uuid::Uuid;
use walkdir::WalkDir;

pub const MARKDOWN_EXTENSION: &str = ".md";

/// Timestamp layout embedded in generated filenames (second resolution).
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of the random hex suffix in generated filenames.
const RANDOM_SUFFIX_LEN: usize = 8;

/// True if `name` ends in `.md`, ignoring ASCII case.
pub fn has_md_extension(name: &str) -> bool {
    strip_md_extension(name).is_some()
}

/// Return `name` without a trailing `.md` (any case), or `None` if it has none.
pub fn strip_md_extension(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(MARKDOWN_EXTENSION.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = name.split_at(split);
    ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION).then_some(stem)
}

/// Append `.md` unless the name already ends with it.
pub fn ensure_md_extension(name: &str) -> String {
    if has_md_extension(name) {
        name.to_string()
    } else {
        format!("{}{}", name, MARKDOWN_EXTENSION)
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive a collision-resistant filename from a caller-supplied hint
/// (e.g. "My Post.md" -> "My_Post_20240101_120000_1a2b3c4d.md").
pub fn unique_filename(hint: &str) -> String {
    let stem = strip_md_extension(hint).unwrap_or(hint);
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}{}",
        sanitize_stem(stem),
        timestamp,
        &random[..RANDOM_SUFFIX_LEN],
        MARKDOWN_EXTENSION
    )
}

/// Lexically normalize a path: drop `.` segments and fold `..` into their parent.
/// Does not touch the filesystem, so it works for paths that do not exist yet.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

/// Root-relative path of `file_path`, joined with `/` on every platform.
pub fn relative_path(root: &Path, file_path: &Path) -> Option<String> {
    let relative = file_path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Replace the file at `path` with `content` (creates parent directories as needed).
///
/// The bytes go to a temp file in the same directory which is then renamed over
/// the target, so a failure leaves the previous content (or no file) behind.
/// An existing target keeps its permissions and a read-only one is refused.
/// New files get 0644 less the umask.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;
    fs::create_dir_all(parent)?;

    let existing = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };
    if existing.as_ref().is_some_and(|p| p.readonly()) {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "target file is read-only",
        ));
    }

    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder.tempfile_in(parent)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// List every regular `.md` file under `root` (recursively).
pub fn list_markdown(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .map(has_md_extension)
            .unwrap_or(false)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
