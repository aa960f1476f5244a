//! Path normalization shared by the engine, builder and watcher
//!
//! Cache keys, dependency edges and watcher events must agree on one
//! spelling of each file, so every path entering the cache goes through
//! [`absolutize`].

use crate::error::{RendrError, RendrResult};
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the working directory and normalize it
pub fn absolutize(path: &Path) -> RendrResult<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd =
        std::env::current_dir().map_err(|e| RendrError::io("getting current directory", e))?;
    Ok(normalize(&cwd.join(path)))
}

/// Resolve `file` relative to `root` (unless already absolute)
pub fn resolve(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        normalize(file)
    } else {
        normalize(&root.join(file))
    }
}

/// Lexically remove `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Forward-slash form, for use inside generated import statements
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Whether any component of `path` is one of `segments`
pub fn has_segment(path: &Path, segments: &[String]) -> bool {
    path.components().any(|c| match c {
        Component::Normal(seg) => {
            let seg = seg.to_string_lossy();
            segments.iter().any(|s| s == seg.as_ref())
        }
        _ => false,
    })
}
