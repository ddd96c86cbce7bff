//! File naming helpers and directory walking

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::template::TemplateError;

/// Whether `path` ends with `ext`, ignoring case
///
/// An empty or absent extension matches every path.
pub fn has_ext(path: &str, ext: Option<&str>) -> bool {
    match ext {
        None | Some("") => true,
        Some(ext) => path.to_lowercase().ends_with(&ext.to_lowercase()),
    }
}

/// Drop the extension of the last path segment, if any
///
/// Dotfiles such as `.hidden` are left alone.
pub fn strip_ext(path: &str) -> &str {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..segment_start + dot],
    }
}

/// Lexically clean a path: drop `.` components and fold `..` into their parent
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` names one of `list` once both are cleaned
pub fn contains_path(path: &Path, list: &[PathBuf]) -> bool {
    let cleaned = normalize(path);
    list.iter().any(|p| normalize(p) == cleaned)
}

/// A template name that stays inside its directory
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Locate `name` in `dir`, trying the bare name first and then `name + ext`
pub fn find_file(dir: &Path, name: &str, ext: Option<&str>) -> Option<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        return Some(path);
    }
    match ext {
        Some(ext) if !ext.is_empty() => {
            let path = dir.join(format!("{}{}", name, ext));
            path.is_file().then_some(path)
        }
        _ => None,
    }
}

/// Name a fragment after its relative path
pub fn template_name(relative: &str, strip: bool) -> String {
    if strip {
        strip_ext(relative).to_string()
    } else {
        relative.to_string()
    }
}

/// Lazily walk `root` for template files
///
/// Yields `(relative name, path)` pairs in file-name order. The relative name
/// uses `/` separators on every platform. Directories listed in `exclude` are
/// skipped entirely, and files not ending in `ext` are ignored.
pub fn walk_templates<'a>(
    root: &Path,
    exclude: &'a [PathBuf],
    ext: Option<&'a str>,
) -> impl Iterator<Item = Result<(String, PathBuf), TemplateError>> + 'a {
    let base = root.to_path_buf();
    let root_for_filter = root.to_path_buf();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            if e.path() == root_for_filter || !e.file_type().is_dir() {
                return true;
            }
            let skip = contains_path(e.path(), exclude);
            if skip {
                tracing::debug!(dir = %e.path().display(), "skipping excluded directory");
            }
            !skip
        })
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| base.clone());
                    return Some(Err(TemplateError::Io {
                        path,
                        source: err.into(),
                    }));
                }
            };
            if entry.file_type().is_dir() {
                return None;
            }
            let relative = entry.path().strip_prefix(&base).ok()?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !has_ext(&name, ext) {
                return None;
            }
            Some(Ok((name, entry.into_path())))
        })
}
