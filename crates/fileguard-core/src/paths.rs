use directories::BaseDirs;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{GuardError, Result};

/// Turn any spelling of a path into the key it is tracked under.
///
/// A leading `~` is expanded to the home directory, relative paths are
/// joined onto the current directory and symlinks are resolved. The path
/// does not have to exist: once a component is missing, the rest is
/// appended lexically, so a deleted file still maps to its old key.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let expanded = expand_home(path.as_ref());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|e| GuardError::read(&expanded, e))?;
        cwd.join(expanded)
    };

    if let Ok(real) = fs::canonicalize(&absolute) {
        return Ok(real);
    }
    Ok(resolve_partial(&absolute))
}

fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

fn resolve_partial(absolute: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    let mut on_disk = true;
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if on_disk {
                    match fs::canonicalize(&resolved) {
                        Ok(real) => resolved = real,
                        Err(_) => on_disk = false,
                    }
                }
            }
        }
    }
    resolved
}
