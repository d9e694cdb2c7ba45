use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` components and drops trailing separators.
/// `..` never climbs above the first component.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(parent) = result.parent() {
                    result = parent.to_path_buf();
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Maps an entry name (`hello.txt`, `/docs/a.txt`, `./b/../c`) to the key stored in the
/// zip central directory: slash-separated, without the leading `/`.
/// Returns `None` when the name resolves to the archive root.
pub fn entry_key(name: &str) -> Option<String> {
    let rooted = normalize(Path::new("/").join(name.trim_start_matches('/')));
    let parts: Vec<_> = rooted
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Slash-rooted form of a stored key, as reported to callers.
pub fn rooted(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}

/// Directory that receives the staging file for an atomic replace of `path`.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Removes a file, a symlink or an empty directory on the host.
pub fn rm_on_host<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let path = path.as_ref();
    if std::fs::symlink_metadata(path)?.is_dir() {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    }
}
