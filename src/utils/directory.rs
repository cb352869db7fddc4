use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursive walk below `root`. Symlinks are reported as entries, never followed.
pub fn walk_source_tree(root: &Path) -> walkdir::IntoIter {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
}

/// `destination_root / namespace / (source_path relative to source_root)`.
///
/// Returns `None` when `source_path` is not below `source_root`.
pub fn destination_path_for(
    source_root: &Path,
    namespace: &OsStr,
    destination_root: &Path,
    source_path: &Path,
) -> Option<PathBuf> {
    let relative = source_path.strip_prefix(source_root).ok()?;
    Some(destination_root.join(namespace).join(relative))
}
