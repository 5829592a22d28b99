//! Filesystem assertions for collection folders

use std::path::Path;

/// File names in `folder` with the given extension, sorted
pub fn files_with_extension(folder: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Every entry directly in `folder`, sorted
pub fn folder_entries(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Assert that `root` holds nothing but hidden scratch entries (or does not exist)
pub fn assert_no_collections(root: &Path) {
    if !root.exists() {
        return;
    }
    let visible: Vec<String> = folder_entries(root)
        .into_iter()
        .filter(|name| !name.starts_with('.'))
        .collect();
    assert!(visible.is_empty(), "unexpected output in {}: {:?}", root.display(), visible);
}
