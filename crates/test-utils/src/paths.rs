//! Path utilities for test output.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// All files under `root` with the given extension, sorted.
pub fn files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}

/// Path of a tile under a pyramid root.
pub fn tile_path(root: &Path, ramp: &str, layer: &str, z: u32, x: u32, y: u32) -> PathBuf {
    root.join(ramp)
        .join(layer)
        .join(z.to_string())
        .join(x.to_string())
        .join(format!("{}.png", y))
}
