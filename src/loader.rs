use std::path::{Path, PathBuf};

use image::{GrayImage, ImageReader};

use crate::detection::preprocessing;
use crate::error::{PlanktoolError, Result};

/// Extensions searched when the caller gives none
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg"];

/// Load a file as an 8-bit grayscale image
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| PlanktoolError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
    let gray = preprocessing::to_grayscale(&decoded);
    PlanktoolError::check_image(&gray)?;
    Ok(gray)
}

/// Image files below `folder`, sorted by path.
///
/// `depth` limits recursion: 0 lists `folder` only, `None` walks the whole
/// tree. Extensions compare case-insensitively.
pub fn find_images(folder: &Path, extensions: &[&str], depth: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect(folder, extensions, depth, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect(folder: &Path, extensions: &[&str], depth: Option<usize>, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_dir() {
            match depth {
                Some(0) => {}
                Some(d) => collect(&path, extensions, Some(d - 1), out)?,
                None => collect(&path, extensions, None, out)?,
            }
        } else if has_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
}

/// `root` and every directory below it, sorted by path
pub fn directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![root.to_path_buf()];
    let mut idx = 0;
    while idx < dirs.len() {
        let current = dirs[idx].clone();
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        idx += 1;
    }
    dirs.sort();
    Ok(dirs)
}
