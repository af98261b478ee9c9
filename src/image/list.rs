//! Discovery of bundled test images.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Index of the image chosen when the caller does not name one.
pub const DEFAULT_PICK_INDEX: usize = 10;

/// List the `.jpg` images of a directory, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or holds no `.jpg` files.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_jpg(&path) {
            images.push(path);
        }
    }

    if images.is_empty() {
        return Err(Error::NoImages {
            path: dir.to_path_buf(),
        });
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Select one image from a sorted listing.
///
/// A `name` selects the entry with that file name. Without one, the entry at
/// [`DEFAULT_PICK_INDEX`] is used, or the first entry for shorter listings.
///
/// # Errors
///
/// Returns an error if `name` matches no entry or the listing is empty.
pub fn pick_image<'a>(images: &'a [PathBuf], name: Option<&str>) -> Result<&'a Path> {
    let picked = match name {
        Some(name) => images
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(name)),
        None => images.get(DEFAULT_PICK_INDEX).or_else(|| images.first()),
    };

    picked.map(PathBuf::as_path).ok_or_else(|| Error::InvalidParameter {
        name: "pick".to_string(),
        reason: match name {
            Some(name) => format!("no image named {name}"),
            None => "image listing is empty".to_string(),
        },
    })
}

fn is_jpg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))
}
