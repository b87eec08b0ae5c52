use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

pub(super) struct LoadedImage {
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) rgba: Vec<u8>,
}

/// Decoded RGBA images keyed by path. Failed loads are cached as `None` and
/// reported once.
#[derive(Default)]
pub(super) struct ImageCache {
    images: HashMap<PathBuf, Option<LoadedImage>>,
    warned_paths: HashSet<PathBuf>,
}

impl ImageCache {
    pub(super) fn get_or_load(&mut self, path: &Path) -> Option<&LoadedImage> {
        if !self.images.contains_key(path) {
            let loaded = match load_image_rgba(path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    self.warn_once(path, &reason);
                    None
                }
            };
            self.images.insert(path.to_path_buf(), loaded);
        }
        self.images.get(path).and_then(Option::as_ref)
    }

    /// Reports an image that could not be resolved to a path at all.
    pub(super) fn warn_unresolved(&mut self, name: &str, reason: &str) {
        self.warn_once(Path::new(name), reason);
    }

    fn warn_once(&mut self, path: &Path, reason: &str) {
        if !self.warned_paths.insert(path.to_path_buf()) {
            return;
        }
        warn!(
            path = %path.display(),
            reason = reason,
            "renderer_image_load_failed_using_placeholder"
        );
    }

    #[cfg(test)]
    fn warned_count(&self) -> usize {
        self.warned_paths.len()
    }
}

fn load_image_rgba(path: &Path) -> Result<LoadedImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
