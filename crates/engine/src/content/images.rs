use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use tracing::warn;

use crate::app::PixelImage;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariantKey {
    key: String,
    width: u32,
    height: u32,
    flip_x: bool,
}

/// Lazily decoded images under one directory, keyed by relative path.
///
/// Load failures are cached as `None` and warned about once per key, so
/// callers can draw a fallback every frame without log spam.
#[derive(Debug)]
pub struct ImageStore {
    image_dir: PathBuf,
    originals: HashMap<String, Option<Arc<PixelImage>>>,
    variants: HashMap<VariantKey, Arc<PixelImage>>,
    warned_keys: HashSet<String>,
}

impl ImageStore {
    pub fn new(image_dir: PathBuf) -> Self {
        Self {
            image_dir,
            originals: HashMap::new(),
            variants: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Registers an already-decoded image, replacing anything cached for `key`.
    pub fn insert(&mut self, key: &str, image: PixelImage) {
        self.variants.retain(|variant, _| variant.key != key);
        self.originals
            .insert(key.to_string(), Some(Arc::new(image)));
    }

    pub fn get(&mut self, key: &str) -> Option<Arc<PixelImage>> {
        if let Some(cached) = self.originals.get(key) {
            return cached.clone();
        }
        let loaded = match resolve_image_path(&self.image_dir, key) {
            Ok(path) => match decode_rgba(&path) {
                Ok(image) => Some(Arc::new(image)),
                Err(reason) => {
                    warn_image_load_once(&mut self.warned_keys, key, Some(&path), &reason);
                    None
                }
            },
            Err(reason) => {
                warn_image_load_once(&mut self.warned_keys, key, None, &reason);
                None
            }
        };
        self.originals.insert(key.to_string(), loaded.clone());
        loaded
    }

    /// Returns `key` resized to exactly `width` x `height`, optionally mirrored.
    pub fn sized(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
        flip_x: bool,
    ) -> Option<Arc<PixelImage>> {
        let variant_key = VariantKey {
            key: key.to_string(),
            width,
            height,
            flip_x,
        };
        if let Some(variant) = self.variants.get(&variant_key) {
            return Some(Arc::clone(variant));
        }
        let original = self.get(key)?;
        let scaled = original.scaled(width, height);
        let variant = Arc::new(if flip_x { scaled.flipped_x() } else { scaled });
        self.variants.insert(variant_key, Arc::clone(&variant));
        Some(variant)
    }
}

fn resolve_image_path(image_dir: &Path, key: &str) -> Result<PathBuf, String> {
    let relative = Path::new(key);
    let is_plain = !key.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !is_plain {
        return Err("invalid_key".to_string());
    }
    Ok(image_dir.join(relative))
}

fn decode_rgba(path: &Path) -> Result<PixelImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    PixelImage::from_rgba(width, height, decoded.into_raw()).ok_or_else(|| "empty_image".to_string())
}

fn warn_image_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        image_key = key,
        path = %path_display,
        reason = reason,
        "image_load_failed_using_fallback"
    );
}

#[cfg(test)]
mod tests {
    use image::{Rgba as ImageRgba, RgbaImage};
    use tempfile::TempDir;

    use super::*;
    use crate::app::Rgba;

    #[test]
    fn missing_image_is_cached_as_none() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = ImageStore::new(temp.path().to_path_buf());

        assert!(store.get("nope.png").is_none());
        assert!(store.get("nope.png").is_none());
        assert_eq!(store.warned_keys.len(), 1);
    }

    #[test]
    fn parent_traversal_keys_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        assert!(resolve_image_path(temp.path(), "../secret.png").is_err());
        assert!(resolve_image_path(temp.path(), "").is_err());
        assert!(resolve_image_path(temp.path(), "map/world.png").is_ok());
    }

    #[test]
    fn decodes_png_from_disk() {
        let temp = TempDir::new().expect("tempdir");
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(1, 0, ImageRgba([10, 20, 30, 255]));
        source
            .save(temp.path().join("tile.png"))
            .expect("save png");

        let mut store = ImageStore::new(temp.path().to_path_buf());
        let image = store.get("tile.png").expect("decoded");

        assert_eq!(image.width(), 2);
        assert_eq!(image.pixel(1, 0), Some(Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn sized_variants_are_scaled_and_mirrored() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = ImageStore::new(temp.path().to_path_buf());
        let mut rgba = Vec::new();
        rgba.extend_from_slice(&Rgba::WHITE.0);
        rgba.extend_from_slice(&Rgba::BLACK.0);
        store.insert("pair", PixelImage::from_rgba(2, 1, rgba).expect("image"));

        let mirrored = store.sized("pair", 4, 4, true).expect("variant");
        assert_eq!(mirrored.width(), 4);
        assert_eq!(mirrored.pixel(0, 0), Some(Rgba::BLACK));
        assert_eq!(mirrored.pixel(3, 3), Some(Rgba::WHITE));

        let again = store.sized("pair", 4, 4, true).expect("cached");
        assert!(Arc::ptr_eq(&mirrored, &again));
    }
}
