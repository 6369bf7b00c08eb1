use image::RgbaImage;
use rfd::FileDialog;
use std::path::Path;

use crate::{log_info, log_warn};

/// Load an image file and normalize it to RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Failed to load {}: {}", path.display(), e))
}

/// Open a native file dialog and load the chosen reference image.
/// Returns `None` on cancel or load failure; failures are logged, never fatal.
pub fn pick_reference_image() -> Option<RgbaImage> {
    let path = FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
        .add_filter("All Files", &["*"])
        .pick_file()?;

    match load_image(&path) {
        Ok(img) => {
            log_info!("Loaded reference image {}", path.display());
            Some(img)
        }
        Err(e) => {
            log_warn!("{}", e);
            None
        }
    }
}

/// Try to read an image from the system clipboard.
///
/// Two cases: raw image data (copied from another editor or a screenshot),
/// or text content that happens to be a valid image file path.
pub fn clipboard_image() -> Option<RgbaImage> {
    if let Ok(mut clip) = arboard::Clipboard::new() {
        // arboard hands back ImageData { width, height, bytes } in RGBA order.
        if let Ok(data) = clip.get_image() {
            if let Some(img) = RgbaImage::from_raw(
                data.width as u32,
                data.height as u32,
                data.bytes.into_owned(),
            ) {
                return Some(img);
            }
        }
    }

    if let Ok(mut clip) = arboard::Clipboard::new() {
        if let Ok(text) = clip.get_text() {
            let path = Path::new(text.trim());
            if path.is_file() {
                if let Ok(img) = load_image(path) {
                    return Some(img);
                }
            }
        }
    }

    None
}
