use image::{imageops, Rgba, RgbaImage};

use crate::snapshot::{Snapshot, SnapshotError};

/// Opaque white — the paper color of the drawing surface. The eraser paints
/// with this rather than removing alpha.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Default backing resolution for a blank tab.
pub const DEFAULT_SIZE: u32 = 600;

/// Bounds for the square backing size chosen when an image is imported.
pub const MIN_SIZE: u32 = 300;
pub const MAX_SIZE: u32 = 1200;

/// Placement of an image fitted inside a surface: uniform scale, centered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    pub scale: f32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The single active raster drawing area. Exactly one tab paints onto it at
/// a time; switching tabs repaints it from the target tab's stored snapshot.
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size, size, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Blank the whole surface back to the background color.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = BACKGROUND;
        }
    }

    /// Sample the pixel under a surface-space position, clamped to bounds.
    pub fn sample(&self, x: f32, y: f32) -> Rgba<u8> {
        let cx = (x.max(0.0) as u32).min(self.width().saturating_sub(1));
        let cy = (y.max(0.0) as u32).min(self.height().saturating_sub(1));
        *self.pixels.get_pixel(cx, cy)
    }

    /// Paint one straight segment of a stroke with round caps.
    ///
    /// Dense disc stamping along the segment: each stamp is a hard-edged
    /// filled circle of diameter `width`, so consecutive segments meet in
    /// round joins and rapid move events approximate a smooth freehand line.
    pub fn stroke_segment(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgba<u8>,
        width: f32,
    ) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let distance = (dx * dx + dy * dy).sqrt();
        let radius = (width * 0.5).max(0.5);

        if distance < 0.1 {
            self.stamp_disc(from, radius, color);
            return;
        }

        let steps = distance.ceil() as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp_disc((from.0 + dx * t, from.1 + dy * t), radius, color);
        }
    }

    fn stamp_disc(&mut self, center: (f32, f32), radius: f32, color: Rgba<u8>) {
        let (w, h) = (self.width() as i64, self.height() as i64);
        let min_x = (center.0 - radius).floor() as i64;
        let max_x = (center.0 + radius).ceil() as i64;
        let min_y = (center.1 - radius).floor() as i64;
        let max_y = (center.1 + radius).ceil() as i64;
        let r_sq = radius * radius;

        for y in min_y.max(0)..=max_y.min(h - 1) {
            for x in min_x.max(0)..=max_x.min(w - 1) {
                let ox = x as f32 + 0.5 - center.0;
                let oy = y as f32 + 0.5 - center.1;
                if ox * ox + oy * oy <= r_sq {
                    self.pixels.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Uniform fit-inside placement: scale = min(sw/iw, sh/ih), centered.
    /// Never crops, never distorts the aspect ratio.
    pub fn fit_rect(image: (u32, u32), surface: (u32, u32)) -> FitRect {
        let (iw, ih) = (image.0.max(1), image.1.max(1));
        let scale = (surface.0 as f32 / iw as f32).min(surface.1 as f32 / ih as f32);
        let width = ((iw as f32 * scale).round() as u32).min(surface.0);
        let height = ((ih as f32 * scale).round() as u32).min(surface.1);
        FitRect {
            scale,
            x: (surface.0 - width) / 2,
            y: (surface.1 - height) / 2,
            width,
            height,
        }
    }

    /// Clear the surface and draw `image` fitted inside it.
    pub fn place_fitted(&mut self, image: &RgbaImage) {
        let fit = Self::fit_rect(image.dimensions(), (self.width(), self.height()));
        self.clear();
        if (fit.width, fit.height) == image.dimensions() {
            // Exact fit: copy pixels untouched so restores are lossless.
            imageops::replace(&mut self.pixels, image, fit.x as i64, fit.y as i64);
        } else {
            let scaled =
                imageops::resize(image, fit.width, fit.height, imageops::FilterType::Triangle);
            imageops::replace(&mut self.pixels, &scaled, fit.x as i64, fit.y as i64);
        }
    }

    /// Re-size the backing store for an imported image: a square of the
    /// image's longer side, clamped to [MIN_SIZE, MAX_SIZE]. Contents are
    /// reset to the background; callers repaint afterwards.
    pub fn resize_for_image(&mut self, image_dims: (u32, u32)) {
        let size = image_dims.0.max(image_dims.1).clamp(MIN_SIZE, MAX_SIZE);
        if size != self.width() || size != self.height() {
            self.pixels = RgbaImage::from_pixel(size, size, BACKGROUND);
        }
    }

    /// Capture the current surface content as a snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        Snapshot::encode(&self.pixels)
    }

    /// Repaint the surface from a snapshot. Decoding happens before any pixel
    /// is touched, so a failed decode leaves the surface intact.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let decoded = snapshot.decode()?;
        self.place_fitted(&decoded);
        Ok(())
    }
}
