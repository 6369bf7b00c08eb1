use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use std::fmt;
use std::sync::Arc;

/// An opaque still-image capture of a surface at one point in time.
///
/// Snapshots are PNG-encoded and share their byte buffer, so cloning one is
/// cheap — history and redo stacks hold dozens of them per tab.
#[derive(Clone)]
pub struct Snapshot {
    bytes: Arc<Vec<u8>>,
}

impl Snapshot {
    /// Wrap an already-encoded image blob (e.g. a seed supplied by the host).
    pub fn from_encoded(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    /// Encode a pixel buffer into a snapshot.
    pub fn encode(image: &RgbaImage) -> Result<Self, SnapshotError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ColorType::Rgba8,
            )
            .map_err(SnapshotError::Encode)?;
        Ok(Self::from_encoded(bytes))
    }

    /// Decode back into a paintable pixel buffer.
    pub fn decode(&self) -> Result<RgbaImage, SnapshotError> {
        image::load_from_memory(&self.bytes)
            .map(|decoded| decoded.to_rgba8())
            .map_err(SnapshotError::Decode)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Snapshot {}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({} bytes)", self.bytes.len())
    }
}

/// Error type for snapshot encode/decode operations.
#[derive(Debug)]
pub enum SnapshotError {
    Encode(ImageError),
    Decode(ImageError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Encode(e) => write!(f, "Snapshot encode error: {}", e),
            SnapshotError::Decode(e) => write!(f, "Snapshot decode error: {}", e),
        }
    }
}
