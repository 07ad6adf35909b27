//! Frame sampling from a live visual source
//!
//! The video feed itself belongs to the surrounding application; the core
//! only reads the current frame through the [`FrameSource`] seam and encodes
//! it for inference.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage, imageops::FilterType};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Still-frame encoding format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// JPEG (what the inference API expects by default)
    #[default]
    Jpeg,
    /// PNG
    Png,
}

impl FrameFormat {
    /// MIME type for multipart upload
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// File name used for the multipart part
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Jpeg => "frame.jpg",
            Self::Png => "frame.png",
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// One raw frame read from a source (RGB8)
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed RGB8 pixel data, `width * height * 3` bytes
    pub pixels: Vec<u8>,
}

/// An encoded still frame ready for inference
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Encoding format
    pub format: FrameFormat,
    /// Encoded width in pixels
    pub width: u32,
    /// Encoded height in pixels
    pub height: u32,
}

/// A live source of video frames owned by the surrounding application
///
/// Read-only from the core's perspective: sampling never mutates the source.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Current source dimensions; (0, 0) while the feed is not ready
    fn dimensions(&self) -> (u32, u32);

    /// Read the current frame
    ///
    /// # Errors
    ///
    /// Returns error if the frame cannot be read
    async fn current_frame(&self) -> Result<RawFrame>;
}

/// Samples and encodes still frames from a [`FrameSource`]
#[derive(Debug, Clone)]
pub struct FrameSampler {
    format: FrameFormat,
    max_dimension: Option<u32>,
}

impl FrameSampler {
    /// Create a sampler with the given encoding configuration
    #[must_use]
    pub fn new(format: FrameFormat, max_dimension: Option<u32>) -> Self {
        Self {
            format,
            max_dimension,
        }
    }

    /// Capture and encode the current frame of `source`
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotReady`] while the source reports zero
    /// dimensions, and [`Error::Encode`] if encoding fails.
    pub async fn capture_frame(&self, source: &dyn FrameSource) -> Result<ImagePayload> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::SourceNotReady(format!(
                "source reports {width}x{height}"
            )));
        }

        let frame = source.current_frame().await?;
        let mut img = RgbImage::from_raw(frame.width, frame.height, frame.pixels)
            .ok_or_else(|| Error::Encode("pixel buffer shorter than dimensions".to_string()))?;

        if let Some(max) = self.max_dimension {
            let (w, h) = (img.width(), img.height());
            if w > max || h > max {
                let scale = f64::from(max) / f64::from(w.max(h));
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let (nw, nh) = (
                    (f64::from(w) * scale).round().max(1.0) as u32,
                    (f64::from(h) * scale).round().max(1.0) as u32,
                );
                img = image::imageops::resize(&img, nw, nh, FilterType::Triangle);
            }
        }

        let (out_width, out_height) = (img.width(), img.height());
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, self.format.image_format())
            .map_err(|e| Error::Encode(e.to_string()))?;

        let payload = ImagePayload {
            bytes: cursor.into_inner(),
            format: self.format,
            width: out_width,
            height: out_height,
        };

        tracing::debug!(
            bytes = payload.bytes.len(),
            width = out_width,
            height = out_height,
            format = ?self.format,
            "frame captured"
        );

        Ok(payload)
    }
}

/// Source backed by a still image file
///
/// Stands in for a live camera feed on hosts without one; the daemon points
/// it at a configured file and serves that image as the current frame.
pub struct StillImageSource {
    frame: RawFrame,
}

impl StillImageSource {
    /// Load a source from an image file on disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or decoded
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| Error::Encode(format!("{}: {e}", path.display())))?
            .to_rgb8();

        tracing::debug!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "still image source loaded"
        );

        Ok(Self {
            frame: RawFrame {
                width: img.width(),
                height: img.height(),
                pixels: img.into_raw(),
            },
        })
    }
}

#[async_trait]
impl FrameSource for StillImageSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    async fn current_frame(&self) -> Result<RawFrame> {
        Ok(self.frame.clone())
    }
}

/// Synthetic gradient source for demos and hardware-free runs
pub struct TestPatternSource {
    width: u32,
    height: u32,
}

impl TestPatternSource {
    /// Create a pattern source with the given dimensions
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl FrameSource for TestPatternSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn current_frame(&self) -> Result<RawFrame> {
        #[allow(clippy::cast_possible_truncation)]
        let pixels = (0..self.height)
            .flat_map(|y| {
                (0..self.width).flat_map(move |x| {
                    let r = (x * 255 / self.width.max(1)) as u8;
                    let g = (y * 255 / self.height.max(1)) as u8;
                    [r, g, 128]
                })
            })
            .collect();

        Ok(RawFrame {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}
