use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use crate::error::Error;
use crate::frame::Frame;
use crate::rgba::image_from_frame_with;
use crate::types::ConvertConfig;

/// Configuration for a [`FramePreview`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub convert: ConvertConfig,
    /// Convert only every n-th submitted frame.
    pub every_nth: NonZeroU32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            convert: ConvertConfig::default(),
            every_nth: NonZeroU32::MIN,
        }
    }
}

/// Holds the most recent converted frame for display.
///
/// Frames are submitted from whichever thread delivers them and read from
/// another. While publishing is off, submitted frames are only counted, so
/// an unwatched preview costs nothing per frame.
#[derive(Debug)]
pub struct FramePreview {
    config: PreviewConfig,
    publishing: AtomicBool,
    submitted: AtomicU64,
    published: AtomicU64,
    latest: Mutex<Option<Arc<RgbaImage>>>,
}

impl Default for FramePreview {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

impl FramePreview {
    /// Create a preview. Publishing starts off.
    pub fn new(config: PreviewConfig) -> Self {
        FramePreview {
            config,
            publishing: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            published: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Turn conversion of submitted frames on or off. The latest image is
    /// kept when publishing stops; call [`clear`](Self::clear) to drop it.
    pub fn set_publishing(&self, publishing: bool) {
        let was = self.publishing.swap(publishing, Ordering::AcqRel);
        if was != publishing {
            tracing::debug!(publishing, "frame preview toggled");
        }
    }

    pub fn is_publishing(&self) -> bool {
        self.publishing.load(Ordering::Acquire)
    }

    /// Offer a frame to the preview.
    ///
    /// Returns the newly published image, or `None` when the frame was
    /// skipped. A frame that fails to convert leaves the previous image in
    /// place.
    pub fn submit<F: Frame + ?Sized>(&self, frame: &F) -> Result<Option<Arc<RgbaImage>>, Error> {
        let n = self.submitted.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if !self.is_publishing() || n % u64::from(self.config.every_nth.get()) != 0 {
            return Ok(None);
        }

        let image = Arc::new(image_from_frame_with(frame, &self.config.convert)?);
        if let Ok(mut guard) = self.latest.lock() {
            *guard = Some(Arc::clone(&image));
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(Some(image))
    }

    /// The most recently published image.
    pub fn latest(&self) -> Option<Arc<RgbaImage>> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.latest.lock() {
            *guard = None;
        }
    }

    /// Number of frames offered through [`submit`](Self::submit), published or not.
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
