use arrayvec::ArrayVec;

use crate::error::{BufferError, Error};
use crate::types::{ColorRange, MAX_PLANES, PixelFormat, Size};

/// A single plane of image data.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub bytes_per_row: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], bytes_per_row: usize) -> Self {
        Plane {
            data,
            bytes_per_row,
        }
    }
}

/// A borrowed, read-only video frame.
///
/// Implementations never hand out mutable access to the pixel data, so
/// converting a frame cannot alter the buffer it was captured into.
pub trait Frame {
    fn pixel_format(&self) -> PixelFormat;
    fn size(&self) -> Size;
    fn planes(&self) -> &[Plane<'_>];

    /// Quantisation range of YCbCr samples. Ignored for RGB formats.
    fn color_range(&self) -> ColorRange {
        if self.pixel_format().is_yuv() {
            ColorRange::Video
        } else {
            ColorRange::Full
        }
    }
}

/// A frame over caller-owned slices.
///
/// This is the portable counterpart of a platform pixel buffer: it borrows
/// memory for the duration of a conversion and does not own or copy it.
#[derive(Debug, Clone)]
pub struct FrameRef<'a> {
    pixel_format: PixelFormat,
    size: Size,
    color_range: Option<ColorRange>,
    planes: ArrayVec<Plane<'a>, MAX_PLANES>,
}

impl<'a> FrameRef<'a> {
    /// Build a frame from an arbitrary set of planes.
    ///
    /// Plane layout is checked at conversion time; here only the number of
    /// planes is bounded.
    pub fn new(
        pixel_format: PixelFormat,
        size: Size,
        planes: impl IntoIterator<Item = Plane<'a>>,
    ) -> Result<Self, Error> {
        let mut inline = ArrayVec::new();
        for (count, plane) in planes.into_iter().enumerate() {
            inline.try_push(plane).map_err(|_| {
                Error::InvalidBuffer(BufferError::PlaneCount {
                    expected: pixel_format.plane_count(),
                    actual: count + 1,
                })
            })?;
        }
        Ok(FrameRef {
            pixel_format,
            size,
            color_range: None,
            planes: inline,
        })
    }

    /// A single-plane packed frame (YUYV, UYVY, BGRA or RGBA).
    pub fn packed(
        pixel_format: PixelFormat,
        size: Size,
        data: &'a [u8],
        bytes_per_row: usize,
    ) -> Self {
        let mut planes = ArrayVec::new();
        planes.push(Plane::new(data, bytes_per_row));
        FrameRef {
            pixel_format,
            size,
            color_range: None,
            planes,
        }
    }

    pub fn nv12(size: Size, luma: Plane<'a>, chroma: Plane<'a>) -> Self {
        let mut planes = ArrayVec::new();
        planes.push(luma);
        planes.push(chroma);
        FrameRef {
            pixel_format: PixelFormat::Nv12,
            size,
            color_range: None,
            planes,
        }
    }

    pub fn i420(size: Size, luma: Plane<'a>, cb: Plane<'a>, cr: Plane<'a>) -> Self {
        let planes = ArrayVec::from([luma, cb, cr]);
        FrameRef {
            pixel_format: PixelFormat::I420,
            size,
            color_range: None,
            planes,
        }
    }

    /// A compressed JPEG frame. `size` is the size the bitstream is expected to decode to.
    pub fn jpeg(size: Size, data: &'a [u8]) -> Self {
        Self::packed(PixelFormat::Jpeg, size, data, 0)
    }

    pub fn with_color_range(mut self, range: ColorRange) -> Self {
        self.color_range = Some(range);
        self
    }
}

impl Frame for FrameRef<'_> {
    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn size(&self) -> Size {
        self.size
    }

    fn planes(&self) -> &[Plane<'_>] {
        &self.planes
    }

    fn color_range(&self) -> ColorRange {
        match self.color_range {
            Some(range) => range,
            None if self.pixel_format.is_yuv() => ColorRange::Video,
            None => ColorRange::Full,
        }
    }
}
