use arrayvec::ArrayVec;
use objc2_core_video::{
    CVPixelBuffer, CVPixelBufferGetBaseAddress, CVPixelBufferGetBaseAddressOfPlane,
    CVPixelBufferGetBytesPerRow, CVPixelBufferGetBytesPerRowOfPlane, CVPixelBufferGetDataSize,
    CVPixelBufferGetHeight, CVPixelBufferGetHeightOfPlane, CVPixelBufferGetPixelFormatType,
    CVPixelBufferGetPlaneCount, CVPixelBufferGetWidth,
};

use crate::error::{BufferError, Error};
use crate::fourcc::{FourCc, pixel_format_from_fourcc};
use crate::frame::{Frame, Plane};
use crate::types::{ColorRange, MAX_PLANES, PixelFormat, Size};

/// A video frame backed by a `CVPixelBuffer`.
/// Only valid while the buffer's base address is locked.
pub struct MacosFrame<'a> {
    planes: ArrayVec<Plane<'a>, MAX_PLANES>,
    pixel_format: PixelFormat,
    color_range: ColorRange,
    size: Size,
}

impl<'a> MacosFrame<'a> {
    /// Create a frame from a locked pixel buffer.
    /// SAFETY: The pixel buffer base address must be locked for the lifetime 'a.
    pub(crate) unsafe fn from_locked_pixel_buffer(
        pixel_buffer: &'a CVPixelBuffer,
    ) -> Result<Self, Error> {
        let fourcc = CVPixelBufferGetPixelFormatType(pixel_buffer);
        let (pixel_format, color_range) = pixel_format_from_fourcc(fourcc).ok_or_else(|| {
            tracing::debug!(fourcc = %FourCc(fourcc), "unknown pixel format");
            Error::UnknownPixelFormat(fourcc)
        })?;

        let width = CVPixelBufferGetWidth(pixel_buffer);
        let height = CVPixelBufferGetHeight(pixel_buffer);
        let size = Size {
            width: u32::try_from(width).map_err(|_| BufferError::TooLarge)?,
            height: u32::try_from(height).map_err(|_| BufferError::TooLarge)?,
        };

        let plane_count = CVPixelBufferGetPlaneCount(pixel_buffer);
        let mut planes = ArrayVec::new();
        if plane_count == 0 {
            // Non-planar: single plane
            let base = CVPixelBufferGetBaseAddress(pixel_buffer);
            if base.is_null() {
                return Err(BufferError::NoBaseAddress.into());
            }
            let bytes_per_row = CVPixelBufferGetBytesPerRow(pixel_buffer);
            // Compressed buffers are not row-structured.
            let len = if pixel_format.is_compressed() {
                CVPixelBufferGetDataSize(pixel_buffer)
            } else {
                bytes_per_row
                    .checked_mul(height)
                    .ok_or(BufferError::TooLarge)?
            };
            let data = unsafe { std::slice::from_raw_parts(base as *const u8, len) };
            planes.push(Plane {
                data,
                bytes_per_row,
            });
        } else {
            if plane_count > MAX_PLANES {
                return Err(BufferError::PlaneCount {
                    expected: pixel_format.plane_count(),
                    actual: plane_count,
                }
                .into());
            }
            for i in 0..plane_count {
                let base = CVPixelBufferGetBaseAddressOfPlane(pixel_buffer, i);
                if base.is_null() {
                    return Err(BufferError::NoBaseAddress.into());
                }
                let bytes_per_row = CVPixelBufferGetBytesPerRowOfPlane(pixel_buffer, i);
                let h = CVPixelBufferGetHeightOfPlane(pixel_buffer, i);
                let len = bytes_per_row.checked_mul(h).ok_or(BufferError::TooLarge)?;
                let data = unsafe { std::slice::from_raw_parts(base as *const u8, len) };
                planes.push(Plane {
                    data,
                    bytes_per_row,
                });
            }
        }

        Ok(MacosFrame {
            planes,
            pixel_format,
            color_range,
            size,
        })
    }
}

impl Frame for MacosFrame<'_> {
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
        self.color_range
    }
}
