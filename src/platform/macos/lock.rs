use objc2_core_video::{
    CVPixelBuffer, CVPixelBufferLockBaseAddress, CVPixelBufferLockFlags,
    CVPixelBufferUnlockBaseAddress,
};

use crate::error::{Error, PlatformError};
use crate::platform::macos::frame::MacosFrame;

// kCVReturnSuccess
const CV_RETURN_SUCCESS: i32 = 0;

/// RAII guard for a read-only `CVPixelBuffer` base address lock.
///
/// Every successful lock is balanced by exactly one unlock when the guard
/// drops.
pub struct PixelBufferLock<'a> {
    pixel_buffer: &'a CVPixelBuffer,
}

impl<'a> PixelBufferLock<'a> {
    pub fn read_only(pixel_buffer: &'a CVPixelBuffer) -> Result<Self, Error> {
        let status =
            unsafe { CVPixelBufferLockBaseAddress(pixel_buffer, CVPixelBufferLockFlags::ReadOnly) };
        if status != CV_RETURN_SUCCESS {
            tracing::debug!(status, "failed to lock pixel buffer");
            return Err(Error::Platform(PlatformError::CvReturn(status)));
        }
        Ok(PixelBufferLock { pixel_buffer })
    }

    pub fn pixel_buffer(&self) -> &CVPixelBuffer {
        self.pixel_buffer
    }

    /// View the locked memory as a [`MacosFrame`]. The frame cannot outlive the lock.
    pub fn frame(&self) -> Result<MacosFrame<'_>, Error> {
        // SAFETY: the base address stays locked until `self` drops, and the
        // returned frame borrows `self`.
        unsafe { MacosFrame::from_locked_pixel_buffer(self.pixel_buffer) }
    }
}

impl Drop for PixelBufferLock<'_> {
    fn drop(&mut self) {
        let status = unsafe {
            CVPixelBufferUnlockBaseAddress(self.pixel_buffer, CVPixelBufferLockFlags::ReadOnly)
        };
        if status != CV_RETURN_SUCCESS {
            tracing::warn!(status, "failed to unlock pixel buffer");
        }
    }
}
