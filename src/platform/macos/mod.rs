//! Core Video integration: convert `CVPixelBuffer`s delivered by
//! AVFoundation into RGBA images.

use image::RgbaImage;
use objc2_core_media::CMSampleBuffer;
use objc2_core_video::CVPixelBuffer;

use crate::error::{BufferError, Error};
use crate::rgba::image_from_frame_with;
use crate::types::ConvertConfig;

pub mod frame;
pub mod lock;

pub use frame::MacosFrame;
pub use lock::PixelBufferLock;

/// Convert a pixel buffer into a newly allocated RGBA image.
///
/// The buffer is locked read-only for the duration of the call and unlocked
/// before returning, on success and on error alike. It is neither retained
/// nor written to.
pub fn image_from_pixel_buffer(pixel_buffer: &CVPixelBuffer) -> Result<RgbaImage, Error> {
    image_from_pixel_buffer_with(pixel_buffer, &ConvertConfig::default())
}

pub fn image_from_pixel_buffer_with(
    pixel_buffer: &CVPixelBuffer,
    config: &ConvertConfig,
) -> Result<RgbaImage, Error> {
    let lock = PixelBufferLock::read_only(pixel_buffer)?;
    let frame = lock.frame()?;
    image_from_frame_with(&frame, config)
}

/// Convert the image buffer carried by a capture sample buffer.
pub fn image_from_sample_buffer(sample_buffer: &CMSampleBuffer) -> Result<RgbaImage, Error> {
    let pixel_buffer =
        unsafe { sample_buffer.image_buffer() }.ok_or(BufferError::NoImageBuffer)?;
    image_from_pixel_buffer(&pixel_buffer)
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::ptr::{self, NonNull};

    use objc2_core_video::{
        CVPixelBufferGetBaseAddress, CVPixelBufferGetBaseAddressOfPlane,
        CVPixelBufferGetBytesPerRow, CVPixelBufferGetBytesPerRowOfPlane, CVPixelBufferGetHeight,
        CVPixelBufferGetHeightOfPlane, CVPixelBufferLockBaseAddress, CVPixelBufferLockFlags,
        CVPixelBufferUnlockBaseAddress,
    };

    use super::*;
    use crate::fourcc::{BGRA, NV12_VIDEO_RANGE};
    use crate::frame::Frame;
    use crate::types::ColorRange;

    #[link(name = "CoreVideo", kind = "framework")]
    unsafe extern "C" {
        fn CVPixelBufferCreate(
            allocator: *const c_void,
            width: usize,
            height: usize,
            pixel_format_type: u32,
            pixel_buffer_attributes: *const c_void,
            pixel_buffer_out: *mut *mut CVPixelBuffer,
        ) -> i32;
    }

    #[link(name = "CoreFoundation", kind = "framework")]
    unsafe extern "C" {
        fn CFGetRetainCount(cf: *const c_void) -> isize;
        fn CFRelease(cf: *const c_void);
    }

    /// An owned pixel buffer, released on drop.
    struct TestBuffer(NonNull<CVPixelBuffer>);

    impl TestBuffer {
        fn new(width: usize, height: usize, fourcc: u32) -> TestBuffer {
            let mut out = ptr::null_mut();
            let status = unsafe {
                CVPixelBufferCreate(ptr::null(), width, height, fourcc, ptr::null(), &mut out)
            };
            assert_eq!(status, 0, "CVPixelBufferCreate failed");
            TestBuffer(NonNull::new(out).expect("null pixel buffer"))
        }

        fn get(&self) -> &CVPixelBuffer {
            unsafe { self.0.as_ref() }
        }

        fn retain_count(&self) -> isize {
            unsafe { CFGetRetainCount(self.0.as_ptr() as *const c_void) }
        }

        /// Fill every row of `plane` (or the single plane when `planar` is
        /// false) with `pattern` repeated, under a writable lock.
        fn fill(&self, planar: bool, plane: usize, pattern: &[u8]) {
            let pb = self.get();
            unsafe {
                assert_eq!(CVPixelBufferLockBaseAddress(pb, CVPixelBufferLockFlags(0)), 0);
                let (base, bytes_per_row, rows) = if planar {
                    (
                        CVPixelBufferGetBaseAddressOfPlane(pb, plane),
                        CVPixelBufferGetBytesPerRowOfPlane(pb, plane),
                        CVPixelBufferGetHeightOfPlane(pb, plane),
                    )
                } else {
                    (
                        CVPixelBufferGetBaseAddress(pb),
                        CVPixelBufferGetBytesPerRow(pb),
                        CVPixelBufferGetHeight(pb),
                    )
                };
                assert!(!base.is_null());
                let data = std::slice::from_raw_parts_mut(base as *mut u8, bytes_per_row * rows);
                for (i, byte) in data.iter_mut().enumerate() {
                    *byte = pattern[i % pattern.len()];
                }
                assert_eq!(CVPixelBufferUnlockBaseAddress(pb, CVPixelBufferLockFlags(0)), 0);
            }
        }

        /// The buffer is neither retained nor left locked by a conversion.
        fn assert_untouched(&self, retain_count: isize) {
            assert_eq!(self.retain_count(), retain_count);
            let lock = PixelBufferLock::read_only(self.get()).unwrap();
            drop(lock);
        }
    }

    impl Drop for TestBuffer {
        fn drop(&mut self) {
            unsafe { CFRelease(self.0.as_ptr() as *const c_void) };
        }
    }

    #[test]
    fn bgra_buffer_converts_to_red() {
        let buffer = TestBuffer::new(3, 2, BGRA);
        buffer.fill(false, 0, &[0, 0, 255, 255]);
        let retained = buffer.retain_count();

        let image = image_from_pixel_buffer(buffer.get()).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        for pixel in image.pixels() {
            assert_eq!(pixel.0, [255, 0, 0, 255]);
        }
        buffer.assert_untouched(retained);
    }

    #[test]
    fn nv12_buffer_converts_to_grey() {
        let buffer = TestBuffer::new(4, 4, NV12_VIDEO_RANGE);
        buffer.fill(true, 0, &[126]);
        buffer.fill(true, 1, &[128]);
        let retained = buffer.retain_count();

        {
            let lock = PixelBufferLock::read_only(buffer.get()).unwrap();
            let frame = lock.frame().unwrap();
            assert_eq!(frame.planes().len(), 2);
            assert_eq!(frame.color_range(), ColorRange::Video);
        }

        let image = image_from_pixel_buffer(buffer.get()).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        for pixel in image.pixels() {
            for &channel in &pixel.0[..3] {
                assert!(channel.abs_diff(128) <= 1, "got {:?}", pixel.0);
            }
            assert_eq!(pixel.0[3], 255);
        }
        buffer.assert_untouched(retained);
    }

    #[test]
    fn unknown_fourcc_unlocks_and_errors() {
        // 'b64a': 16-bit ARGB, which Core Video can allocate but this crate does not read.
        let code = u32::from_be_bytes(*b"b64a");
        let buffer = TestBuffer::new(2, 2, code);
        let retained = buffer.retain_count();

        let err = image_from_pixel_buffer(buffer.get()).unwrap_err();
        assert!(matches!(err, Error::UnknownPixelFormat(c) if c == code));
        buffer.assert_untouched(retained);
    }
}
