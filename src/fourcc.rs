//! Core Video four-character pixel format codes.

use core::fmt;

use crate::types::{ColorRange, PixelFormat};

// kCVPixelFormatType values
pub const NV12_VIDEO_RANGE: u32 = u32::from_be_bytes(*b"420v");
pub const NV12_FULL_RANGE: u32 = u32::from_be_bytes(*b"420f");
pub const I420_VIDEO_RANGE: u32 = u32::from_be_bytes(*b"y420");
pub const I420_FULL_RANGE: u32 = u32::from_be_bytes(*b"f420");
pub const YUYV: u32 = u32::from_be_bytes(*b"yuvs");
pub const UYVY: u32 = u32::from_be_bytes(*b"2vuy");
pub const BGRA: u32 = u32::from_be_bytes(*b"BGRA");
pub const RGBA: u32 = u32::from_be_bytes(*b"RGBA");
pub const JPEG: u32 = u32::from_be_bytes(*b"jpeg");

/// Formats a code as its four characters, e.g. `'420v'`, or as hex when it
/// is not printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            f.write_str("'")?;
            for b in bytes {
                write!(f, "{}", b as char)?;
            }
            f.write_str("'")
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

pub fn pixel_format_from_fourcc(fourcc: u32) -> Option<(PixelFormat, ColorRange)> {
    match fourcc {
        NV12_VIDEO_RANGE => Some((PixelFormat::Nv12, ColorRange::Video)),
        NV12_FULL_RANGE => Some((PixelFormat::Nv12, ColorRange::Full)),
        I420_VIDEO_RANGE => Some((PixelFormat::I420, ColorRange::Video)),
        I420_FULL_RANGE => Some((PixelFormat::I420, ColorRange::Full)),
        YUYV => Some((PixelFormat::Yuyv, ColorRange::Video)),
        UYVY => Some((PixelFormat::Uyvy, ColorRange::Video)),
        BGRA => Some((PixelFormat::Bgra32, ColorRange::Full)),
        RGBA => Some((PixelFormat::Rgba32, ColorRange::Full)),
        JPEG => Some((PixelFormat::Jpeg, ColorRange::Full)),
        _ => None,
    }
}

/// The Core Video code for a format. Packed 4:2:2 and RGB formats have a
/// single code, so `range` only matters for the planar formats.
pub fn fourcc_from_pixel_format(pixel_format: PixelFormat, range: ColorRange) -> u32 {
    match (pixel_format, range) {
        (PixelFormat::Nv12, ColorRange::Video) => NV12_VIDEO_RANGE,
        (PixelFormat::Nv12, ColorRange::Full) => NV12_FULL_RANGE,
        (PixelFormat::I420, ColorRange::Video) => I420_VIDEO_RANGE,
        (PixelFormat::I420, ColorRange::Full) => I420_FULL_RANGE,
        (PixelFormat::Yuyv, _) => YUYV,
        (PixelFormat::Uyvy, _) => UYVY,
        (PixelFormat::Bgra32, _) => BGRA,
        (PixelFormat::Rgba32, _) => RGBA,
        (PixelFormat::Jpeg, _) => JPEG,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn codes_match_core_video_constants() {
        // kCVPixelFormatType_420YpCbCr8BiPlanarVideoRange
        assert_eq!(NV12_VIDEO_RANGE, 0x3432_3076);
        // kCVPixelFormatType_32BGRA
        assert_eq!(BGRA, 0x4247_5241);
        // kCVPixelFormatType_422YpCbCr8
        assert_eq!(UYVY, 0x3276_7579);
    }

    #[test]
    fn range_survives_mapping() {
        for code in [NV12_VIDEO_RANGE, NV12_FULL_RANGE, I420_VIDEO_RANGE, I420_FULL_RANGE] {
            let (format, range) = pixel_format_from_fourcc(code).unwrap();
            assert_eq!(fourcc_from_pixel_format(format, range), code);
        }
        assert_eq!(pixel_format_from_fourcc(u32::from_be_bytes(*b"b64a")), None);
    }

    #[test]
    fn display() {
        assert_eq!(FourCc(NV12_FULL_RANGE).to_string(), "'420f'");
        assert_eq!(FourCc(0x0000_0020).to_string(), "0x00000020");
    }
}
