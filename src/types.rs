/// Maximum number of planes any supported pixel format uses.
pub const MAX_PLANES: usize = 3;

/// Height at and above which [`ColorMatrix::Auto`] picks BT.709.
const HD_HEIGHT: u32 = 720;

/// Pixel formats encountered in camera and video pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 8-bit 4:2:0, a luma plane followed by an interleaved CbCr plane.
    Nv12,
    /// 8-bit 4:2:0, separate luma, Cb and Cr planes.
    I420,
    /// 8-bit 4:2:2 packed as `Y0 Cb Y1 Cr`.
    Yuyv,
    /// 8-bit 4:2:2 packed as `Cb Y0 Cr Y1`.
    Uyvy,
    Bgra32,
    Rgba32,
    /// A compressed JPEG bitstream in a single plane.
    Jpeg,
}

impl PixelFormat {
    /// Number of planes a buffer of this format carries.
    pub fn plane_count(&self) -> usize {
        match self {
            Self::Nv12 => 2,
            Self::I420 => 3,
            Self::Yuyv | Self::Uyvy | Self::Bgra32 | Self::Rgba32 | Self::Jpeg => 1,
        }
    }

    pub fn is_yuv(&self) -> bool {
        matches!(self, Self::Nv12 | Self::I420 | Self::Yuyv | Self::Uyvy)
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions of a 4:2:0 or 4:2:2 chroma sample grid, rounding up for odd sizes.
    pub(crate) fn chroma_width(&self) -> u32 {
        self.width.div_ceil(2)
    }

    pub(crate) fn chroma_height(&self) -> u32 {
        self.height.div_ceil(2)
    }

    /// Byte length of a tightly packed RGBA image of this size, or `None`
    /// if it does not fit in `usize`.
    pub fn rgba_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }
}

/// Quantisation range of 8-bit YCbCr samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorRange {
    /// Luma in 16..=235, chroma in 16..=240.
    #[default]
    Video,
    /// Luma and chroma use the whole 0..=255 range.
    Full,
}

/// YCbCr to RGB matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMatrix {
    /// BT.709 for frames at least 720 lines tall, BT.601 otherwise.
    #[default]
    Auto,
    Bt601,
    Bt709,
}

impl ColorMatrix {
    /// Resolve [`ColorMatrix::Auto`] for a frame of the given size.
    pub fn resolve(self, size: Size) -> ColorMatrix {
        match self {
            Self::Auto if size.height >= HD_HEIGHT => Self::Bt709,
            Self::Auto => Self::Bt601,
            other => other,
        }
    }
}

/// Options controlling how a frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertConfig {
    pub matrix: ColorMatrix,
    /// Overrides the range reported by the frame.
    pub range: Option<ColorRange>,
    /// Force alpha to 255 for formats that carry their own alpha channel.
    pub opaque: bool,
}

impl ConvertConfig {
    pub fn with_matrix(mut self, matrix: ColorMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_range(mut self, range: ColorRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_matrix_follows_height() {
        assert_eq!(ColorMatrix::Auto.resolve(Size::new(640, 480)), ColorMatrix::Bt601);
        assert_eq!(ColorMatrix::Auto.resolve(Size::new(1280, 720)), ColorMatrix::Bt709);
        assert_eq!(ColorMatrix::Bt601.resolve(Size::new(1920, 1080)), ColorMatrix::Bt601);
    }

    #[test]
    fn chroma_dimensions_round_up() {
        let size = Size::new(5, 3);
        assert_eq!(size.chroma_width(), 3);
        assert_eq!(size.chroma_height(), 2);
        assert_eq!(size.rgba_len(), Some(60));
    }
}
