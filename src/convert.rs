//! Decoding of uncompressed frames into tightly packed 8-bit RGBA.
//!
//! Everything here works on borrowed slices and never allocates, so it is
//! available without `std`. Allocating wrappers returning an
//! [`RgbaImage`](image::RgbaImage) live in [`crate::rgba`].

use arrayvec::ArrayVec;

use crate::error::{BufferError, Error};
use crate::frame::{Frame, Plane};
use crate::types::{ColorMatrix, ColorRange, ConvertConfig, MAX_PLANES, PixelFormat, Size};

const FRAC_BITS: u32 = 14;
const ONE: f32 = (1 << FRAC_BITS) as f32;
const ROUND: i32 = 1 << (FRAC_BITS - 1);

/// Minimum bytes per row and number of rows for one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaneLayout {
    row_bytes: usize,
    rows: usize,
}

impl PlaneLayout {
    /// `groups` sample groups of `bytes_per_group` bytes per row, over `rows` rows.
    fn new(groups: u32, bytes_per_group: usize, rows: u32) -> Result<Self, Error> {
        let row_bytes = (groups as usize)
            .checked_mul(bytes_per_group)
            .ok_or(BufferError::TooLarge)?;
        Ok(PlaneLayout {
            row_bytes,
            rows: rows as usize,
        })
    }

    /// Bytes a plane with this stride must hold. The last row need not be
    /// padded out to the full stride.
    fn required_len(&self, bytes_per_row: usize) -> Option<usize> {
        bytes_per_row
            .checked_mul(self.rows - 1)?
            .checked_add(self.row_bytes)
    }
}

fn plane_layouts(
    pixel_format: PixelFormat,
    size: Size,
) -> Result<ArrayVec<PlaneLayout, MAX_PLANES>, Error> {
    let (w, h) = (size.width, size.height);
    let (cw, ch) = (size.chroma_width(), size.chroma_height());
    let mut layouts = ArrayVec::new();
    match pixel_format {
        PixelFormat::Nv12 => {
            layouts.push(PlaneLayout::new(w, 1, h)?);
            layouts.push(PlaneLayout::new(cw, 2, ch)?);
        }
        PixelFormat::I420 => {
            layouts.push(PlaneLayout::new(w, 1, h)?);
            layouts.push(PlaneLayout::new(cw, 1, ch)?);
            layouts.push(PlaneLayout::new(cw, 1, ch)?);
        }
        // One macropixel (4 bytes) per pair of pixels.
        PixelFormat::Yuyv | PixelFormat::Uyvy => layouts.push(PlaneLayout::new(cw, 4, h)?),
        PixelFormat::Bgra32 | PixelFormat::Rgba32 => layouts.push(PlaneLayout::new(w, 4, h)?),
        PixelFormat::Jpeg => {}
    }
    Ok(layouts)
}

/// Check that a frame's planes are large enough to be decoded.
///
/// Compressed formats are only checked for size and plane count; their
/// bitstream is validated by the decoder. Nothing is allocated or read
/// from the planes, so untrusted size metadata is safe to pass here.
pub fn validate<F: Frame + ?Sized>(frame: &F) -> Result<(), Error> {
    let pixel_format = frame.pixel_format();
    let size = frame.size();
    if size.is_empty() {
        return Err(BufferError::Empty.into());
    }
    if size.rgba_len().is_none() {
        return Err(BufferError::TooLarge.into());
    }

    let planes = frame.planes();
    if planes.len() != pixel_format.plane_count() {
        return Err(BufferError::PlaneCount {
            expected: pixel_format.plane_count(),
            actual: planes.len(),
        }
        .into());
    }

    for (index, (plane, layout)) in planes
        .iter()
        .zip(plane_layouts(pixel_format, size)?)
        .enumerate()
    {
        if plane.bytes_per_row < layout.row_bytes {
            return Err(BufferError::StrideTooSmall {
                plane: index,
                minimum: layout.row_bytes,
                actual: plane.bytes_per_row,
            }
            .into());
        }
        let expected = layout
            .required_len(plane.bytes_per_row)
            .ok_or(BufferError::TooLarge)?;
        if plane.data.len() < expected {
            return Err(BufferError::PlaneTooShort {
                plane: index,
                expected,
                actual: plane.data.len(),
            }
            .into());
        }
    }

    Ok(())
}

/// Fixed-point YCbCr to RGB coefficients with the range expansion folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YuvCoefficients {
    y_offset: i32,
    y_gain: i32,
    r_cr: i32,
    g_cb: i32,
    g_cr: i32,
    b_cb: i32,
}

impl YuvCoefficients {
    fn new(matrix: ColorMatrix, range: ColorRange) -> Self {
        let (kr, kb) = match matrix {
            ColorMatrix::Bt709 => (0.2126f32, 0.0722f32),
            ColorMatrix::Bt601 | ColorMatrix::Auto => (0.299f32, 0.114f32),
        };
        let kg = 1.0 - kr - kb;
        let (y_offset, y_scale, c_scale) = match range {
            ColorRange::Video => (16, 255.0 / 219.0, 255.0 / 224.0),
            ColorRange::Full => (0, 1.0, 1.0),
        };
        YuvCoefficients {
            y_offset,
            y_gain: fixed(y_scale),
            r_cr: fixed(2.0 * (1.0 - kr) * c_scale),
            g_cb: fixed(2.0 * kb * (1.0 - kb) / kg * c_scale),
            g_cr: fixed(2.0 * kr * (1.0 - kr) / kg * c_scale),
            b_cb: fixed(2.0 * (1.0 - kb) * c_scale),
        }
    }

    #[inline]
    fn to_rgba(&self, y: u8, cb: u8, cr: u8, px: &mut [u8]) {
        let luma = (y as i32 - self.y_offset) * self.y_gain + ROUND;
        let cb = cb as i32 - 128;
        let cr = cr as i32 - 128;
        px[0] = clamp_u8((luma + self.r_cr * cr) >> FRAC_BITS);
        px[1] = clamp_u8((luma - self.g_cb * cb - self.g_cr * cr) >> FRAC_BITS);
        px[2] = clamp_u8((luma + self.b_cb * cb) >> FRAC_BITS);
        px[3] = u8::MAX;
    }
}

// Every input is positive, so adding a half before truncating rounds to nearest.
fn fixed(value: f32) -> i32 {
    (value * ONE + 0.5) as i32
}

#[inline]
fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

#[inline]
fn row<'a>(plane: &Plane<'a>, index: usize, len: usize) -> &'a [u8] {
    let start = index * plane.bytes_per_row;
    &plane.data[start..start + len]
}

/// Decode `frame` into `out` as tightly packed RGBA rows.
///
/// `out` must hold at least `width * height * 4` bytes; anything beyond that
/// is left untouched. The frame is validated first, so a malformed buffer
/// yields an error rather than a partially written image.
pub fn convert_into<F: Frame + ?Sized>(
    frame: &F,
    config: &ConvertConfig,
    out: &mut [u8],
) -> Result<(), Error> {
    validate(frame)?;

    let pixel_format = frame.pixel_format();
    let size = frame.size();
    let expected = size.rgba_len().ok_or(BufferError::TooLarge)?;
    if out.len() < expected {
        return Err(BufferError::OutputTooSmall {
            expected,
            actual: out.len(),
        }
        .into());
    }
    let out = &mut out[..expected];

    let range = config.range.unwrap_or_else(|| frame.color_range());
    let coefficients = YuvCoefficients::new(config.matrix.resolve(size), range);
    let planes = frame.planes();

    match pixel_format {
        PixelFormat::Nv12 => nv12_to_rgba(size, &planes[0], &planes[1], &coefficients, out),
        PixelFormat::I420 => i420_to_rgba(
            size,
            [&planes[0], &planes[1], &planes[2]],
            &coefficients,
            out,
        ),
        PixelFormat::Yuyv => packed_422_to_rgba(size, &planes[0], [0, 1, 3], &coefficients, out),
        PixelFormat::Uyvy => packed_422_to_rgba(size, &planes[0], [1, 0, 2], &coefficients, out),
        PixelFormat::Bgra32 => rgb32_to_rgba(size, &planes[0], [2, 1, 0, 3], config.opaque, out),
        PixelFormat::Rgba32 => rgb32_to_rgba(size, &planes[0], [0, 1, 2, 3], config.opaque, out),
        PixelFormat::Jpeg => return Err(Error::UnsupportedFormat),
    }

    Ok(())
}

fn nv12_to_rgba(
    size: Size,
    luma: &Plane<'_>,
    chroma: &Plane<'_>,
    coefficients: &YuvCoefficients,
    out: &mut [u8],
) {
    let width = size.width as usize;
    let chroma_len = size.chroma_width() as usize * 2;
    for (y, dst) in out.chunks_exact_mut(width * 4).enumerate() {
        let y_row = row(luma, y, width);
        let uv_row = row(chroma, y / 2, chroma_len);
        for (x, px) in dst.chunks_exact_mut(4).enumerate() {
            let c = (x / 2) * 2;
            coefficients.to_rgba(y_row[x], uv_row[c], uv_row[c + 1], px);
        }
    }
}

fn i420_to_rgba(
    size: Size,
    [luma, cb, cr]: [&Plane<'_>; 3],
    coefficients: &YuvCoefficients,
    out: &mut [u8],
) {
    let width = size.width as usize;
    let chroma_width = size.chroma_width() as usize;
    for (y, dst) in out.chunks_exact_mut(width * 4).enumerate() {
        let y_row = row(luma, y, width);
        let cb_row = row(cb, y / 2, chroma_width);
        let cr_row = row(cr, y / 2, chroma_width);
        for (x, px) in dst.chunks_exact_mut(4).enumerate() {
            coefficients.to_rgba(y_row[x], cb_row[x / 2], cr_row[x / 2], px);
        }
    }
}

/// Packed 4:2:2. `order` gives the byte offsets of the first luma sample,
/// Cb and Cr within a macropixel; the second luma sample sits two bytes
/// after the first.
fn packed_422_to_rgba(
    size: Size,
    plane: &Plane<'_>,
    [y0, cb, cr]: [usize; 3],
    coefficients: &YuvCoefficients,
    out: &mut [u8],
) {
    let width = size.width as usize;
    let row_len = size.chroma_width() as usize * 4;
    for (y, dst) in out.chunks_exact_mut(width * 4).enumerate() {
        let src = row(plane, y, row_len);
        for (x, px) in dst.chunks_exact_mut(4).enumerate() {
            let macropixel = &src[(x / 2) * 4..][..4];
            let luma = macropixel[y0 + (x % 2) * 2];
            coefficients.to_rgba(luma, macropixel[cb], macropixel[cr], px);
        }
    }
}

/// 32-bit RGB formats. `order` maps output R, G, B, A to source byte offsets.
fn rgb32_to_rgba(size: Size, plane: &Plane<'_>, order: [usize; 4], opaque: bool, out: &mut [u8]) {
    let width = size.width as usize;
    for (y, dst) in out.chunks_exact_mut(width * 4).enumerate() {
        let src = row(plane, y, width * 4);
        for (s, px) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            px[0] = s[order[0]];
            px[1] = s[order[1]];
            px[2] = s[order[2]];
            px[3] = if opaque { u8::MAX } else { s[order[3]] };
        }
    }
}
