//! Allocating conversion into [`RgbaImage`].

use image::{ImageFormat, RgbaImage};

use crate::convert::{convert_into, validate};
use crate::error::{BufferError, Error};
use crate::frame::Frame;
use crate::types::{ConvertConfig, PixelFormat};

/// Convert a frame into a newly allocated RGBA image using default options.
pub fn image_from_frame<F: Frame + ?Sized>(frame: &F) -> Result<RgbaImage, Error> {
    image_from_frame_with(frame, &ConvertConfig::default())
}

/// Convert a frame into a newly allocated RGBA image.
///
/// The returned image always has the frame's width and height. The frame is
/// only read; nothing borrowed from it outlives the call.
pub fn image_from_frame_with<F: Frame + ?Sized>(
    frame: &F,
    config: &ConvertConfig,
) -> Result<RgbaImage, Error> {
    let size = frame.size();
    let pixel_format = frame.pixel_format();

    let image = match pixel_format {
        PixelFormat::Jpeg => decode_jpeg(frame)?,
        _ => {
            // Planes are checked before the output is sized from them, so
            // a buffer with bogus dimensions fails instead of allocating.
            validate(frame).inspect_err(|e| {
                tracing::debug!(
                    ?pixel_format,
                    width = size.width,
                    height = size.height,
                    error = %e,
                    "rejected frame"
                );
            })?;
            let mut image = RgbaImage::new(size.width, size.height);
            convert_into(frame, config, &mut image)?;
            image
        }
    };

    tracing::trace!(
        ?pixel_format,
        width = size.width,
        height = size.height,
        "converted frame"
    );
    Ok(image)
}

/// JPEG carries no alpha, so `ConvertConfig` has nothing to adjust here.
fn decode_jpeg<F: Frame + ?Sized>(frame: &F) -> Result<RgbaImage, Error> {
    validate(frame)?;
    let size = frame.size();
    let data = frame.planes()[0].data;

    let image = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.into_rgba8();
    if image.dimensions() != (size.width, size.height) {
        return Err(BufferError::SizeMismatch {
            declared: (size.width, size.height),
            decoded: image.dimensions(),
        }
        .into());
    }
    Ok(image)
}

/// Method-call form of [`image_from_frame`].
pub trait FrameImageExt: Frame {
    fn to_rgba_image(&self) -> Result<RgbaImage, Error> {
        image_from_frame(self)
    }

    fn to_rgba_image_with(&self, config: &ConvertConfig) -> Result<RgbaImage, Error> {
        image_from_frame_with(self, config)
    }
}

impl<T: Frame + ?Sized> FrameImageExt for T {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgb, RgbImage};

    use super::*;
    use crate::frame::FrameRef;
    use crate::types::Size;

    fn encode_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    #[test]
    fn jpeg_frame_decodes() {
        let data = encode_jpeg(16, 8, [200, 40, 40]);
        let frame = FrameRef::jpeg(Size::new(16, 8), &data);
        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.dimensions(), (16, 8));
        let px = image.get_pixel(8, 4).0;
        assert!((px[0] as i32 - 200).abs() <= 8, "{px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn jpeg_size_must_match() {
        let data = encode_jpeg(16, 8, [0, 0, 0]);
        let frame = FrameRef::jpeg(Size::new(8, 8), &data);
        assert!(matches!(
            image_from_frame(&frame),
            Err(Error::InvalidBuffer(BufferError::SizeMismatch {
                declared: (8, 8),
                decoded: (16, 8)
            }))
        ));
    }

    #[test]
    fn corrupt_jpeg_is_a_decode_error() {
        let frame = FrameRef::jpeg(Size::new(2, 2), &[0xFF, 0xD8, 0x00, 0x01]);
        assert!(matches!(image_from_frame(&frame), Err(Error::Decode(_))));
    }

    #[test]
    fn bogus_dimensions_fail_before_allocating() {
        let data = [0u8; 4];
        let frame = FrameRef::packed(
            PixelFormat::Bgra32,
            Size::new(400_000, 400_000),
            &data,
            1_600_000,
        );
        assert!(matches!(
            image_from_frame(&frame),
            Err(Error::InvalidBuffer(BufferError::PlaneTooShort {
                plane: 0,
                actual: 4,
                ..
            }))
        ));
    }

    #[test]
    fn trait_object_frames_convert() {
        let data = [0u8, 0, 255, 255];
        let frame = FrameRef::packed(PixelFormat::Bgra32, Size::new(1, 1), &data, 4);
        let dyn_frame: &dyn Frame = &frame;
        let image = dyn_frame.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
