use std::num::NonZeroU32;
use std::path::PathBuf;

use frame_image::{FramePreview, FrameRef, Plane, PreviewConfig, Size, image_from_frame};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let size = Size::new(320, 240);
    let (w, h) = (size.width as usize, size.height as usize);
    let chroma_stride = w.div_ceil(2) * 2;

    // A horizontal luma ramp under a chroma sweep, laid out as a camera
    // would deliver video-range NV12.
    let luma: Vec<u8> = (0..h)
        .flat_map(|_| (0..w).map(move |x| (16 + x * 219 / w) as u8))
        .collect();
    let chroma: Vec<u8> = (0..h.div_ceil(2))
        .flat_map(|y| {
            (0..w.div_ceil(2)).flat_map(move |x| {
                let cb = (16 + x * 224 / w.div_ceil(2)) as u8;
                let cr = (16 + y * 224 / h.div_ceil(2)) as u8;
                [cb, cr]
            })
        })
        .collect();

    let frame = FrameRef::nv12(
        size,
        Plane::new(&luma, w),
        Plane::new(&chroma, chroma_stride),
    );

    let image = image_from_frame(&frame).expect("failed to convert frame");
    println!(
        "Converted NV12 {}x{} into RGBA {}x{}",
        size.width,
        size.height,
        image.width(),
        image.height()
    );

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("frame.png"));
    image.save(&path).expect("failed to write image");
    println!("Wrote {}", path.display());

    // The same frame through a preview that only publishes every other frame.
    let preview = FramePreview::new(PreviewConfig {
        every_nth: NonZeroU32::new(2).expect("non-zero"),
        ..Default::default()
    });
    preview.set_publishing(true);
    for _ in 0..4 {
        preview.submit(&frame).expect("failed to submit frame");
    }
    println!(
        "Preview published {} of {} frames",
        preview.published_count(),
        preview.submitted_count()
    );

    #[cfg(target_os = "macos")]
    println!(
        "On macOS, use frame_image::platform::macos::image_from_pixel_buffer for CVPixelBuffers."
    );
}
