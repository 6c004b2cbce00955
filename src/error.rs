use core::fmt;

use crate::fourcc::FourCc;

/// Platform-specific error details.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlatformError {
    Message(&'static str),
    /// A non-success `CVReturn` status from Core Video.
    CvReturn(i32),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => f.write_str(msg),
            Self::CvReturn(status) => write!(f, "Core Video returned {status}"),
        }
    }
}

impl core::error::Error for PlatformError {}

/// Why a pixel buffer could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BufferError {
    /// Width or height is zero.
    Empty,
    /// The declared size or stride overflows the address space.
    TooLarge,
    PlaneCount {
        expected: usize,
        actual: usize,
    },
    /// A plane's stride is narrower than one row of its samples.
    StrideTooSmall {
        plane: usize,
        minimum: usize,
        actual: usize,
    },
    /// A plane's data ends before its last row.
    PlaneTooShort {
        plane: usize,
        expected: usize,
        actual: usize,
    },
    OutputTooSmall {
        expected: usize,
        actual: usize,
    },
    /// The base address was null, usually because the buffer is not locked.
    NoBaseAddress,
    /// A sample buffer carried no image buffer.
    NoImageBuffer,
    /// A compressed frame decoded to a different size than it declared.
    SizeMismatch {
        declared: (u32, u32),
        decoded: (u32, u32),
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("buffer has zero width or height"),
            Self::TooLarge => f.write_str("buffer dimensions overflow"),
            Self::PlaneCount { expected, actual } => {
                write!(f, "expected {expected} plane(s), got {actual}")
            }
            Self::StrideTooSmall {
                plane,
                minimum,
                actual,
            } => write!(
                f,
                "plane {plane} has {actual} bytes per row, need at least {minimum}"
            ),
            Self::PlaneTooShort {
                plane,
                expected,
                actual,
            } => write!(f, "plane {plane} has {actual} bytes, need {expected}"),
            Self::OutputTooSmall { expected, actual } => {
                write!(f, "output holds {actual} bytes, need {expected}")
            }
            Self::NoBaseAddress => f.write_str("pixel buffer base address unavailable"),
            Self::NoImageBuffer => f.write_str("sample buffer has no image buffer"),
            Self::SizeMismatch { declared, decoded } => write!(
                f,
                "frame declared {}x{} but decoded to {}x{}",
                declared.0, declared.1, decoded.0, decoded.1
            ),
        }
    }
}

/// Top-level crate error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The format is recognised but cannot be decoded by this build.
    UnsupportedFormat,
    /// The platform reported a pixel format code this crate does not know.
    UnknownPixelFormat(u32),
    InvalidBuffer(BufferError),
    #[cfg(feature = "std")]
    Decode(image::ImageError),
    Platform(PlatformError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => f.write_str("unsupported format"),
            Self::UnknownPixelFormat(code) => {
                write!(f, "unknown pixel format {}", FourCc(*code))
            }
            Self::InvalidBuffer(e) => write!(f, "invalid buffer: {e}"),
            #[cfg(feature = "std")]
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Platform(e) => write!(f, "platform error: {e}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            #[cfg(feature = "std")]
            Self::Decode(e) => Some(e),
            Self::Platform(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlatformError> for Error {
    fn from(e: PlatformError) -> Self {
        Self::Platform(e)
    }
}

impl From<BufferError> for Error {
    fn from(e: BufferError) -> Self {
        Self::InvalidBuffer(e)
    }
}

#[cfg(feature = "std")]
impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e)
    }
}
