#![cfg_attr(not(feature = "std"), no_std)]

pub mod convert;
pub mod error;
pub mod fourcc;
pub mod frame;
pub mod types;

#[cfg(feature = "std")]
pub mod rgba;
#[cfg(feature = "std")]
pub mod platform;
#[cfg(feature = "std")]
pub mod preview;

// Re-exports
pub use convert::*;
pub use error::*;
pub use frame::*;
pub use types::*;

#[cfg(feature = "std")]
pub use rgba::*;
#[cfg(feature = "std")]
pub use preview::*;
