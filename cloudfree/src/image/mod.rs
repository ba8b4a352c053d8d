//! Remote images and their resolution into export-ready descriptors.

mod descriptor;
mod error;
mod handle;
mod info;

pub use descriptor::{ImageDescriptor, Overrides, RegionSource};
pub use error::{ResolutionError, UNSUPPORTED_CRS_ISSUE, UNSUPPORTED_NATIVE_CRS};
pub use handle::{ImageHandle, RemoteImage};
pub use info::{BandInfo, ImageInfo, FOOTPRINT_PROPERTY};
