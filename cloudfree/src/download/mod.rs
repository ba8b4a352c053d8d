//! Direct download of GeoTIFF rasters.

mod collision;
mod driver;
mod error;

pub use collision::{
    collision_action, settle_destination, AbortOnCollision, CollisionAction, CollisionResolver,
    UserChoice,
};
pub use driver::{
    is_size_limit_error, is_temp_file, tif_destination, DownloadDriver, DownloadOutcome,
    TransferProgressCallback, DEFAULT_CHUNK_SIZE, TEMP_PREFIX,
};
pub use error::DownloadError;
