//! Catalog collections, search and compositing.

mod collections;
mod composite;
mod search;

pub use collections::{
    collection_id, is_known_collection, output_name, split_id, COLLECTIONS, DEFAULT_COLLECTION,
};
pub use composite::{composite, CompositeMethod};
pub use search::{search, OutputFormat, SearchArgs, SearchResults};

use tracing::debug;

use crate::error::Result;
use crate::image::ImageHandle;
use crate::service::{ImageRef, ImageService};

/// An image queued for download or export.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Catalog or synthesized id.
    pub id: String,
    /// Output name: the id with `/` replaced by `-`.
    pub name: String,
    pub handle: ImageHandle,
}

/// Build handles for a list of image ids.
///
/// Images from a known collection are masked remotely and come back with
/// their metadata attached. Anything else is a plain asset reference.
pub fn image_list(
    service: &dyn ImageService,
    ids: &[String],
    mask: bool,
    scale_refl: bool,
) -> Result<Vec<ImageEntry>> {
    ids.iter()
        .map(|id| {
            let (collection, _) = split_id(id);
            let handle = if is_known_collection(collection) {
                debug!(%id, mask, scale_refl, "masked catalog image");
                ImageHandle::enrich(ImageRef::masked(id.as_str(), mask, scale_refl), service)?
            } else {
                ImageHandle::raw(ImageRef::asset(id.as_str()))
            };
            Ok(ImageEntry {
                id: id.clone(),
                name: output_name(id),
                handle,
            })
        })
        .collect()
}
