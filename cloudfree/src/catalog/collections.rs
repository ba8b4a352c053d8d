//! Known catalog collections.

use crate::error::ConfigError;

/// Short collection names and the catalog ids they map to.
pub const COLLECTIONS: &[(&str, &str)] = &[
    ("landsat7_c2_l2", "LANDSAT/LE07/C02/T1_L2"),
    ("landsat8_c2_l2", "LANDSAT/LC08/C02/T1_L2"),
    ("sentinel2_toa", "COPERNICUS/S2"),
    ("sentinel2_sr", "COPERNICUS/S2_SR"),
    ("modis_nbar", "MODIS/006/MCD43A4"),
];

/// Default collection for searches.
pub const DEFAULT_COLLECTION: &str = "landsat8_c2_l2";

/// Catalog id for a short collection name.
pub fn collection_id(short_name: &str) -> Result<&'static str, ConfigError> {
    let wanted = short_name.to_ascii_lowercase();
    COLLECTIONS
        .iter()
        .find(|(short, _)| *short == wanted)
        .map(|(_, id)| *id)
        .ok_or_else(|| ConfigError::UnknownCollection(short_name.to_string()))
}

/// Whether a catalog collection id has cloud masking support.
pub fn is_known_collection(collection_id: &str) -> bool {
    COLLECTIONS.iter().any(|(_, id)| *id == collection_id)
}

/// Split an image id into its collection id and image index.
///
/// `LANDSAT/LC08/C02/T1_L2/LC08_172083_20210101` gives
/// `("LANDSAT/LC08/C02/T1_L2", "LC08_172083_20210101")`. Ids without a `/`
/// have an empty collection.
pub fn split_id(image_id: &str) -> (&str, &str) {
    match image_id.rsplit_once('/') {
        Some((collection, index)) => (collection, index),
        None => ("", image_id),
    }
}

/// File-system friendly name for an image id.
pub fn output_name(image_id: &str) -> String {
    image_id.replace('/', "-")
}
