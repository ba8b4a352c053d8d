//! Error types for image descriptor resolution.

use thiserror::Error;

use crate::service::ServiceError;

/// Native sensor CRS that the service cannot export correctly.
pub const UNSUPPORTED_NATIVE_CRS: &str = "SR-ORG:6974";

/// Issue tracking the export bug for [`UNSUPPORTED_NATIVE_CRS`].
pub const UNSUPPORTED_CRS_ISSUE: &str = "https://issuetracker.google.com/issues/194561313";

/// An image's metadata cannot be resolved into export-ready parameters.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Metadata could not be fetched.
    #[error("failed to fetch metadata for {name}: {source}")]
    Metadata { name: String, source: ServiceError },

    /// The image has no native CRS/scale and no overrides were given.
    #[error("{id} appears to be a composite in WGS84, specify a scale and CRS")]
    MissingProjection { id: String },

    /// The image's native CRS is known to export incorrectly.
    #[error("{id}: there is an export bug in {crs}, specify another CRS: {issue}", issue = UNSUPPORTED_CRS_ISSUE)]
    UnsupportedCrs { id: String, crs: String },

    /// No region override and no intrinsic footprint.
    #[error("{id} does not have a footprint, specify a region to download")]
    MissingFootprint { id: String },

    /// The destination region is not a usable geometry.
    #[error("{id}: invalid region: {reason}")]
    InvalidRegion { id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_crs_mentions_issue() {
        let err = ResolutionError::UnsupportedCrs {
            id: "MODIS/006/MCD43A4/2021_01_01".to_string(),
            crs: UNSUPPORTED_NATIVE_CRS.to_string(),
        };
        let message = err.to_string();
        assert!(message.contains(UNSUPPORTED_NATIVE_CRS));
        assert!(message.contains(UNSUPPORTED_CRS_ISSUE));
    }

    #[test]
    fn test_missing_footprint_display() {
        let err = ResolutionError::MissingFootprint {
            id: "composite".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "composite does not have a footprint, specify a region to download"
        );
    }
}
