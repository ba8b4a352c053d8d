//! Integration tests for chained commands.
//!
//! Exercises `search`, `composite` and `download` sharing one pipeline
//! context, the way `cloudfree search ... composite ... download ...` runs.
//!
//! Run with: `cargo test --test pipeline_integration`

mod common;

use std::fs;

use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;

use cloudfree::batch::{run_downloads, SilentReporter};
use cloudfree::catalog::{composite, search, CompositeMethod, SearchArgs};
use cloudfree::download::DownloadDriver;
use cloudfree::geometry::Geometry;
use cloudfree::image::{ImageInfo, Overrides, ResolutionError};
use cloudfree::pipeline::PipelineContext;
use cloudfree::{ConfigError, Error};

use common::{
    file_names, landsat_info, FakeFetcher, FakeService, COMPOSITE_ID, LANDSAT_ID,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn cape_bbox() -> Geometry {
    Geometry::from_bbox(20.0, -34.0, 21.0, -33.0)
}

fn search_args() -> SearchArgs {
    SearchArgs {
        collection: "landsat8_c2_l2".to_string(),
        start_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        end_date: None,
        region: cape_bbox(),
        valid_portion: 10.0,
    }
}

fn service() -> FakeService {
    FakeService::new()
        .with_image(LANDSAT_ID, landsat_info(LANDSAT_ID))
        .with_search_results(&[LANDSAT_ID])
        .with_composite_info(ImageInfo::default())
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_search_then_download() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let fetcher = FakeFetcher::raster(b"scene");
    let mut context = PipelineContext::new();

    let results = search(&service, &search_args()).unwrap();
    context.record_search(&results);

    let query = &service.searches.lock().unwrap()[0];
    assert_eq!(query.collection, "LANDSAT/LC08/C02/T1_L2");
    assert_eq!(query.end_date, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
    assert_eq!(query.valid_portion, 10.0);

    let entries = context.resolve_images(&service, &[], false, true).unwrap();
    let region = context.resolve_region(None, None, 5.0).unwrap();
    let overrides = Overrides::default().with_region(region);
    let driver = DownloadDriver::new(&service, &fetcher);

    let outcomes = run_downloads(
        &service,
        &driver,
        &entries,
        &overrides,
        dir.path(),
        false,
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(service.downloads.lock().unwrap()[0].region, cape_bbox());
    assert_eq!(
        file_names(dir.path()),
        vec![
            "LANDSAT-LC08-C02-T1_L2-LC08_172083_20210101.tif",
            "LANDSAT-LC08-C02-T1_L2-LC08_172083_20210101.tif.aux.xml",
        ]
    );
}

#[test]
fn test_search_composite_download() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let fetcher = FakeFetcher::raster(b"composite");
    let mut context = PipelineContext::new();

    let results = search(&service, &search_args()).unwrap();
    context.record_search(&results);

    let ids = context.take_composite_ids(&[]).unwrap();
    let entry = composite(&service, &ids, CompositeMethod::default(), true, true).unwrap();
    assert_eq!(entry.id, COMPOSITE_ID);
    context.record_composite(entry);

    let request = &service.composites.lock().unwrap()[0];
    assert_eq!(request.ids, vec![LANDSAT_ID]);
    assert_eq!(request.method, CompositeMethod::QMosaic);
    assert!(request.mask);

    let entries = context.resolve_images(&service, &[], false, true).unwrap();
    assert_eq!(entries.len(), 1);

    let region = context.resolve_region(None, None, 5.0).unwrap();
    let overrides = Overrides::default()
        .with_region(region)
        .with_crs("EPSG:32634")
        .with_scale(30.0);
    let driver = DownloadDriver::new(&service, &fetcher);
    let outcomes = run_downloads(
        &service,
        &driver,
        &entries,
        &overrides,
        dir.path(),
        false,
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(outcomes[0].path, dir.path().join(format!("{COMPOSITE_ID}.tif")));
    assert_eq!(fs::read(&outcomes[0].path).unwrap(), b"composite");
}

#[test]
fn test_composite_needs_projection() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let fetcher = FakeFetcher::raster(b"composite");
    let mut context = PipelineContext::new();

    context.record_search(&search(&service, &search_args()).unwrap());
    let ids = context.take_composite_ids(&[]).unwrap();
    context.record_composite(composite(&service, &ids, CompositeMethod::Median, true, true).unwrap());

    let entries = context.resolve_images(&service, &[], false, true).unwrap();
    let overrides = Overrides::default().with_region(cape_bbox());
    let driver = DownloadDriver::new(&service, &fetcher);
    let err = run_downloads(
        &service,
        &driver,
        &entries,
        &overrides,
        dir.path(),
        false,
        &SilentReporter,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Resolution(ResolutionError::MissingProjection { .. })
    ));
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_download_without_source_fails() {
    let service = service();
    let context = PipelineContext::new();

    let err = context.resolve_images(&service, &[], false, true).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::NoImageSource)));
    assert!(matches!(
        context.resolve_region(None, None, 5.0),
        Err(ConfigError::NoRegion)
    ));
}

#[test]
fn test_search_results_files() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let results = search(&service, &search_args()).unwrap();

    let csv_path = dir.path().join("results.csv");
    results.write_to(&csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("ID,DATE_ACQUIRED,VALID_PORTION"));
    assert!(lines.next().unwrap().starts_with(LANDSAT_ID));

    let json_path = dir.path().join("results.json");
    results.write_to(&json_path).unwrap();
    let json: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["0"]["ID"], LANDSAT_ID);
    assert_eq!(json["0"]["VALID_PORTION"], 87.5);

    let err = results.write_to(&dir.path().join("results.txt")).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnknownOutputExtension { .. })
    ));
}
