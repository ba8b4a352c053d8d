//! In-process fakes shared by the integration tests.
//!
//! No network access and no real sleeping: the service answers from
//! in-memory tables, bundles are zipped in memory and the clock advances only
//! when asked to sleep.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use cloudfree::export::Clock;
use cloudfree::image::{BandInfo, ImageInfo, FOOTPRINT_PROPERTY};
use cloudfree::service::{
    BundleFetcher, CompositeImage, CompositeRequest, DownloadParams, ExportParams, ExportTask,
    ImageRef, ImageService, RemoteBody, SearchQuery, SearchRecord, ServiceError, ServiceResult,
    TaskStatus,
};

// ============================================================================
// Fixtures
// ============================================================================

pub const LANDSAT_ID: &str = "LANDSAT/LC08/C02/T1_L2/LC08_172083_20210101";
pub const COMPOSITE_ID: &str = "LANDSAT-LC08-C02-T1_L2-Q_MOSAIC-2021_01_01-2021_01_02";

/// Footprint ring over the Cape Peninsula.
pub fn footprint() -> Value {
    json!({
        "type": "LinearRing",
        "coordinates": [[20.0, -34.0], [21.0, -34.0], [21.0, -33.0], [20.0, -33.0], [20.0, -34.0]]
    })
}

/// Metadata of a Landsat 8 scene with two bands.
pub fn landsat_info(id: &str) -> ImageInfo {
    let mut properties = Map::new();
    properties.insert(FOOTPRINT_PROPERTY.to_string(), footprint());
    properties.insert("CLOUD_COVER".to_string(), json!(3.2));
    properties.insert("SPACECRAFT_ID".to_string(), json!("LANDSAT_8"));

    let band = |name: &str| {
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), json!(name));
        attributes.insert("crs".to_string(), json!("EPSG:32634"));
        attributes.insert("scale".to_string(), json!(30.0));
        BandInfo::new(attributes)
    };

    ImageInfo {
        id: Some(id.to_string()),
        crs: Some("EPSG:32634".to_string()),
        scale: Some(30.0),
        bands: vec![band("SR_B2"), band("SR_B3")],
        properties,
    }
}

/// Zip `entries` into an in-memory bundle.
pub fn zip_bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Operation record as returned by the status endpoint.
pub fn status(progress: Option<f64>, done: bool, state: &str) -> Value {
    let mut metadata = json!({"description": "export", "state": state});
    if let Some(progress) = progress {
        metadata["progress"] = json!(progress);
    }
    json!({"name": "operations/1", "metadata": metadata, "done": done})
}

// ============================================================================
// Fake service
// ============================================================================

/// Scripted imagery service.
#[derive(Default)]
pub struct FakeService {
    infos: HashMap<String, ImageInfo>,
    search_results: Vec<SearchRecord>,
    composite_info: Option<ImageInfo>,
    download_error: Mutex<Option<ServiceError>>,
    statuses: Mutex<VecDeque<Value>>,

    pub info_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub downloads: Mutex<Vec<DownloadParams>>,
    pub exports: Mutex<Vec<ExportParams>>,
    pub composites: Mutex<Vec<CompositeRequest>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, id: &str, info: ImageInfo) -> Self {
        self.infos.insert(id.to_string(), info);
        self
    }

    pub fn with_search_results(mut self, ids: &[&str]) -> Self {
        self.search_results = ids
            .iter()
            .map(|id| {
                let mut properties = Map::new();
                properties.insert("DATE_ACQUIRED".to_string(), json!("2021-01-01"));
                properties.insert("VALID_PORTION".to_string(), json!(87.5));
                SearchRecord {
                    id: id.to_string(),
                    properties,
                }
            })
            .collect();
        self
    }

    /// Metadata returned alongside composites. Without it, composites come
    /// back bare.
    pub fn with_composite_info(mut self, info: ImageInfo) -> Self {
        self.composite_info = Some(info);
        self
    }

    pub fn with_download_error(self, error: ServiceError) -> Self {
        *self.download_error.lock().unwrap() = Some(error);
        self
    }

    /// Status records returned in order. The last one repeats.
    pub fn with_statuses(self, statuses: Vec<Value>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    fn asset_key(image: &ImageRef) -> String {
        let value = image.as_value();
        value
            .get("asset")
            .or_else(|| value.get("composite"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl ImageService for FakeService {
    fn image_info(&self, image: &ImageRef) -> ServiceResult<ImageInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::asset_key(image);
        if let Some(info) = self.infos.get(&key) {
            return Ok(info.clone());
        }
        if key == COMPOSITE_ID {
            if let Some(info) = &self.composite_info {
                return Ok(info.clone());
            }
        }
        Err(ServiceError::Api {
            status: 404,
            message: format!("Image.load: Image asset '{key}' not found."),
        })
    }

    fn download_url(&self, image: &ImageRef, params: &DownloadParams) -> ServiceResult<String> {
        if let Some(error) = self.download_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.downloads.lock().unwrap().push(params.clone());
        Ok(format!(
            "https://fake.example/download/{}",
            Self::asset_key(image).replace('/', "_")
        ))
    }

    fn start_export(&self, _image: &ImageRef, params: &ExportParams) -> ServiceResult<ExportTask> {
        let mut exports = self.exports.lock().unwrap();
        exports.push(params.clone());
        Ok(ExportTask {
            name: format!("operations/{}", exports.len()),
            description: params.description.clone(),
        })
    }

    fn task_status(&self, _task: &ExportTask) -> ServiceResult<TaskStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let record = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        record
            .map(TaskStatus::from_value)
            .ok_or_else(|| ServiceError::Http("no status scripted".to_string()))
    }

    fn search(&self, query: &SearchQuery) -> ServiceResult<Vec<SearchRecord>> {
        self.searches.lock().unwrap().push(query.clone());
        Ok(self.search_results.clone())
    }

    fn composite(&self, request: &CompositeRequest) -> ServiceResult<CompositeImage> {
        self.composites.lock().unwrap().push(request.clone());
        Ok(CompositeImage {
            id: COMPOSITE_ID.to_string(),
            image: ImageRef::from_value(json!({
                "composite": COMPOSITE_ID,
                "ids": request.ids,
            })),
            info: None,
        })
    }
}

// ============================================================================
// Fake bundle transport
// ============================================================================

/// Serves the same bundle for every link.
pub struct FakeFetcher {
    bundle: Mutex<Vec<u8>>,
    pub fetches: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(bundle: Vec<u8>) -> Self {
        Self {
            bundle: Mutex::new(bundle),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Serve a bundle holding one raster with `content`.
    pub fn raster(content: &[u8]) -> Self {
        Self::new(zip_bundle(&[("download.SR_B2.tif", content)]))
    }

    pub fn set_bundle(&self, bundle: Vec<u8>) {
        *self.bundle.lock().unwrap() = bundle;
    }
}

impl BundleFetcher for FakeFetcher {
    fn fetch(&self, _url: &str) -> ServiceResult<RemoteBody> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let bundle = self.bundle.lock().unwrap().clone();
        Ok(RemoteBody {
            content_length: Some(bundle.len() as u64),
            reader: Box::new(Cursor::new(bundle)),
        })
    }
}

// ============================================================================
// Fake clock
// ============================================================================

/// Clock that advances by exactly the requested sleep.
pub struct FakeClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    pub sleeps: AtomicUsize,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: AtomicUsize::new(0),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        *self.elapsed.lock().unwrap() += duration;
    }
}

/// Regular files left in `dir`, by name.
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
