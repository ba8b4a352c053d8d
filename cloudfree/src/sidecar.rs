//! PAM sidecar files.
//!
//! Image metadata is persisted next to a downloaded raster as
//! `<raster>.aux.xml` in the GDAL persistent auxiliary metadata layout:
//!
//! ```xml
//! <PAMDataset>
//!    <Metadata>
//!       <MDI key="CLOUD_COVER">3.2</MDI>
//!    </Metadata>
//!    <PAMRasterBand band="1">
//!       <Description>SR_B2</Description>
//!       <Metadata>
//!          <MDI key="ID">SR_B2</MDI>
//!       </Metadata>
//!    </PAMRasterBand>
//! </PAMDataset>
//! ```

use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::image::{ImageInfo, FOOTPRINT_PROPERTY};

const INDENT: usize = 3;

/// Sidecar read or write failure.
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("failed to write sidecar {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read sidecar {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid sidecar {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Sidecar path for a raster: the raster file name with `.aux.xml` appended.
pub fn sidecar_path(raster: &Path) -> PathBuf {
    let mut name = OsString::from(raster.as_os_str());
    name.push(".aux.xml");
    PathBuf::from(name)
}

/// Serialize image metadata to a sidecar file.
///
/// The footprint property is omitted. Band attribute keys are upper-cased.
pub fn write_sidecar(info: &ImageInfo, path: &Path) -> Result<(), SidecarError> {
    let xml = render(info).map_err(|e| SidecarError::Write {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, e),
    })?;
    fs::write(path, xml).map_err(|source| SidecarError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bands = info.bands.len(), "sidecar written");
    Ok(())
}

fn render(info: &ImageInfo) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);

    write(&mut writer, Event::Start(BytesStart::new("PAMDataset")))?;

    let properties = info
        .properties
        .iter()
        .filter(|(key, _)| key.as_str() != FOOTPRINT_PROPERTY)
        .map(|(key, value)| (key.clone(), format_value(value)));
    write_metadata(&mut writer, properties)?;

    for (index, band) in info.bands.iter().enumerate() {
        let number = (index + 1).to_string();
        let mut start = BytesStart::new("PAMRasterBand");
        start.push_attribute(("band", number.as_str()));
        write(&mut writer, Event::Start(start))?;

        if let Some(id) = band.id() {
            write(&mut writer, Event::Start(BytesStart::new("Description")))?;
            write(&mut writer, Event::Text(BytesText::new(id)))?;
            write(&mut writer, Event::End(BytesEnd::new("Description")))?;
        }

        let attributes = band
            .attributes()
            .iter()
            .map(|(key, value)| (key.to_uppercase(), format_value(value)));
        write_metadata(&mut writer, attributes)?;

        write(&mut writer, Event::End(BytesEnd::new("PAMRasterBand")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("PAMDataset")))?;

    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

fn write_metadata(
    writer: &mut Writer<Vec<u8>>,
    items: impl Iterator<Item = (String, String)>,
) -> Result<(), String> {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return write(writer, Event::Empty(BytesStart::new("Metadata")));
    }

    write(writer, Event::Start(BytesStart::new("Metadata")))?;
    for (key, value) in items {
        let mut start = BytesStart::new("MDI");
        start.push_attribute(("key", key.as_str()));
        write(writer, Event::Start(start))?;
        write(writer, Event::Text(BytesText::new(&value)))?;
        write(writer, Event::End(BytesEnd::new("MDI")))?;
    }
    write(writer, Event::End(BytesEnd::new("Metadata")))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(to_reason)
}

fn to_reason(e: impl Display) -> String {
    e.to_string()
}

/// Strings are written bare, everything else as JSON.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A metadata item: key and text value.
pub type MetadataItem = (String, String);

/// A parsed sidecar file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PamDataset {
    pub metadata: Vec<MetadataItem>,
    pub bands: Vec<PamBand>,
}

/// One `PAMRasterBand` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PamBand {
    /// 1-based band number.
    pub band: usize,
    pub description: Option<String>,
    pub metadata: Vec<MetadataItem>,
}

impl PamDataset {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.iter().map(|(key, _)| key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a sidecar file.
pub fn read_sidecar(path: &Path) -> Result<PamDataset, SidecarError> {
    let xml = fs::read(path).map_err(|source| SidecarError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&xml).map_err(|reason| SidecarError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse(xml: &[u8]) -> Result<PamDataset, String> {
    // Values are kept verbatim; indentation between elements falls outside
    // any MDI or Description and is dropped by `ParseState::text`.
    let mut reader = Reader::from_reader(xml);

    let mut state = ParseState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(to_reason)? {
            Event::Start(ref e) => state.open(e)?,
            Event::Empty(ref e) => {
                state.open(e)?;
                state.close(e.name().as_ref());
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(to_reason)?;
                state.text(&text);
            }
            Event::End(ref e) => state.close(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !state.seen_root {
        return Err("missing PAMDataset root element".to_string());
    }
    Ok(state.dataset)
}

#[derive(Default)]
struct ParseState {
    dataset: PamDataset,
    band: Option<PamBand>,
    item: Option<(String, String)>,
    in_description: bool,
    seen_root: bool,
}

impl ParseState {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        match element.name().as_ref() {
            b"PAMDataset" => self.seen_root = true,
            b"PAMRasterBand" => {
                let number = required_attribute(element, b"band")?;
                let band = number
                    .parse::<usize>()
                    .map_err(|e| format!("invalid band number {:?}: {}", number, e))?;
                self.band = Some(PamBand {
                    band,
                    ..Default::default()
                });
            }
            b"Description" => self.in_description = true,
            b"MDI" => {
                let key = required_attribute(element, b"key")?;
                self.item = Some((key, String::new()));
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.in_description {
            if let Some(band) = self.band.as_mut() {
                band.description
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
        } else if let Some((_, value)) = self.item.as_mut() {
            value.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"PAMRasterBand" => {
                if let Some(band) = self.band.take() {
                    self.dataset.bands.push(band);
                }
            }
            b"Description" => self.in_description = false,
            b"MDI" => {
                if let Some(item) = self.item.take() {
                    match self.band.as_mut() {
                        Some(band) => band.metadata.push(item),
                        None => self.dataset.metadata.push(item),
                    }
                }
            }
            _ => {}
        }
    }
}

fn required_attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<String, String> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(to_reason)?;
        if attribute.key.as_ref() == name {
            return attribute
                .unescape_value()
                .map(|value| value.into_owned())
                .map_err(to_reason);
        }
    }
    Err(format!(
        "<{}> without {} attribute",
        String::from_utf8_lossy(element.name().as_ref()),
        String::from_utf8_lossy(name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BandInfo;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn band(value: Value) -> BandInfo {
        BandInfo::new(value.as_object().cloned().unwrap_or_default())
    }

    fn sample_info() -> ImageInfo {
        let mut properties = Map::new();
        properties.insert("CLOUD_COVER".to_string(), json!(3.2));
        properties.insert(
            FOOTPRINT_PROPERTY.to_string(),
            json!({"type": "LinearRing", "coordinates": [[0, 0], [1, 0], [1, 1], [0, 0]]}),
        );
        properties.insert("SPACECRAFT_ID".to_string(), json!("LANDSAT_8"));
        properties.insert("system:time_start".to_string(), json!(1609489282000_i64));

        ImageInfo {
            id: Some("LANDSAT/LC08/C02/T1_L2/LC08_172083_20210101".to_string()),
            crs: Some("EPSG:32634".to_string()),
            scale: Some(30.0),
            bands: vec![
                band(json!({"id": "SR_B2", "crs": "EPSG:32634", "scale": 30.0, "center_wavelength": 0.48})),
                band(json!({"id": "SR_B3", "crs": "EPSG:32634", "scale": 30.0})),
                band(json!({"crs": "EPSG:32634", "scale": 30.0})),
            ],
            properties,
        }
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/data/scene.tif")),
            PathBuf::from("/data/scene.tif.aux.xml")
        );
    }

    #[test]
    fn test_render_layout() {
        let xml = String::from_utf8(render(&sample_info()).unwrap()).unwrap();

        assert!(xml.starts_with("<PAMDataset>\n   <Metadata>\n      <MDI key=\"CLOUD_COVER\">3.2</MDI>"));
        assert!(xml.contains("<MDI key=\"SPACECRAFT_ID\">LANDSAT_8</MDI>"));
        assert!(xml.contains("<PAMRasterBand band=\"1\">\n      <Description>SR_B2</Description>"));
        assert!(xml.contains("<MDI key=\"CENTER_WAVELENGTH\">0.48</MDI>"));
        assert!(!xml.contains(FOOTPRINT_PROPERTY));
        assert!(!xml.starts_with("<?xml"));
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.tif.aux.xml");
        let info = sample_info();

        write_sidecar(&info, &path).unwrap();
        let dataset = read_sidecar(&path).unwrap();

        let keys: Vec<&str> = dataset.keys().collect();
        assert_eq!(keys, vec!["CLOUD_COVER", "SPACECRAFT_ID", "system:time_start"]);
        assert_eq!(dataset.get("SPACECRAFT_ID"), Some("LANDSAT_8"));

        assert_eq!(dataset.bands.len(), 3);
        assert_eq!(
            dataset.bands.iter().map(|b| b.band).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(dataset.bands[0].description.as_deref(), Some("SR_B2"));
        assert_eq!(dataset.bands[2].description, None);

        let band_keys: Vec<&str> = dataset.bands[0].metadata.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(band_keys, vec!["ID", "CRS", "SCALE", "CENTER_WAVELENGTH"]);
    }

    #[test]
    fn test_no_properties_writes_empty_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("composite.tif.aux.xml");

        write_sidecar(&ImageInfo::default(), &path).unwrap();
        let dataset = read_sidecar(&path).unwrap();

        assert!(dataset.metadata.is_empty());
        assert!(dataset.bands.is_empty());
    }

    #[test]
    fn test_escapes_text() {
        let mut info = ImageInfo::default();
        info.properties
            .insert("NOTE".to_string(), json!("clouds < 5% & shadows"));
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.aux.xml");

        write_sidecar(&info, &path).unwrap();
        assert_eq!(
            read_sidecar(&path).unwrap().get("NOTE"),
            Some("clouds < 5% & shadows")
        );
    }

    #[test]
    fn test_values_keep_surrounding_whitespace() {
        let mut info = ImageInfo::default();
        info.properties.insert("NOTE".to_string(), json!("  padded "));
        info.bands = vec![band(json!({"id": " B1", "comment": "\tindented"}))];
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.aux.xml");

        write_sidecar(&info, &path).unwrap();
        let dataset = read_sidecar(&path).unwrap();

        assert_eq!(dataset.get("NOTE"), Some("  padded "));
        assert_eq!(dataset.bands[0].description.as_deref(), Some(" B1"));
        assert_eq!(
            dataset.bands[0].metadata,
            vec![
                ("ID".to_string(), " B1".to_string()),
                ("COMMENT".to_string(), "\tindented".to_string()),
            ]
        );
    }

    #[test]
    fn test_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("x.aux.xml");
        let err = write_sidecar(&ImageInfo::default(), &path).unwrap_err();
        assert!(matches!(err, SidecarError::Write { .. }));
    }

    #[test]
    fn test_rejects_non_pam_xml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.aux.xml");
        fs::write(&path, "<Other/>").unwrap();
        assert!(matches!(read_sidecar(&path), Err(SidecarError::Parse { .. })));
    }
}
