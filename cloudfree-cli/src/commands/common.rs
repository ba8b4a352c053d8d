//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use cloudfree::config::ConfigFile;
use cloudfree::export::CancelToken;
use cloudfree::geometry::Geometry;
use cloudfree::image::Overrides;
use cloudfree::region::{BoundingBox, RegionInput, DEFAULT_REGION_BUFFER_PCT};
use cloudfree::service::{HttpBundleFetcher, HttpImageService};

use crate::error::CliError;

/// Region selection, shared by `search`, `download` and `export`.
#[derive(Debug, Clone, Args)]
pub struct RegionArgs {
    /// Region defined by bounding box co-ordinates in WGS84
    #[arg(
        short,
        long,
        num_args = 4,
        value_names = ["XMIN", "YMIN", "XMAX", "YMAX"],
        allow_negative_numbers = true
    )]
    pub bbox: Option<Vec<f64>>,

    /// Region defined by a GeoJSON or raster file
    #[arg(short, long, value_name = "FILE")]
    pub region: Option<PathBuf>,

    /// If --region is a raster file, extend its bounds by this percentage
    #[arg(long, value_name = "PCT", default_value_t = DEFAULT_REGION_BUFFER_PCT)]
    pub region_buf: f64,
}

impl RegionArgs {
    pub fn input(&self) -> Option<RegionInput> {
        self.region.clone().map(RegionInput::Path)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox.as_deref().and_then(BoundingBox::from_slice)
    }
}

/// Image selection and projection, shared by `download` and `export`.
#[derive(Debug, Clone, Args)]
pub struct ImageArgs {
    /// Catalog image id(s)
    #[arg(short, long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Reproject image(s) to this CRS (EPSG code or WKT) [default: source CRS]
    #[arg(short, long)]
    pub crs: Option<String>,

    /// Resample image bands to this pixel size in metres [default: finest source band]
    #[arg(short, long)]
    pub scale: Option<f64>,

    /// Apply the cloud and shadow nodata mask [default: no-mask]
    #[arg(short, long, overrides_with = "no_mask")]
    pub mask: bool,

    /// Don't apply the cloud and shadow nodata mask
    #[arg(long)]
    pub no_mask: bool,

    #[command(flatten)]
    pub refl: ReflectanceArgs,
}

impl ImageArgs {
    pub fn mask(&self) -> bool {
        flag(self.mask, self.no_mask, false)
    }

    /// Projection and region overrides for the resolver.
    pub fn overrides(&self, region: Geometry) -> Overrides {
        let mut overrides = Overrides::default().with_region(region);
        if let Some(crs) = &self.crs {
            overrides = overrides.with_crs(crs.clone());
        }
        if let Some(scale) = self.scale {
            overrides = overrides.with_scale(scale);
        }
        overrides
    }
}

/// Reflectance scaling switch.
#[derive(Debug, Clone, Args)]
pub struct ReflectanceArgs {
    /// Scale reflectance bands to 0-10000 [default: scale-refl]
    #[arg(long, overrides_with = "no_scale_refl")]
    pub scale_refl: bool,

    /// Leave reflectance bands unscaled
    #[arg(long)]
    pub no_scale_refl: bool,
}

impl ReflectanceArgs {
    pub fn enabled(&self) -> bool {
        flag(self.scale_refl, self.no_scale_refl, true)
    }
}

/// Resolve an `--x/--no-x` flag pair.
pub fn flag(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

/// Connections and settings for commands that talk to the service.
pub struct Session {
    pub config: ConfigFile,
    pub service: HttpImageService,
    pub fetcher: HttpBundleFetcher,
    pub cancel: CancelToken,
}

impl Session {
    /// Connect using the service settings from `config`.
    pub fn connect(config: ConfigFile, cancel: CancelToken) -> Result<Self, CliError> {
        let service_config = config.service_config();
        if service_config.project.is_empty() {
            return Err(CliError::Config(
                "No service project configured. Use 'cloudfree config set service.project <name>'."
                    .to_string(),
            ));
        }

        let service = HttpImageService::new(&service_config)
            .map_err(|e| CliError::Library(e.into()))?;
        let fetcher = HttpBundleFetcher::new(&service_config)
            .map_err(|e| CliError::Library(e.into()))?;

        Ok(Self {
            config,
            service,
            fetcher,
            cancel,
        })
    }
}
