//! Asynchronous export jobs.

mod clock;
mod driver;
mod error;

pub use clock::{CancelToken, Clock, SystemClock};
pub use driver::{
    ExportDriver, ExportJob, ExportProgressCallback, JobPhase, MonitorSettings,
    DEFAULT_MAX_PIXELS, DEFAULT_POLL_INTERVAL, DESCRIPTION_LIMIT, LABEL_LIMIT,
};
pub use error::ExportError;
