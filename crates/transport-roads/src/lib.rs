//! Transport Roads - Application Library
//!
//! Command-line front end over `transport-roads-lib`: seeds a datastore from a
//! segments file, applies surface updates and prints paged listings as JSON lines.

mod app;
mod entrypoints;

pub use app::{
    AppError, Command, LineString, NearArgs, RectArgs, RoadView, SegmentView, Settings,
    apply_updates, load_datastore, run,
};
pub use entrypoints::{log_version_info, setup_logging_and_profiling, short_version_info};
