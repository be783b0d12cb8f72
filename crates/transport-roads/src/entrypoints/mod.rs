//! Process setup shared by the binary: logging and version reporting

mod metadata;
mod profiling;

pub use metadata::{log_version_info, short_version_info};
pub use profiling::setup_logging_and_profiling;
