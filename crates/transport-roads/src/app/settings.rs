use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use transport_roads_lib::{DEFAULT_PAGE_LIMIT, Pagination, SpatialFilter};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Transport Roads - Query and update an in-memory road segment catalogue
pub struct Settings {
    /// The file to seed road segments from
    #[clap(long, env = "TRANSPORTATION_SEGMENTS_FILE", value_name = "FILE")]
    pub segsfile: Option<PathBuf>,

    /// Surface update commands (JSON lines) to apply after seeding
    #[clap(long, value_name = "FILE")]
    pub updates: Option<PathBuf>,

    /// Number of results to skip
    #[clap(long, default_value = "0", global = true)]
    pub offset: usize,

    /// Maximum number of results to print
    #[clap(long, default_value_t = DEFAULT_PAGE_LIMIT, global = true)]
    pub limit: usize,

    #[clap(subcommand)]
    pub command: Command,
}

impl Settings {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.offset, self.limit)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List roads with a segment closer than the given distance to a point
    RoadsNear(NearArgs),
    /// List segments closer than the given distance to a point, most recently updated first
    SegmentsNear(NearArgs),
    /// List roads whose bounding box intersects a rectangle
    RoadsWithin(RectArgs),
    /// List segments intersecting a rectangle, most recently updated first
    SegmentsWithin(RectArgs),
    /// Show a single segment
    Segment {
        /// Segment id
        id: String,
    },
    /// Show a single road
    Road {
        /// Road id
        id: String,
    },
    /// Apply surface update commands (JSON lines, `-` for stdin) and print the resulting events
    ApplyUpdates {
        #[clap(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print datastore statistics
    Info,
}

#[derive(Args, Debug, Clone)]
pub struct NearArgs {
    /// Latitude in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Maximum distance in meters
    #[clap(long, default_value = "1000")]
    pub distance: u64,
}

impl NearArgs {
    pub fn filter(&self) -> SpatialFilter {
        SpatialFilter::near_point(self.lat, self.lon, self.distance)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RectArgs {
    /// Latitude of the first corner
    #[clap(long, allow_hyphen_values = true)]
    pub lat0: f64,

    /// Longitude of the first corner
    #[clap(long, allow_hyphen_values = true)]
    pub lon0: f64,

    /// Latitude of the opposite corner
    #[clap(long, allow_hyphen_values = true)]
    pub lat1: f64,

    /// Longitude of the opposite corner
    #[clap(long, allow_hyphen_values = true)]
    pub lon1: f64,
}

impl RectArgs {
    pub fn filter(&self) -> SpatialFilter {
        SpatialFilter::within_rect(self.lat0, self.lon0, self.lat1, self.lon1)
    }
}
