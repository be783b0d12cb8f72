//! Transport Roads Library - In-memory road catalogue with spatial queries
//!
//! This library keeps roads, decomposed into polyline segments, in memory and answers
//! the spatial listings behind a read/write road API: which roads or segments are near
//! a point, which intersect a rectangle, one page at a time. It also records surface
//! type observations per segment, and those updates are visible to the next query.
//!
//! # Architecture
//!
//! - **[`Point`] / [`Rectangle`]**: WGS84 coordinates and bounding-box algebra
//! - **[`RoadSegment`]**: A polyline of [`RoadSegmentLine`]s with a surface classification
//! - **[`Road`]**: An append-only collection of segments sharing a road id
//! - **[`Datastore`]**: Aggregate root with the segment index, seeding and all queries
//! - **[`SpatialFilter`] / [`Pagination`]**: Turn a filter and window into ordered pages
//! - **[`SharedDatastore`]**: Single-writer/many-reader handle for concurrent embeddings
//!
//! # Performance Characteristics
//!
//! - **Query Time**: O(R + S) linear scan, R = roads, S = segments of matching roads
//! - **Update Time**: O(1) index lookup plus O(s) scan of the owning road's segments

mod config;
mod datastore;
mod geometry;
pub mod messaging;
mod query;
mod road;
mod seed;
mod segment;
mod shared;

// Public API exports
pub use config::{Config, KNOWN_SURFACE_TYPES, SurfaceObservation, ValidationConfig};
pub use datastore::{Datastore, DatastoreInfo};
pub use geometry::{EARTH_RADIUS_M, Point, Rectangle};
pub use query::{
    DEFAULT_PAGE_LIMIT, Pagination, SpatialFilter, compare_by_recency, paginate_roads,
    paginate_segments, sort_by_recency,
};
pub use road::Road;
pub use seed::MIN_FIELDS_PER_RECORD;
pub use segment::{RoadSegment, RoadSegmentLine, SurfaceClassification};
pub use shared::SharedDatastore;

/// Point in time of a surface observation
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Error types for the data module
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no road with id {0} in datastore")]
    RoadNotFound(String),

    #[error("unable to find RoadSegment with id {0}")]
    SegmentNotFound(String),

    #[error("no road mapping exists from segment {0}")]
    SegmentMappingNotFound(String),

    #[error("segment {segment_id} already belongs to road {road_id}")]
    DuplicateSegment { segment_id: String, road_id: String },

    #[error("segment {segment_id} belongs to road {segment_road_id}, not {road_id}")]
    SegmentRoadMismatch {
        segment_id: String,
        segment_road_id: String,
        road_id: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to parse ({lat},{lon}) as a coordinate")]
    InvalidCoordinate { lat: String, lon: String },

    #[error("surface type {0:?} does not match any known types")]
    UnknownSurfaceType(String),

    #[error("probability {0} is not within acceptable range: (0, 1.0]")]
    ProbabilityOutOfRange(f64),

    #[error("position ({lat}, {lon}) is out of bounds")]
    PositionOutOfBounds { lat: f64, lon: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("datastore lock poisoned by a panicking writer")]
    LockPoisoned,
}

impl DataError {
    /// True for lookups of unknown roads, segments or segment mappings
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataError::RoadNotFound(_)
                | DataError::SegmentNotFound(_)
                | DataError::SegmentMappingNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> Datastore = Datastore::new;
        let _: fn() -> Config = Config::default;
        let _: fn(Datastore) -> SharedDatastore = SharedDatastore::new;
    }

    #[test]
    fn test_not_found_classification() {
        assert!(DataError::RoadNotFound("R1".into()).is_not_found());
        assert!(DataError::SegmentMappingNotFound("S1".into()).is_not_found());
        assert!(!DataError::InvalidGeometry("x".into()).is_not_found());
        assert!(!DataError::LockPoisoned.is_not_found());
    }
}
