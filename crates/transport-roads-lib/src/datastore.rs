//! Datastore - Aggregate root owning all roads and the segment index
//!
//! Queries are linear scans over every road, using each road's bounding box as a
//! pre-filter before testing its segments. There is no spatial tree.

use crate::{Config, DataError, Point, Rectangle, Result, Road, RoadSegment, Timestamp, seed};

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;

/// Summary information about the datastore contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatastoreInfo {
    /// Number of roads
    pub road_count: usize,
    /// Number of segments across all roads
    pub segment_count: usize,
    /// Number of segments with at least one surface observation
    pub modified_segment_count: usize,
}

/// In-memory catalogue of roads and their segments
///
/// All mutation goes through `&mut self`. Embeddings that share a datastore between
/// threads should wrap it in a [`crate::SharedDatastore`].
#[derive(Clone, Debug, Default)]
pub struct Datastore {
    /// All roads keyed by road id
    roads: HashMap<String, Road>,
    /// Secondary index from segment id to the id of the owning road
    segment_to_road: HashMap<String, String>,
    /// Configuration settings
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Datastore {
    /// Create an empty datastore with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            roads: HashMap::new(),
            segment_to_road: HashMap::new(),
            config,
        }
    }

    /// Create a datastore and seed it from `reader`
    ///
    /// # Errors
    /// Returns [`DataError::Io`] if the source cannot be read to the end.
    pub fn from_reader<R: BufRead>(config: Config, reader: R) -> Result<Self> {
        let mut datastore = Self::new(config);
        datastore.seed(reader)?;
        Ok(datastore)
    }

    /// Bulk load road segments from the delimited text format
    ///
    /// Segments sharing a road id are attached to the same road. Malformed records
    /// and records reusing a known segment id are logged and skipped. The source is
    /// read completely before anything is inserted, so a read failure leaves the
    /// datastore untouched.
    ///
    /// Returns the number of roads in the datastore after seeding.
    pub fn seed<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("datastore::seed");

        tracing::info!("Seeding datastore ...");

        let segments = seed::read_segments(reader).inspect_err(|err| {
            tracing::error!("Seeding failed: {err}");
        })?;

        let mut seeded = 0usize;
        for segment in segments {
            match self.add_segment(segment) {
                Ok(()) => seeded += 1,
                Err(err) => tracing::warn!("Skipping seed record: {err}"),
            }
        }

        tracing::info!(
            "Datastore seeded with {} roads ({} segments).",
            self.roads.len(),
            seeded
        );

        Ok(self.roads.len())
    }

    /// Insert a road, indexing all of its segments
    ///
    /// A road with the same id is replaced, and its segments are dropped from the index.
    ///
    /// # Errors
    /// Returns [`DataError::SegmentRoadMismatch`] if a segment names another road, and
    /// [`DataError::DuplicateSegment`] if any of the road's segment ids is already
    /// owned by a different road or repeated within the road.
    pub fn add_road(&mut self, road: Road) -> Result<()> {
        self.check_segment_ids(&road)?;

        if let Some(old) = self.roads.remove(road.id()) {
            for segment_id in old.segment_ids() {
                self.segment_to_road.remove(segment_id);
            }
        }

        for segment_id in road.segment_ids() {
            self.segment_to_road
                .insert(segment_id.to_string(), road.id().to_string());
        }
        self.roads.insert(road.id().to_string(), road);

        Ok(())
    }

    fn check_segment_ids(&self, road: &Road) -> Result<()> {
        let mut seen = HashSet::new();
        for segment in road.segments() {
            let segment_id = segment.id();
            if segment.road_id() != road.id() {
                return Err(DataError::SegmentRoadMismatch {
                    segment_id: segment_id.to_string(),
                    segment_road_id: segment.road_id().to_string(),
                    road_id: road.id().to_string(),
                });
            }

            let owned_elsewhere = self
                .segment_to_road
                .get(segment_id)
                .filter(|owner| owner.as_str() != road.id());

            if let Some(owner) = owned_elsewhere {
                return Err(DataError::DuplicateSegment {
                    segment_id: segment_id.to_string(),
                    road_id: owner.clone(),
                });
            }
            if !seen.insert(segment_id) {
                return Err(DataError::DuplicateSegment {
                    segment_id: segment_id.to_string(),
                    road_id: road.id().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Insert a single segment into the road named by its road id
    ///
    /// The road is created if it does not exist yet. The segment index is updated in
    /// the same operation.
    ///
    /// # Errors
    /// Returns [`DataError::DuplicateSegment`] if the segment id is already in use.
    pub fn add_segment(&mut self, segment: RoadSegment) -> Result<()> {
        if let Some(owner) = self.segment_to_road.get(segment.id()) {
            return Err(DataError::DuplicateSegment {
                segment_id: segment.id().to_string(),
                road_id: owner.clone(),
            });
        }

        let segment_id = segment.id().to_string();
        let road_id = segment.road_id().to_string();

        match self.roads.get_mut(&road_id) {
            Some(road) => road.add_segment(segment),
            None => {
                let road = Road::new(road_id.clone(), segment);
                self.roads.insert(road_id.clone(), road);
            }
        }
        self.segment_to_road.insert(segment_id, road_id);

        Ok(())
    }

    pub fn get_road_by_id(&self, id: &str) -> Result<&Road> {
        self.roads
            .get(id)
            .ok_or_else(|| DataError::RoadNotFound(id.to_string()))
    }

    /// Look up the road owning a segment through the segment index
    pub fn get_road_by_segment_id(&self, segment_id: &str) -> Result<&Road> {
        let road_id = self
            .segment_to_road
            .get(segment_id)
            .ok_or_else(|| DataError::SegmentMappingNotFound(segment_id.to_string()))?;

        self.get_road_by_id(road_id)
    }

    #[inline]
    pub fn get_road_count(&self) -> usize {
        self.roads.len()
    }

    #[inline]
    pub fn get_segment_count(&self) -> usize {
        self.segment_to_road.len()
    }

    pub fn get_info(&self) -> DatastoreInfo {
        DatastoreInfo {
            road_count: self.roads.len(),
            segment_count: self.segment_to_road.len(),
            modified_segment_count: self
                .roads
                .values()
                .flat_map(Road::segments)
                .filter(|s| s.is_modified())
                .count(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Roads whose bounding box is strictly closer than `max_distance` meters to the point
    pub fn get_roads_near_point(&self, lat: f64, lon: f64, max_distance: u64) -> Vec<&Road> {
        let pt = Point::new(lat, lon);

        self.roads
            .par_iter()
            .map(|(_, road)| road)
            .filter(|road| road.is_within_distance_from_point(max_distance, &pt))
            .collect()
    }

    /// Roads whose bounding box intersects the rectangle spanned by the two corners
    pub fn get_roads_within_rect(&self, lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Vec<&Road> {
        let rect = Rectangle::new(Point::new(lat0, lon0), Point::new(lat1, lon1));

        let roads: Vec<&Road> = self
            .roads
            .par_iter()
            .map(|(_, road)| road)
            .filter(|road| rect.intersects(&road.bounding_box()))
            .collect();

        tracing::info!("Found {} roads within rect {}.", roads.len(), describe(&rect));

        roads
    }

    /// Look up a segment through the segment index
    pub fn get_road_segment_by_id(&self, id: &str) -> Result<&RoadSegment> {
        self.segment_to_road
            .get(id)
            .and_then(|road_id| self.roads.get(road_id))
            .and_then(|road| road.segment(id))
            .ok_or_else(|| DataError::SegmentNotFound(id.to_string()))
    }

    /// Segments with at least one line strictly closer than `max_distance` meters to the point
    ///
    /// Roads are pre-filtered on their bounding box before their segments are tested.
    pub fn get_segments_near_point(
        &self,
        lat: f64,
        lon: f64,
        max_distance: u64,
    ) -> Vec<&RoadSegment> {
        let pt = Point::new(lat, lon);

        self.roads
            .par_iter()
            .map(|(_, road)| road)
            .filter(|road| road.is_within_distance_from_point(max_distance, &pt))
            .flat_map_iter(|road| road.segments_within_distance_from_point(max_distance, &pt))
            .collect()
    }

    /// Segments whose bounding box intersects the rectangle spanned by the two corners
    pub fn get_segments_within_rect(
        &self,
        lat0: f64,
        lon0: f64,
        lat1: f64,
        lon1: f64,
    ) -> Vec<&RoadSegment> {
        let rect = Rectangle::new(Point::new(lat0, lon0), Point::new(lat1, lon1));

        let segments: Vec<&RoadSegment> = self
            .roads
            .par_iter()
            .map(|(_, road)| road)
            .filter(|road| rect.intersects(&road.bounding_box()))
            .flat_map_iter(|road| road.segments_within_rect(&rect))
            .collect();

        tracing::info!("Found {} segments within rect {}.", segments.len(), describe(&rect));

        segments
    }

    /// Record a surface-type observation for a segment
    ///
    /// The classification is overwritten unconditionally. The last-modified markers of
    /// the segment and its owning road only move forward in time. Nothing is mutated
    /// if the segment does not exist.
    ///
    /// No validation of `surface_type` or `probability` happens here; see
    /// [`crate::ValidationConfig`] for checks on external input.
    pub fn update_road_segment_surface(
        &mut self,
        segment_id: &str,
        surface_type: &str,
        probability: f64,
        timestamp: Timestamp,
    ) -> Result<()> {
        let road = self
            .segment_to_road
            .get(segment_id)
            .and_then(|road_id| self.roads.get_mut(road_id))
            .ok_or_else(|| DataError::SegmentNotFound(segment_id.to_string()))?;

        let segment = road
            .segment_mut(segment_id)
            .ok_or_else(|| DataError::SegmentNotFound(segment_id.to_string()))?;

        segment.set_surface_type(surface_type, probability);
        segment.set_last_modified(timestamp);
        road.set_last_modified(timestamp);

        Ok(())
    }
}

fn describe(rect: &Rectangle) -> String {
    let nw = rect.north_west();
    let se = rect.south_east();
    format!("({},{})({},{})", nw.lat(), nw.lon(), se.lat(), se.lon())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::{self, BufReader, Cursor, Read};

    const SINGLE_ROAD: &str = "21277:153930;21277:153930;\
        62.389109;17.310863;62.389084;17.310852;62.389073;17.310854;\
        62.389059;17.310878;62.389057;17.310897;62.389052;17.310940\n";

    fn seeded(data: &str) -> Datastore {
        Datastore::from_reader(Config::default(), Cursor::new(data)).unwrap()
    }

    fn unit_line() -> [Point; 2] {
        [Point::new(1.0, 1.0), Point::new(2.0, 2.0)]
    }

    fn t1() -> Timestamp {
        Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_seed_single_road() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");

        assert_eq!(datastore.get_road_count(), 1);
        let road = datastore.get_road_by_id("R1").unwrap();
        assert_eq!(road.segments().len(), 1);

        let segment = datastore.get_road_segment_by_id("S1").unwrap();
        let expected = Rectangle::new(Point::new(62.0, 17.0), Point::new(62.1, 17.1));
        assert_eq!(segment.bounding_box(), expected);
    }

    #[test]
    fn test_seed_shared_road_id() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR1;S2;62.1;17.1;62.2;17.3\n");

        assert_eq!(datastore.get_road_count(), 1);
        assert_eq!(datastore.get_segment_count(), 2);
        let road = datastore.get_road_by_id("R1").unwrap();
        assert_eq!(road.segment_ids(), vec!["S1", "S2"]);
    }

    #[test]
    fn test_seed_road_bounding_box_covers_all_segments() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR1;S2;62.1;17.1;62.2;17.3\n");
        let road = datastore.get_road_by_id("R1").unwrap();

        let expected = Rectangle::new(Point::new(62.0, 17.0), Point::new(62.2, 17.3));
        assert_eq!(road.bounding_box(), expected);

        // A query window touching only the second segment still finds the road
        let roads = datastore.get_roads_within_rect(62.15, 17.2, 62.25, 17.4);
        assert_eq!(roads.len(), 1);
    }

    #[test]
    fn test_seed_returns_road_count() {
        let mut datastore = Datastore::default();
        let count = datastore
            .seed(Cursor::new("R1;S1;62.0;17.0;62.1;17.1\nR2;S2;63.0;18.0;63.1;18.1\n"))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_seed_skips_duplicate_segment_ids() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR2;S1;63.0;18.0;63.1;18.1\n");

        assert_eq!(datastore.get_road_count(), 1);
        assert_eq!(datastore.get_road_by_segment_id("S1").unwrap().id(), "R1");
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_seed_failure_leaves_datastore_untouched() {
        // The first record is readable, then the source fails
        let data = Cursor::new("R1;S1;62.0;17.0;62.1;17.1\n").chain(FailingReader);
        let mut datastore = Datastore::default();

        let result = datastore.seed(BufReader::new(data));
        assert!(matches!(result, Err(DataError::Io(_))));
        assert_eq!(datastore.get_road_count(), 0);
    }

    #[test]
    fn test_seed_skips_record_with_invalid_utf8() {
        let data: &[u8] = b"R1;S1;62.0;17.0;62.1;17.1\n\
            R2;S2;62.\xe5;18.0;62.1;18.1\n\
            R3;S3;64.0;19.0;64.1;19.1\n";
        let mut datastore = Datastore::default();

        assert_eq!(datastore.seed(Cursor::new(data)).unwrap(), 2);
        assert!(datastore.get_road_by_id("R1").is_ok());
        assert!(datastore.get_road_by_id("R3").is_ok());
        assert!(matches!(
            datastore.get_road_by_id("R2"),
            Err(DataError::RoadNotFound(_))
        ));
    }

    #[test]
    fn test_get_road_by_id_not_found() {
        let datastore = seeded(SINGLE_ROAD);

        assert!(datastore.get_road_by_id("21277:153930").is_ok());
        assert!(matches!(
            datastore.get_road_by_id("nope"),
            Err(DataError::RoadNotFound(_))
        ));
        assert!(matches!(
            datastore.get_road_by_segment_id("nope"),
            Err(DataError::SegmentMappingNotFound(_))
        ));
        assert!(matches!(
            datastore.get_road_segment_by_id("nope"),
            Err(DataError::SegmentNotFound(_))
        ));
    }

    #[test]
    fn test_get_segments_near_point() {
        let datastore = seeded(SINGLE_ROAD);

        let segments = datastore.get_segments_near_point(62.389077, 17.310243, 75);
        assert_eq!(segments.len(), 1);

        let segments = datastore.get_segments_near_point(62.389077, 17.310243, 10);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_get_roads_near_point() {
        let datastore = seeded(SINGLE_ROAD);

        assert_eq!(datastore.get_roads_near_point(62.389077, 17.310243, 75).len(), 1);
        assert!(datastore.get_roads_near_point(63.0, 18.0, 75).is_empty());
    }

    #[test]
    fn test_get_segments_within_rect() {
        let datastore = seeded(SINGLE_ROAD);

        let segments = datastore.get_segments_within_rect(62.389077, 17.310243, 62.4, 17.4);
        assert_eq!(segments.len(), 1);

        let segments = datastore.get_segments_within_rect(62.0, 17.0, 62.1, 17.1);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_segments_within_rect_only_returns_intersecting() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR1;S2;62.5;17.5;62.6;17.6\n");

        let segments = datastore.get_segments_within_rect(62.05, 17.05, 62.3, 17.3);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id(), "S1");
        for segment in segments {
            let rect = Rectangle::new(Point::new(62.05, 17.05), Point::new(62.3, 17.3));
            assert!(segment.bounding_box().intersects(&rect));
        }
    }

    #[test]
    fn test_rect_touching_road_edge_does_not_match() {
        let datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");

        assert!(datastore.get_roads_within_rect(62.1, 17.0, 62.2, 17.1).is_empty());
        assert!(datastore.get_segments_within_rect(62.1, 17.0, 62.2, 17.1).is_empty());
    }

    #[test]
    fn test_update_road_segment_surface() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");
        let t1 = t1();
        let t2 = t1 + Duration::hours(1);

        datastore.update_road_segment_surface("S1", "snow", 0.75, t1).unwrap();
        datastore.update_road_segment_surface("S1", "tarmac", 0.85, t2).unwrap();

        let segment = datastore.get_road_segment_by_id("S1").unwrap();
        let surface = segment.surface_type().unwrap();
        assert_eq!(surface.surface_type, "tarmac");
        assert_eq!(surface.probability, 0.85);
        assert_eq!(segment.date_modified(), Some(t2));
        assert_eq!(datastore.get_road_by_id("R1").unwrap().date_modified(), Some(t2));

        // An older observation still overwrites the classification but not the timestamp
        let t0 = t1 - Duration::hours(1);
        datastore.update_road_segment_surface("S1", "gravel", 0.5, t0).unwrap();
        let segment = datastore.get_road_segment_by_id("S1").unwrap();
        assert_eq!(segment.surface_type().unwrap().surface_type, "gravel");
        assert_eq!(segment.date_modified(), Some(t2));
        assert_eq!(datastore.get_road_by_id("R1").unwrap().date_modified(), Some(t2));
    }

    #[test]
    fn test_update_unknown_segment_mutates_nothing() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");

        let result = datastore.update_road_segment_surface("S9", "snow", 0.75, t1());
        assert!(matches!(result, Err(DataError::SegmentNotFound(_))));
        assert!(result.unwrap_err().is_not_found());

        assert_eq!(datastore.get_info().modified_segment_count, 0);
        assert!(datastore.get_road_by_id("R1").unwrap().date_modified().is_none());
    }

    #[test]
    fn test_add_segment_after_seeding_is_indexed() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");

        let coords = [Point::new(62.1, 17.1), Point::new(62.3, 17.2)];
        let segment = RoadSegment::new("S2", "R1", &coords).unwrap();
        datastore.add_segment(segment).unwrap();

        assert_eq!(datastore.get_road_by_segment_id("S2").unwrap().id(), "R1");
        datastore.update_road_segment_surface("S2", "grass", 0.9, t1()).unwrap();

        let duplicate = RoadSegment::new("S2", "R7", &unit_line()).unwrap();
        assert!(matches!(
            datastore.add_segment(duplicate),
            Err(DataError::DuplicateSegment { .. })
        ));
        assert_eq!(datastore.get_road_count(), 1);
    }

    #[test]
    fn test_add_road_replaces_and_reindexes() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR1;S2;62.1;17.1;62.2;17.2\n");

        let segment = RoadSegment::new("S3", "R1", &unit_line()).unwrap();
        datastore.add_road(Road::new("R1", segment)).unwrap();

        assert_eq!(datastore.get_road_count(), 1);
        assert_eq!(datastore.get_segment_count(), 1);
        assert!(datastore.get_road_by_segment_id("S1").is_err());
        assert_eq!(datastore.get_road_by_segment_id("S3").unwrap().id(), "R1");
    }

    #[test]
    fn test_add_road_rejects_foreign_segment() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\n");

        let segment = RoadSegment::new("S1", "R2", &unit_line()).unwrap();
        let result = datastore.add_road(Road::new("R2", segment));

        assert!(matches!(result, Err(DataError::DuplicateSegment { .. })));
        assert!(datastore.get_road_by_id("R2").is_err());
    }

    #[test]
    fn test_add_road_rejects_segment_of_other_road() {
        let mut datastore = Datastore::default();

        let segment = RoadSegment::new("S1", "R1", &unit_line()).unwrap();
        let result = datastore.add_road(Road::new("R2", segment));

        assert!(matches!(
            result,
            Err(DataError::SegmentRoadMismatch { ref road_id, .. }) if road_id == "R2"
        ));
        assert_eq!(datastore.get_road_count(), 0);
        assert!(datastore.get_road_by_segment_id("S1").is_err());
    }

    #[test]
    fn test_get_info() {
        let mut datastore = seeded("R1;S1;62.0;17.0;62.1;17.1\nR2;S2;63.0;18.0;63.1;18.1\n");
        datastore.update_road_segment_surface("S2", "snow", 0.6, t1()).unwrap();

        let info = datastore.get_info();
        assert_eq!(info.road_count, 2);
        assert_eq!(info.segment_count, 2);
        assert_eq!(info.modified_segment_count, 1);
    }
}
