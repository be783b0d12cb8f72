//! Spatial filters, pagination and the recency-biased segment ordering
//!
//! Segment listings are sorted before the page window is applied: observed segments
//! come first, most recent observation first, followed by never-observed segments in
//! ascending id order. The order is recomputed on every call, so a surface update
//! between two page fetches can move items across page boundaries (items may be
//! skipped or repeated). Road listings are paged in scan order without sorting.

use crate::{Datastore, Point, Rectangle, Road, RoadSegment};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// Default number of items per page
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Spatial filter selecting roads or segments
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpatialFilter {
    /// Entities strictly closer than `max_distance` meters to `point`
    NearPoint { point: Point, max_distance: u64 },
    /// Entities whose bounding box intersects `rect`
    WithinRect { rect: Rectangle },
}

impl SpatialFilter {
    pub fn near_point(lat: f64, lon: f64, max_distance: u64) -> Self {
        Self::NearPoint {
            point: Point::new(lat, lon),
            max_distance,
        }
    }

    pub fn within_rect(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Self {
        Self::WithinRect {
            rect: Rectangle::new(Point::new(lat0, lon0), Point::new(lat1, lon1)),
        }
    }
}

/// Offset/limit window over a result sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Index range of this page within a sequence of `len` items (empty past the end)
    pub fn window(&self, len: usize) -> Range<usize> {
        let stop = self.offset.saturating_add(self.limit).min(len);
        let start = self.offset.min(stop);
        start..stop
    }
}

/// Ordering used for segment listings
///
/// Segments with a last-modified timestamp sort before those without, more recent
/// timestamps first. Unmodified segments, and segments modified at the same instant,
/// fall back to ascending id.
pub fn compare_by_recency(a: &RoadSegment, b: &RoadSegment) -> Ordering {
    match (a.date_modified(), b.date_modified()) {
        (Some(a_time), Some(b_time)) => b_time.cmp(&a_time).then_with(|| a.id().cmp(b.id())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id().cmp(b.id()),
    }
}

/// Sort segments in listing order, see [`compare_by_recency`]
pub fn sort_by_recency(segments: &mut [&RoadSegment]) {
    segments.sort_by(|a, b| compare_by_recency(a, b));
}

/// Invoke `callback` for each road in the page window, in the given order
///
/// Stops at the first callback error and returns it.
pub fn paginate_roads<E>(
    roads: &[&Road],
    page: Pagination,
    mut callback: impl FnMut(&Road) -> Result<(), E>,
) -> Result<(), E> {
    let window = page.window(roads.len());
    log_window("road", &window, roads.len());

    roads[window].iter().try_for_each(|road| callback(*road))
}

/// Sort the matched segments and invoke `callback` for each one in the page window
///
/// Stops at the first callback error and returns it.
pub fn paginate_segments<E>(
    mut segments: Vec<&RoadSegment>,
    page: Pagination,
    mut callback: impl FnMut(&RoadSegment) -> Result<(), E>,
) -> Result<(), E> {
    #[cfg(feature = "profiling")]
    profiling::scope!("query::paginate_segments");

    sort_by_recency(&mut segments);

    let window = page.window(segments.len());
    log_window("segment", &window, segments.len());

    segments[window]
        .iter()
        .try_for_each(|segment| callback(*segment))
}

fn log_window(kind: &str, window: &Range<usize>, total: usize) {
    if window.start > 0 || window.end != total {
        if window.is_empty() {
            tracing::debug!("Returning no {kind}s, window starts past {total} results");
        } else {
            tracing::debug!(
                "Returning {kind} {} to {} of {total}",
                window.start,
                window.end - 1
            );
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Datastore {
    /// All roads matching the filter, in scan order
    pub fn find_roads(&self, filter: &SpatialFilter) -> Vec<&Road> {
        match *filter {
            SpatialFilter::NearPoint { point, max_distance } => {
                self.get_roads_near_point(point.lat(), point.lon(), max_distance)
            }
            SpatialFilter::WithinRect { rect } => {
                let (nw, se) = (rect.north_west(), rect.south_east());
                self.get_roads_within_rect(nw.lat(), nw.lon(), se.lat(), se.lon())
            }
        }
    }

    /// All segments matching the filter, in scan order
    pub fn find_segments(&self, filter: &SpatialFilter) -> Vec<&RoadSegment> {
        match *filter {
            SpatialFilter::NearPoint { point, max_distance } => {
                self.get_segments_near_point(point.lat(), point.lon(), max_distance)
            }
            SpatialFilter::WithinRect { rect } => {
                let (nw, se) = (rect.north_west(), rect.south_east());
                self.get_segments_within_rect(nw.lat(), nw.lon(), se.lat(), se.lon())
            }
        }
    }

    /// List one page of roads matching the filter
    pub fn query_roads<E>(
        &self,
        filter: &SpatialFilter,
        page: Pagination,
        callback: impl FnMut(&Road) -> Result<(), E>,
    ) -> Result<(), E> {
        paginate_roads(&self.find_roads(filter), page, callback)
    }

    /// List one page of segments matching the filter, in recency order
    pub fn query_segments<E>(
        &self,
        filter: &SpatialFilter,
        page: Pagination,
        callback: impl FnMut(&RoadSegment) -> Result<(), E>,
    ) -> Result<(), E> {
        paginate_segments(self.find_segments(filter), page, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Timestamp};
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Cursor;

    fn t1() -> Timestamp {
        Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap()
    }

    /// Five chained segments on two roads, all inside 62.0..62.5 / 17.0..17.5
    fn create_test_datastore() -> Datastore {
        let data = "\
R1;S_e;62.0;17.0;62.1;17.1
R1;S_c;62.1;17.1;62.2;17.2
R2;S_a;62.2;17.2;62.3;17.3
R2;S_d;62.3;17.3;62.4;17.4
R2;S_b;62.4;17.4;62.5;17.5
";
        Datastore::from_reader(Config::default(), Cursor::new(data)).unwrap()
    }

    fn all_segments() -> SpatialFilter {
        SpatialFilter::within_rect(61.0, 16.0, 63.0, 18.0)
    }

    fn collect_ids(datastore: &Datastore, page: Pagination) -> Vec<String> {
        let mut ids = Vec::new();
        datastore
            .query_segments(&all_segments(), page, |s| {
                ids.push(s.id().to_string());
                Ok::<(), ()>(())
            })
            .unwrap();
        ids
    }

    #[test]
    fn test_window() {
        assert_eq!(Pagination::new(0, 10).window(5), 0..5);
        assert_eq!(Pagination::new(2, 2).window(5), 2..4);
        assert_eq!(Pagination::new(4, 10).window(5), 4..5);
        assert_eq!(Pagination::new(7, 10).window(5), 5..5);
        assert_eq!(Pagination::new(1, usize::MAX).window(5), 1..5);
        assert_eq!(Pagination::new(0, 0).window(5), 0..0);
    }

    #[test]
    fn test_unmodified_segments_sort_by_id() {
        let datastore = create_test_datastore();
        let ids = collect_ids(&datastore, Pagination::default());
        assert_eq!(ids, vec!["S_a", "S_b", "S_c", "S_d", "S_e"]);
    }

    #[test]
    fn test_recently_modified_segments_sort_first() {
        let mut datastore = create_test_datastore();
        let t1 = t1();
        let t2 = t1 + Duration::minutes(10);

        datastore.update_road_segment_surface("S_d", "snow", 0.7, t1).unwrap();
        datastore.update_road_segment_surface("S_e", "gravel", 0.8, t2).unwrap();

        let ids = collect_ids(&datastore, Pagination::default());
        assert_eq!(ids, vec!["S_e", "S_d", "S_a", "S_b", "S_c"]);
    }

    #[test]
    fn test_compare_by_recency() {
        let mut datastore = create_test_datastore();
        let t1 = t1();
        datastore
            .update_road_segment_surface("S_a", "tarmac", 0.9, t1 + Duration::hours(1))
            .unwrap();
        datastore.update_road_segment_surface("S_b", "tarmac", 0.9, t1).unwrap();

        let mut segments = vec![
            datastore.get_road_segment_by_id("S_c").unwrap(),
            datastore.get_road_segment_by_id("S_b").unwrap(),
            datastore.get_road_segment_by_id("S_a").unwrap(),
        ];
        sort_by_recency(&mut segments);

        let ids: Vec<&str> = segments.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["S_a", "S_b", "S_c"]);
    }

    #[test]
    fn test_pages_are_cut_after_sorting() {
        let datastore = create_test_datastore();

        assert_eq!(collect_ids(&datastore, Pagination::new(0, 2)), vec!["S_a", "S_b"]);
        assert_eq!(collect_ids(&datastore, Pagination::new(2, 2)), vec!["S_c", "S_d"]);
        assert_eq!(collect_ids(&datastore, Pagination::new(4, 2)), vec!["S_e"]);
        assert!(collect_ids(&datastore, Pagination::new(6, 2)).is_empty());
    }

    #[test]
    fn test_update_between_pages_shifts_items() {
        let mut datastore = create_test_datastore();

        let first = collect_ids(&datastore, Pagination::new(0, 2));
        assert_eq!(first, vec!["S_a", "S_b"]);

        // S_e jumps to the front, pushing S_b onto the second page again
        datastore.update_road_segment_surface("S_e", "snow", 0.6, t1()).unwrap();

        let second = collect_ids(&datastore, Pagination::new(2, 2));
        assert_eq!(second, vec!["S_b", "S_c"]);
    }

    #[test]
    fn test_callback_error_stops_iteration() {
        let datastore = create_test_datastore();
        let mut visited = 0;

        let result = datastore.query_segments(&all_segments(), Pagination::default(), |s| {
            visited += 1;
            if s.id() == "S_b" { Err("stop") } else { Ok(()) }
        });

        assert_eq!(result, Err("stop"));
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_query_roads_is_paginated() {
        let datastore = create_test_datastore();

        let mut roads = Vec::new();
        datastore
            .query_roads(&all_segments(), Pagination::new(0, 1), |r| {
                roads.push(r.id().to_string());
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(roads.len(), 1);

        let mut count = 0;
        datastore
            .query_roads(&all_segments(), Pagination::default(), |_| {
                count += 1;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_near_point_filter() {
        let datastore = create_test_datastore();
        let filter = SpatialFilter::near_point(62.05, 17.05, 10);

        let segments = datastore.find_segments(&filter);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id(), "S_e");

        let roads = datastore.find_roads(&filter);
        assert_eq!(roads.len(), 1);
        assert_eq!(roads[0].id(), "R1");
    }
}
