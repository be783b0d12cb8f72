//! Road storage module
//!
//! A [`Road`] owns an ordered, append-only collection of [`RoadSegment`]s and keeps
//! a bounding box covering all of them.

use crate::{Point, Rectangle, RoadSegment, Timestamp};

/// A named collection of connected road segments
#[derive(Clone, Debug)]
pub struct Road {
    id: String,
    /// Segments in insertion order, never empty
    segments: Vec<RoadSegment>,
    /// Union of all segment bounding boxes, recomputed on every append
    bbox: Rectangle,
    modified: Option<Timestamp>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Road {
    /// Create a new road with `segment` as its first segment
    pub fn new(id: impl Into<String>, segment: RoadSegment) -> Self {
        let bbox = segment.bounding_box();
        Self {
            id: id.into(),
            segments: vec![segment],
            bbox,
            modified: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a segment and grow the bounding box to cover it
    pub fn add_segment(&mut self, segment: RoadSegment) {
        self.bbox = self.bbox.union_with(&segment.bounding_box());
        self.segments.push(segment);
    }

    /// Find a segment owned by this road
    pub fn segment(&self, id: &str) -> Option<&RoadSegment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub(crate) fn segment_mut(&mut self, id: &str) -> Option<&mut RoadSegment> {
        self.segments.iter_mut().find(|s| s.id() == id)
    }

    #[inline]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Identities of all segments, in insertion order
    pub fn segment_ids(&self) -> Vec<&str> {
        self.segments.iter().map(RoadSegment::id).collect()
    }

    #[inline]
    pub fn bounding_box(&self) -> Rectangle {
        self.bbox
    }

    /// Returns true if the road's bounding box is strictly closer than `max_distance` meters
    #[inline]
    pub fn is_within_distance_from_point(&self, max_distance: u64, pt: &Point) -> bool {
        max_distance > self.bbox.distance_to(pt)
    }

    /// Segments having at least one line strictly closer than `max_distance` meters
    pub fn segments_within_distance_from_point(
        &self,
        max_distance: u64,
        pt: &Point,
    ) -> Vec<&RoadSegment> {
        self.segments
            .iter()
            .filter(|s| s.is_within_distance_from_point(max_distance, pt))
            .collect()
    }

    /// Segments whose bounding box intersects `rect`
    pub fn segments_within_rect(&self, rect: &Rectangle) -> Vec<&RoadSegment> {
        self.segments.iter().filter(|s| s.intersects(rect)).collect()
    }

    #[inline]
    pub fn date_modified(&self) -> Option<Timestamp> {
        self.modified
    }

    /// Advance the last-modified marker. Older or equal timestamps are ignored.
    pub(crate) fn set_last_modified(&mut self, timestamp: Timestamp) {
        if self.modified.is_none_or(|current| current < timestamp) {
            self.modified = Some(timestamp);
        }
    }
}
