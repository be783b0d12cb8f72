//! Road segments: polylines with a surface classification and modification bookkeeping

use crate::{DataError, Point, Rectangle, Result, Timestamp};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single straight edge of a road segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadSegmentLine {
    start: Point,
    end: Point,
    bbox: Rectangle,
}

impl RoadSegmentLine {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            bbox: Rectangle::new(start, end),
        }
    }

    #[inline]
    pub fn start_point(&self) -> Point {
        self.start
    }

    #[inline]
    pub fn end_point(&self) -> Point {
        self.end
    }

    /// Normalized rectangle spanned by the two endpoints
    #[inline]
    pub fn bounding_box(&self) -> Rectangle {
        self.bbox
    }
}

/// Observed surface material of a segment together with the observer's confidence
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceClassification {
    /// Surface label, e.g. `"tarmac"`
    pub surface_type: String,
    /// Confidence of the classification in `(0, 1]`
    pub probability: f64,
}

/// A polyline with its own identity, owned by exactly one [`crate::Road`]
#[derive(Clone, Debug)]
pub struct RoadSegment {
    id: String,
    road_id: String,
    /// Connected straight edges, never empty
    lines: Vec<RoadSegmentLine>,
    /// Union of the bounding boxes of all lines
    bbox: Rectangle,
    surface: Option<SurfaceClassification>,
    /// Time of the most recent surface observation, `None` if never observed
    modified: Option<Timestamp>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RoadSegment {
    /// Create a new segment from an ordered list of coordinates
    ///
    /// Each consecutive pair of coordinates becomes a [`RoadSegmentLine`].
    ///
    /// # Errors
    /// Returns [`DataError::InvalidGeometry`] if fewer than two coordinates are given.
    pub fn new(
        id: impl Into<String>,
        road_id: impl Into<String>,
        coordinates: &[Point],
    ) -> Result<Self> {
        let id = id.into();

        if coordinates.len() < 2 {
            return Err(DataError::InvalidGeometry(format!(
                "segment {} needs at least two coordinates, got {}",
                id,
                coordinates.len()
            )));
        }

        let lines: Vec<RoadSegmentLine> = coordinates
            .windows(2)
            .map(|pair| RoadSegmentLine::new(pair[0], pair[1]))
            .collect();

        let bbox = lines
            .iter()
            .skip(1)
            .fold(lines[0].bounding_box(), |acc, line| {
                acc.union_with(&line.bounding_box())
            });

        Ok(Self {
            id,
            road_id: road_id.into(),
            lines,
            bbox,
            surface: None,
            modified: None,
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity of the owning road
    #[inline]
    pub fn road_id(&self) -> &str {
        &self.road_id
    }

    #[inline]
    pub fn lines(&self) -> &[RoadSegmentLine] {
        &self.lines
    }

    #[inline]
    pub fn bounding_box(&self) -> Rectangle {
        self.bbox
    }

    /// The polyline as `[lon, lat]` pairs: the first line's start, then every line's end
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        let mut coords = Vec::with_capacity(self.lines.len() + 1);
        coords.push(self.lines[0].start_point().to_lon_lat());
        coords.extend(self.lines.iter().map(|line| line.end_point().to_lon_lat()));
        coords
    }

    /// Returns true if any line's bounding box is strictly closer than `max_distance` meters
    pub fn is_within_distance_from_point(&self, max_distance: u64, pt: &Point) -> bool {
        self.lines
            .iter()
            .any(|line| line.bounding_box().distance_to(pt) < max_distance)
    }

    /// Returns true if the segment's bounding box intersects `rect`
    #[inline]
    pub fn intersects(&self, rect: &Rectangle) -> bool {
        self.bbox.intersects(rect)
    }

    #[inline]
    pub fn surface_type(&self) -> Option<&SurfaceClassification> {
        self.surface.as_ref()
    }

    /// Overwrite the surface classification, last write wins
    pub(crate) fn set_surface_type(&mut self, surface_type: impl Into<String>, probability: f64) {
        self.surface = Some(SurfaceClassification {
            surface_type: surface_type.into(),
            probability,
        });
    }

    #[inline]
    pub fn date_modified(&self) -> Option<Timestamp> {
        self.modified
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified.is_some()
    }

    /// Advance the last-modified marker. Older or equal timestamps are ignored.
    pub(crate) fn set_last_modified(&mut self, timestamp: Timestamp) {
        if self.modified.is_none_or(|current| current < timestamp) {
            self.modified = Some(timestamp);
        }
    }
}
