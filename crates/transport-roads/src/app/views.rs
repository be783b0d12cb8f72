//! JSON renderings of roads and segments printed by the listings

use serde::Serialize;
use transport_roads_lib::{Road, RoadSegment, Timestamp};

/// Road entity as listed: identity plus references to its segments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub road_class: &'static str,
    pub ref_road_segment: Vec<&'a str>,
}

impl<'a> From<&'a Road> for RoadView<'a> {
    fn from(road: &'a Road) -> Self {
        Self {
            id: road.id(),
            name: road.id(),
            road_class: "class",
            ref_road_segment: road.segment_ids(),
        }
    }
}

/// GeoJSON line string with `[lon, lat]` positions
#[derive(Debug, Serialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<[f64; 2]>,
}

/// Segment entity as listed, with its geometry and surface classification
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub ref_road: &'a str,
    pub location: LineString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<Timestamp>,
}

impl<'a> From<&'a RoadSegment> for SegmentView<'a> {
    fn from(segment: &'a RoadSegment) -> Self {
        let surface = segment.surface_type();

        Self {
            id: segment.id(),
            name: segment.id(),
            ref_road: segment.road_id(),
            location: LineString {
                kind: "LineString",
                coordinates: segment.coordinates(),
            },
            surface_type: surface.map(|s| s.surface_type.as_str()),
            probability: surface.map(|s| s.probability),
            date_modified: segment.date_modified(),
        }
    }
}
