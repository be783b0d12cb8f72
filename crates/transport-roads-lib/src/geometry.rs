//! Geometry primitives for WGS84 coordinates and axis-aligned bounding boxes
//!
//! Coordinates are stored in `geo` types with `x` = longitude and `y` = latitude.
//! Distances are approximate: they apply the spherical law of cosines to the clamped
//! latitude/longitude offsets rather than computing a true geodesic.

use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Earth's radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// A WGS84 coordinate in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "LatLon", into = "LatLon"))]
pub struct Point(geo::Point<f64>);

/// Serialized form of a [`Point`]
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[cfg(feature = "serde")]
impl From<LatLon> for Point {
    fn from(value: LatLon) -> Self {
        Point::new(value.lat, value.lon)
    }
}

#[cfg(feature = "serde")]
impl From<Point> for LatLon {
    fn from(value: Point) -> Self {
        LatLon {
            lat: value.lat(),
            lon: value.lon(),
        }
    }
}

impl Point {
    /// Create a new point from latitude and longitude in degrees
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(geo::Point::new(lon, lat))
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.0.y()
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.0.x()
    }

    /// The coordinate as a `[lon, lat]` pair, the order used by GeoJSON
    #[inline]
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.lon(), self.lat()]
    }

    /// Returns true if the point lies strictly inside the rectangle.
    ///
    /// Points on the boundary are not considered bounded.
    pub fn is_bounded_by(&self, rect: &Rectangle) -> bool {
        let nw = rect.north_west();
        let se = rect.south_east();
        nw.lon() < self.lon()
            && se.lon() > self.lon()
            && nw.lat() > self.lat()
            && se.lat() < self.lat()
    }
}

impl From<Point> for Coord<f64> {
    fn from(point: Point) -> Self {
        point.0.into()
    }
}

/// An axis-aligned bounding box in WGS84 degrees
///
/// The box is normalized on construction, so `north_west` always holds the maximum
/// latitude and minimum longitude and `south_east` the minimum latitude and maximum
/// longitude, whatever order the corners were supplied in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Corners", into = "Corners"))]
pub struct Rectangle {
    rect: Rect<f64>,
}

/// Serialized form of a [`Rectangle`]
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Corners {
    north_west: Point,
    south_east: Point,
}

#[cfg(feature = "serde")]
impl From<Corners> for Rectangle {
    fn from(value: Corners) -> Self {
        Rectangle::new(value.north_west, value.south_east)
    }
}

#[cfg(feature = "serde")]
impl From<Rectangle> for Corners {
    fn from(value: Rectangle) -> Self {
        Corners {
            north_west: value.north_west(),
            south_east: value.south_east(),
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Rectangle {
    /// Create the smallest rectangle having both points as corners
    pub fn new(pt1: Point, pt2: Point) -> Self {
        // Rect::new sorts the corners into min/max
        Self {
            rect: Rect::new(Coord::from(pt1), Coord::from(pt2)),
        }
    }

    /// Corner with the maximum latitude and minimum longitude
    #[inline]
    pub fn north_west(&self) -> Point {
        Point::new(self.rect.max().y, self.rect.min().x)
    }

    /// Corner with the minimum latitude and maximum longitude
    #[inline]
    pub fn south_east(&self) -> Point {
        Point::new(self.rect.min().y, self.rect.max().x)
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union_with(&self, other: &Rectangle) -> Rectangle {
        let nw = Point::new(
            self.rect.max().y.max(other.rect.max().y),
            self.rect.min().x.min(other.rect.min().x),
        );
        let se = Point::new(
            self.rect.min().y.min(other.rect.min().y),
            self.rect.max().x.max(other.rect.max().x),
        );
        Rectangle::new(nw, se)
    }

    /// Returns true if the point is inside the rectangle or on its boundary
    pub fn contains(&self, pt: &Point) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        pt.lat() >= min.y && pt.lat() <= max.y && pt.lon() >= min.x && pt.lon() <= max.x
    }

    /// Approximate distance in whole meters from the rectangle to an exterior point
    ///
    /// Points inside or on the boundary are at distance 0. For exterior points the
    /// latitude and longitude overshoot past the nearest edge are combined with the
    /// spherical law of cosines. The result is truncated towards zero.
    pub fn distance_to(&self, pt: &Point) -> u64 {
        let nw = self.north_west();
        let se = self.south_east();

        let lat_delta = (se.lat() - pt.lat()).max(0.0).max(pt.lat() - nw.lat());
        let lon_delta = (nw.lon() - pt.lon()).max(0.0).max(pt.lon() - se.lon());

        if lat_delta <= 0.0 && lon_delta <= 0.0 {
            return 0;
        }

        let lat_rad = lat_delta * PI / 180.0;
        let lon_rad = lon_delta * PI / 180.0;
        let distance = EARTH_RADIUS_M * (lat_rad.cos() * lon_rad.cos()).acos();

        distance as u64
    }

    /// Returns true if the two rectangles overlap
    ///
    /// Rectangles that only share an edge or a corner do not intersect.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        let nw = self.north_west();
        let se = self.south_east();
        let other_nw = other.north_west();
        let other_se = other.south_east();

        !(se.lon() <= other_nw.lon()
            || se.lat() >= other_nw.lat()
            || nw.lon() >= other_se.lon()
            || nw.lat() <= other_se.lat())
    }
}
