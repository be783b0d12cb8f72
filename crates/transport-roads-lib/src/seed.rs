//! Bulk seeding from the `;`-delimited segments format
//!
//! Each record is `roadID;segmentID;lat1;lon1;lat2;lon2;...;latN;lonN`, one per line.

use crate::{DataError, Point, Result, RoadSegment};
use std::io::BufRead;

/// Records with fewer fields than this cannot hold two coordinates and are ignored
pub const MIN_FIELDS_PER_RECORD: usize = 6;

/// Read every well-formed segment record from `reader`
///
/// Malformed coordinates and records are logged and skipped, including text that is
/// not valid UTF-8. Any read error other than a clean end of input aborts the whole
/// read, so callers never see a partial result.
pub(crate) fn read_segments<R: BufRead>(mut reader: R) -> Result<Vec<RoadSegment>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("seed::read_segments");

    let mut segments = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        // Invalid UTF-8 becomes U+FFFD and fails coordinate parsing like any other junk
        let line = String::from_utf8_lossy(&buf);
        if let Some(segment) = parse_record(&line, line_number) {
            segments.push(segment);
        }
    }

    Ok(segments)
}

/// Parse a single record into a segment, or `None` if it must be skipped
fn parse_record(line: &str, line_number: usize) -> Option<RoadSegment> {
    let mut parts: Vec<&str> = line.split(';').collect();

    if parts.len() < MIN_FIELDS_PER_RECORD {
        if !line.trim().is_empty() {
            tracing::debug!(
                "Ignoring line {line_number}: {} fields, expected at least {MIN_FIELDS_PER_RECORD}",
                parts.len()
            );
        }
        return None;
    }

    let last = parts.len() - 1;
    parts[last] = parts[last].trim_end_matches(['\r', '\n']);

    let road_id = parts[0];
    let segment_id = parts[1];
    let mut coordinates = Vec::with_capacity((parts.len() - 2) / 2);

    for pair in parts[2..].chunks(2) {
        let &[lat, lon] = pair else {
            tracing::warn!(
                "Dangling value {:?} in segment {segment_id} on line {line_number}. Skipping it.",
                pair[0]
            );
            continue;
        };

        match parse_coordinate(lat, lon) {
            Ok(point) => coordinates.push(point),
            Err(err) => tracing::error!(
                "{err} in segment {segment_id} on line {line_number}. Skipping coordinate."
            ),
        }
    }

    match RoadSegment::new(segment_id, road_id, &coordinates) {
        Ok(segment) => Some(segment),
        Err(err) => {
            tracing::warn!("Skipping record on line {line_number}: {err}");
            None
        }
    }
}

fn parse_coordinate(lat: &str, lon: &str) -> Result<Point> {
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Ok(Point::new(lat, lon)),
        _ => Err(DataError::InvalidCoordinate {
            lat: lat.to_string(),
            lon: lon.to_string(),
        }),
    }
}
