//! Command and event messages exchanged with other instances
//!
//! An [`UpdateRoadSegmentSurface`] command asks an instance to record a surface
//! observation. Applying it successfully yields the [`RoadSegmentSurfaceUpdated`]
//! event to publish, which replicas apply to their own datastore. Transport is left
//! to the caller.

use crate::{Datastore, Result, Timestamp};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Content type of the surface update command
pub const UPDATE_ROAD_SEGMENT_SURFACE_CONTENT_TYPE: &str =
    "application/vnd-diwise-updateroadsegmentsurface+json";

/// Topic the surface updated event is published on
pub const ROAD_SEGMENT_SURFACE_UPDATED_TOPIC: &str =
    "events.transportation.roadsegmentsurfaceupdated";

/// Request to record a surface observation for a segment
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateRoadSegmentSurface {
    /// Segment id
    pub id: String,
    pub surface_type: String,
    pub probability: f64,
    /// Observation time, RFC 3339 on the wire
    pub timestamp: Timestamp,
}

impl UpdateRoadSegmentSurface {
    pub fn content_type(&self) -> &'static str {
        UPDATE_ROAD_SEGMENT_SURFACE_CONTENT_TYPE
    }

    /// Validate the command against the datastore's rules and apply it
    ///
    /// Returns the event describing the applied update. Nothing is mutated, and no
    /// event is produced, if validation or the update fails.
    pub fn apply(&self, datastore: &mut Datastore) -> Result<RoadSegmentSurfaceUpdated> {
        let rules = &datastore.config().validation;
        let surface_type = rules.surface_type(&self.surface_type)?;
        let probability = rules.probability(self.probability)?;

        datastore.update_road_segment_surface(
            &self.id,
            &surface_type,
            probability,
            self.timestamp,
        )?;

        Ok(RoadSegmentSurfaceUpdated {
            id: self.id.clone(),
            surface_type,
            probability,
            timestamp: self.timestamp,
        })
    }
}

/// Notification that a segment's surface classification changed
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RoadSegmentSurfaceUpdated {
    pub id: String,
    pub surface_type: String,
    pub probability: f64,
    pub timestamp: Timestamp,
}

impl RoadSegmentSurfaceUpdated {
    pub fn topic_name(&self) -> &'static str {
        ROAD_SEGMENT_SURFACE_UPDATED_TOPIC
    }

    pub fn content_type(&self) -> &'static str {
        "application/json"
    }

    /// Apply an event received from another instance to the local datastore
    ///
    /// Events were validated by the instance that produced them and are applied as is.
    pub fn apply(&self, datastore: &mut Datastore) -> Result<()> {
        datastore.update_road_segment_surface(
            &self.id,
            &self.surface_type,
            self.probability,
            self.timestamp,
        )
    }
}
