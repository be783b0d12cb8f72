//! Datastore configuration and validation of externally supplied observations
//!
//! The datastore itself never validates surface updates. Callers accepting raw
//! input (messages, request bodies) check it here first.

use crate::{DataError, Point, Rectangle, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Surface types accepted by default
pub const KNOWN_SURFACE_TYPES: [&str; 4] = ["grass", "gravel", "snow", "tarmac"];

/// Configuration for the datastore
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Rules applied to surface observations coming from outside
    pub validation: ValidationConfig,
}

/// Rules for accepting surface observations
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationConfig {
    /// Closed vocabulary of surface types, lower case
    pub surface_types: Vec<String>,
    /// Observations positioned outside this box are rejected (inclusive bounds).
    /// `None` accepts any position.
    pub bounds: Option<Rectangle>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            surface_types: KNOWN_SURFACE_TYPES.iter().map(|s| s.to_string()).collect(),
            bounds: None,
        }
    }
}

impl ValidationConfig {
    /// Check a surface type against the vocabulary, returning it in lower case
    pub fn surface_type(&self, surface_type: &str) -> Result<String> {
        let normalized = surface_type.to_lowercase();
        if self.surface_types.iter().any(|known| *known == normalized) {
            Ok(normalized)
        } else {
            Err(DataError::UnknownSurfaceType(surface_type.to_string()))
        }
    }

    /// Check that a probability lies within `(0, 1]`
    pub fn probability(&self, probability: f64) -> Result<f64> {
        if probability > 0.0 && probability <= 1.0 {
            Ok(probability)
        } else {
            Err(DataError::ProbabilityOutOfRange(probability))
        }
    }

    /// Check that a position lies within the configured bounds, if any
    pub fn position(&self, position: &Point) -> Result<()> {
        match &self.bounds {
            Some(bounds) if !bounds.contains(position) => Err(DataError::PositionOutOfBounds {
                lat: position.lat(),
                lon: position.lon(),
            }),
            _ => Ok(()),
        }
    }
}

/// A surface-type observation as received from outside, before validation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SurfaceObservation {
    pub surface_type: String,
    pub probability: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<Point>,
}

impl SurfaceObservation {
    /// Validate every field, returning a copy with the surface type normalized
    pub fn validate(&self, config: &ValidationConfig) -> Result<SurfaceObservation> {
        let surface_type = config.surface_type(&self.surface_type)?;
        let probability = config.probability(self.probability)?;
        if let Some(position) = &self.position {
            config.position(position)?;
        }

        Ok(SurfaceObservation {
            surface_type,
            probability,
            position: self.position,
        })
    }
}
