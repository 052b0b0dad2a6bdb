//! Geographic helpers for the globe view.
//!
//! Latitude/longitude are mapped onto a sphere in a right-handed, Y-up frame:
//! the north pole is `+Y`, and longitude -180 lies on `-X`.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lead::Lead;

/// Globe radius in scene units.
pub const GLOBE_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::LatitudeOutOfRange(v) => write!(f, "latitude {} is outside -90..90", v),
            GeoError::LongitudeOutOfRange(v) => write!(f, "longitude {} is outside -180..180", v),
        }
    }
}

impl std::error::Error for GeoError {}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Coordinates { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpherePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpherePoint {
    /// Rotate about the Y axis by `angle` radians.
    pub fn rotate_y(self, angle: f64) -> SpherePoint {
        let (sin, cos) = angle.sin_cos();
        SpherePoint {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }
}

pub fn to_sphere_point(lat: f64, lon: f64, radius: f64) -> SpherePoint {
    let phi = (90.0 - lat) * PI / 180.0;
    let theta = (lon + 180.0) * PI / 180.0;
    SpherePoint {
        x: -radius * phi.sin() * theta.cos(),
        y: radius * phi.cos(),
        z: radius * phi.sin() * theta.sin(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeMarker {
    pub lead_id: u32,
    pub point: SpherePoint,
}

/// Markers for every lead with both coordinates; others are skipped.
pub fn globe_markers(leads: &[Lead], radius: f64) -> Vec<GlobeMarker> {
    leads
        .iter()
        .filter_map(|lead| {
            let c = lead.coordinates()?;
            Some(GlobeMarker {
                lead_id: lead.id,
                point: to_sphere_point(c.latitude, c.longitude, radius),
            })
        })
        .collect()
}
