use std::f64;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A geographic coordinate. Longitude is x, latitude is y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({}, {})", self.longitude, self.latitude)
    }
}

/// The axis-aligned bounding box of a set of geographic coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GpsBounds {
    pub fn new() -> GpsBounds {
        GpsBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from_points<I: IntoIterator<Item = LonLat>>(pts: I) -> GpsBounds {
        let mut b = GpsBounds::new();
        for pt in pts {
            b.update(pt);
        }
        b
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.longitude);
        self.max_lon = self.max_lon.max(pt.longitude);
        self.min_lat = self.min_lat.min(pt.latitude);
        self.max_lat = self.max_lat.max(pt.latitude);
    }

    pub fn union(&mut self, other: &GpsBounds) {
        if other.is_empty() {
            return;
        }
        self.update(LonLat::new(other.min_lon, other.min_lat));
        self.update(LonLat::new(other.max_lon, other.max_lat));
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.longitude >= self.min_lon
            && pt.longitude <= self.max_lon
            && pt.latitude >= self.min_lat
            && pt.latitude <= self.max_lat
    }

    /// True until the first `update`.
    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon
    }
}

impl Default for GpsBounds {
    fn default() -> GpsBounds {
        GpsBounds::new()
    }
}
