//! Geographic primitives for muniview: lon/lat space, the bounding boxes of
//! layers, a Mercator projection fitted to a viewport, and GeoJSON parsing.

mod features;
mod gps;
mod project;
mod screen;

pub use crate::features::{GeoFeature, LayerGeometry, Shape};
pub use crate::gps::{GpsBounds, LonLat};
pub use crate::project::Projection;
pub use crate::screen::{Bounds, ScreenPt};
