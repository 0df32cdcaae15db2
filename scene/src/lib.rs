//! An in-memory scene graph for a fixed-size map canvas: ordered named
//! layers, keyed markers that keep their identity across updates, and an SVG
//! serializer. The live-update pipeline is testable against this model
//! without any real rendering surface.

mod color;
mod reconcile;
mod scene;
mod svg;

pub use crate::color::Color;
pub use crate::reconcile::{Marker, MarkerNode, MarkerSet, NodeId, ReconcileStats, Transition};
pub use crate::scene::{Layer, LayerContent, Scene, ScreenShape, ShapeNode, ShapeStyle};
