use std::time::Duration;

use mapgeom::{LayerGeometry, Projection, Shape};
use scene::{Color, Marker, ReconcileStats, Scene, ScreenShape, ShapeNode, ShapeStyle};

use crate::config::AppConfig;
use crate::feed::Vehicle;
use crate::routes::RouteRegistry;

/// Owns the scene and the shared projection. The projection is calibrated
/// exactly once, from the scale layer's bounds; nothing can be drawn before
/// then, so layers landing early wait in a queue.
pub struct MapRenderer {
    scale_layer: String,
    vehicle_layer: String,
    marker_radius: f64,
    transition: Duration,
    projection: Option<Projection>,
    pending: Vec<(String, LayerGeometry)>,
    pub scene: Scene,
}

impl MapRenderer {
    pub fn new(cfg: &AppConfig) -> MapRenderer {
        MapRenderer {
            scale_layer: cfg.scale_layer.clone(),
            vehicle_layer: cfg.vehicle_layer.clone(),
            marker_radius: cfg.marker_radius,
            transition: cfg.transition(),
            projection: None,
            pending: Vec::new(),
            scene: Scene::new(cfg.width, cfg.height),
        }
    }

    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Feeds one parsed geographic layer in. Until the scale layer shows up,
    /// arrivals queue up; when it lands it calibrates the projection, draws,
    /// and flushes the queue.
    pub fn add_layer(&mut self, name: &str, geometry: LayerGeometry) {
        if self.projection.is_none() {
            if name != self.scale_layer {
                debug!("{} arrived before the scale layer; holding it", name);
                self.pending.push((name.to_string(), geometry));
                return;
            }
            let bounds = geometry.gps_bounds();
            if bounds.is_empty() {
                warn!(
                    "The scale layer {} has no coordinates, so the projection is arbitrary",
                    name
                );
            }
            self.projection = Some(Projection::fit(
                self.scene.width,
                self.scene.height,
                &bounds,
            ));
            self.draw_layer(name, &geometry);
            for (pending_name, pending_geometry) in std::mem::take(&mut self.pending) {
                self.draw_layer(&pending_name, &pending_geometry);
            }
            return;
        }
        self.draw_layer(name, &geometry);
    }

    /// Reconciles the marker layer against a fresh vehicle set. Returns None
    /// when the projection doesn't exist yet; the caller holds on to the set
    /// and retries once the scale layer lands.
    pub fn apply_vehicles(
        &mut self,
        vehicles: &[Vehicle],
        registry: &mut RouteRegistry,
    ) -> Option<ReconcileStats> {
        let projection = match &self.projection {
            Some(projection) => projection.clone(),
            None => return None,
        };
        let updates: Vec<(String, Marker)> = vehicles
            .iter()
            .map(|v| {
                let marker = Marker {
                    pt: projection.project(v.pos),
                    fill: registry.color(&v.route),
                    class: format!("route-{}", v.route),
                    label: format!("{} #{}", registry.display_name(&v.route), v.id),
                    radius: self.marker_radius,
                };
                (v.id.clone(), marker)
            })
            .collect();
        let stats = self
            .scene
            .marker_layer(&self.vehicle_layer)
            .reconcile(updates, self.transition);
        Some(stats)
    }

    fn draw_layer(&mut self, name: &str, geometry: &LayerGeometry) {
        let projection = match &self.projection {
            Some(projection) => projection.clone(),
            None => return,
        };
        let shapes: Vec<ShapeNode> = geometry
            .features
            .iter()
            .map(|feature| ShapeNode {
                shape: project_shape(&projection, &feature.shape),
                style: style_for(&feature.shape),
            })
            .collect();
        info!("Drew layer {} ({} features)", name, shapes.len());
        self.scene.set_shape_layer(name, shapes);
    }
}

fn project_shape(projection: &Projection, shape: &Shape) -> ScreenShape {
    match shape {
        Shape::Point(pt) => ScreenShape::Point(projection.project(*pt)),
        Shape::Line(pts) => {
            ScreenShape::Line(pts.iter().map(|pt| projection.project(*pt)).collect())
        }
        Shape::Polygon(rings) => ScreenShape::Polygon(
            rings
                .iter()
                .map(|ring| ring.iter().map(|pt| projection.project(*pt)).collect())
                .collect(),
        ),
    }
}

// Standalone SVG output has no stylesheet to assign per-layer styles, so the
// shape's kind picks a plain default.
fn style_for(shape: &Shape) -> ShapeStyle {
    match shape {
        Shape::Polygon(_) => ShapeStyle {
            fill: Some(Color::grey(0.85)),
            stroke: Some(Color::WHITE),
            stroke_width: 1.0,
        },
        Shape::Line(_) => ShapeStyle {
            fill: None,
            stroke: Some(Color::grey(0.55)),
            stroke_width: 1.0,
        },
        Shape::Point(_) => ShapeStyle {
            fill: Some(Color::grey(0.4)),
            stroke: None,
            stroke_width: 0.0,
        },
    }
}
