use mapgeom::ScreenPt;

use crate::{Color, MarkerSet};

/// An in-memory scene graph: a fixed-size canvas holding named layers, drawn
/// in order. At most one layer holds markers; the rest hold projected shapes.
pub struct Scene {
    pub width: f64,
    pub height: f64,
    layers: Vec<Layer>,
}

pub struct Layer {
    pub name: String,
    pub content: LayerContent,
}

pub enum LayerContent {
    Shapes(Vec<ShapeNode>),
    Markers(MarkerSet),
}

/// One projected feature, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeNode {
    pub shape: ScreenShape,
    pub style: ShapeStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScreenShape {
    Point(ScreenPt),
    Line(Vec<ScreenPt>),
    Polygon(Vec<Vec<ScreenPt>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Scene {
        Scene {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Sets a shape layer's contents, appending the layer if it's new. The
    /// marker layer, if present, is bumped back to the end so it stays on top.
    pub fn set_shape_layer(&mut self, name: &str, shapes: Vec<ShapeNode>) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.name == name) {
            layer.content = LayerContent::Shapes(shapes);
        } else {
            self.layers.push(Layer {
                name: name.to_string(),
                content: LayerContent::Shapes(shapes),
            });
        }

        if let Some(idx) = self
            .layers
            .iter()
            .position(|l| matches!(l.content, LayerContent::Markers(_)))
        {
            if idx != self.layers.len() - 1 {
                let markers = self.layers.remove(idx);
                self.layers.push(markers);
            }
        }
    }

    /// The marker layer, created at the end of the draw order on first use.
    pub fn marker_layer(&mut self, name: &str) -> &mut MarkerSet {
        let idx = match self.layers.iter().position(|l| l.name == name) {
            Some(idx) => idx,
            None => {
                self.layers.push(Layer {
                    name: name.to_string(),
                    content: LayerContent::Markers(MarkerSet::new()),
                });
                self.layers.len() - 1
            }
        };
        if !matches!(self.layers[idx].content, LayerContent::Markers(_)) {
            self.layers[idx].content = LayerContent::Markers(MarkerSet::new());
        }
        match &mut self.layers[idx].content {
            LayerContent::Markers(set) => set,
            LayerContent::Shapes(_) => unreachable!(),
        }
    }

    pub fn markers(&self) -> Option<&MarkerSet> {
        self.layers.iter().find_map(|l| match &l.content {
            LayerContent::Markers(set) => Some(set),
            LayerContent::Shapes(_) => None,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(x: f64, y: f64) -> ShapeNode {
        ShapeNode {
            shape: ScreenShape::Point(ScreenPt::new(x, y)),
            style: ShapeStyle {
                fill: Some(Color::BLACK),
                stroke: None,
                stroke_width: 0.0,
            },
        }
    }

    #[test]
    fn marker_layer_stays_last_for_any_insertion_order() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.set_shape_layer("neighborhoods", vec![dot(1.0, 1.0)]);
        scene.marker_layer("vehicles");
        assert_eq!(scene.layer_names(), vec!["neighborhoods", "vehicles"]);

        // Layers landing after the marker layer exists get slotted in front.
        scene.set_shape_layer("arteries", Vec::new());
        scene.set_shape_layer("streets", Vec::new());
        assert_eq!(
            scene.layer_names(),
            vec!["neighborhoods", "arteries", "streets", "vehicles"]
        );
    }

    #[test]
    fn setting_a_layer_again_replaces_it_in_place() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.set_shape_layer("freeways", vec![dot(1.0, 1.0)]);
        scene.set_shape_layer("arteries", vec![dot(2.0, 2.0)]);
        scene.set_shape_layer("freeways", vec![dot(3.0, 3.0), dot(4.0, 4.0)]);

        assert_eq!(scene.layer_names(), vec!["freeways", "arteries"]);
        match &scene.layers()[0].content {
            LayerContent::Shapes(shapes) => assert_eq!(shapes.len(), 2),
            LayerContent::Markers(_) => panic!("expected shapes"),
        }
    }
}
