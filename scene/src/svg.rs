use mapgeom::ScreenPt;

use crate::{Color, LayerContent, MarkerNode, Scene, ScreenShape, ShapeNode, ShapeStyle};

impl Scene {
    /// Serializes the scene as a standalone SVG document. Each layer becomes
    /// a `<g>` in draw order, shapes become `<path>`s and `<circle>`s, and
    /// markers moved by the last update carry a SMIL hop from their previous
    /// position. `legend` entries, if any, are laid out three to a row in a
    /// block pinned to the bottom of the canvas.
    pub fn to_svg(&self, legend: &[(String, Color)]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
            num(self.width),
            num(self.height),
            num(self.width),
            num(self.height)
        ));
        for layer in self.layers() {
            out.push_str(&format!("  <g class=\"{}\">\n", escape(&layer.name)));
            match &layer.content {
                LayerContent::Shapes(shapes) => {
                    for node in shapes {
                        write_shape(&mut out, node);
                    }
                }
                LayerContent::Markers(set) => {
                    for node in set.nodes() {
                        write_marker(&mut out, node);
                    }
                }
            }
            out.push_str("  </g>\n");
        }
        if !legend.is_empty() {
            write_legend(&mut out, self, legend);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_shape(out: &mut String, node: &ShapeNode) {
    match &node.shape {
        ScreenShape::Point(pt) => {
            out.push_str(&format!(
                "    <circle cx=\"{}\" cy=\"{}\" r=\"2\"{}/>\n",
                num(pt.x),
                num(pt.y),
                paint(&node.style)
            ));
        }
        ScreenShape::Line(pts) => {
            out.push_str(&format!(
                "    <path d=\"{}\"{}/>\n",
                subpath(pts),
                paint(&node.style)
            ));
        }
        ScreenShape::Polygon(rings) => {
            let d = rings
                .iter()
                .map(|ring| format!("{} Z", subpath(ring)))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "    <path d=\"{}\" fill-rule=\"evenodd\"{}/>\n",
                d,
                paint(&node.style)
            ));
        }
    }
}

fn write_marker(out: &mut String, node: &MarkerNode) {
    let marker = &node.marker;
    out.push_str(&format!(
        "    <circle id=\"veh-{}\" class=\"{}\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\">\n",
        escape(&node.key),
        escape(&marker.class),
        num(marker.pt.x),
        num(marker.pt.y),
        num(marker.radius),
        marker.fill.to_hex()
    ));
    out.push_str(&format!("      <title>{}</title>\n", escape(&marker.label)));
    if let Some(transition) = &node.transition {
        let dur = format!("{}s", transition.duration.as_secs_f64());
        out.push_str(&format!(
            "      <animate attributeName=\"cx\" from=\"{}\" to=\"{}\" dur=\"{}\" fill=\"freeze\"/>\n",
            num(transition.from.x),
            num(marker.pt.x),
            dur
        ));
        out.push_str(&format!(
            "      <animate attributeName=\"cy\" from=\"{}\" to=\"{}\" dur=\"{}\" fill=\"freeze\"/>\n",
            num(transition.from.y),
            num(marker.pt.y),
            dur
        ));
    }
    out.push_str("    </circle>\n");
}

fn write_legend(out: &mut String, scene: &Scene, legend: &[(String, Color)]) {
    let row_height = 16.0;
    let rows = (legend.len() + 2) / 3;
    let top = scene.height - (rows as f64) * row_height - 8.0;
    let col_width = (scene.width - 20.0) / 3.0;

    out.push_str(&format!(
        "  <g class=\"legend\" transform=\"translate(10,{})\">\n",
        num(top)
    ));
    for (i, (label, color)) in legend.iter().enumerate() {
        let x = ((i % 3) as f64) * col_width;
        let y = ((i / 3) as f64) * row_height;
        out.push_str(&format!(
            "    <circle cx=\"{}\" cy=\"{}\" r=\"5\" fill=\"{}\"/>\n",
            num(x + 5.0),
            num(y + 8.0),
            color.to_hex()
        ));
        out.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" font-size=\"11\">{}</text>\n",
            num(x + 14.0),
            num(y + 12.0),
            escape(label)
        ));
    }
    out.push_str("  </g>\n");
}

fn subpath(pts: &[ScreenPt]) -> String {
    let mut d = String::new();
    for (i, pt) in pts.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{}{},{} ", cmd, num(pt.x), num(pt.y)));
    }
    d.trim_end().to_string()
}

fn paint(style: &ShapeStyle) -> String {
    let mut s = String::new();
    match style.fill {
        Some(color) => {
            s.push_str(&format!(" fill=\"{}\"", color.to_hex()));
            if color.a < 1.0 {
                s.push_str(&format!(" fill-opacity=\"{}\"", color.a));
            }
        }
        None => s.push_str(" fill=\"none\""),
    }
    if let Some(color) = style.stroke {
        s.push_str(&format!(
            " stroke=\"{}\" stroke-width=\"{}\"",
            color.to_hex(),
            num(style.stroke_width)
        ));
        if color.a < 1.0 {
            s.push_str(&format!(" stroke-opacity=\"{}\"", color.a));
        }
    }
    s
}

// One decimal place is plenty at canvas scale, and whole numbers stay whole.
fn num(x: f64) -> String {
    let s = format!("{:.1}", x);
    match s.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => s,
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Marker;

    fn line_layer() -> Vec<ShapeNode> {
        vec![ShapeNode {
            shape: ScreenShape::Line(vec![ScreenPt::new(0.0, 0.0), ScreenPt::new(10.0, 5.5)]),
            style: ShapeStyle {
                fill: None,
                stroke: Some(Color::BLACK),
                stroke_width: 1.0,
            },
        }]
    }

    fn marker(x: f64, y: f64) -> Marker {
        Marker {
            pt: ScreenPt::new(x, y),
            fill: Color::hex("#C04080").unwrap(),
            class: "route-N".to_string(),
            label: "N Judah".to_string(),
            radius: 3.0,
        }
    }

    #[test]
    fn layers_render_in_scene_order() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.marker_layer("vehicles");
        scene.set_shape_layer("neighborhoods", line_layer());
        scene.set_shape_layer("arteries", line_layer());

        let svg = scene.to_svg(&[]);
        let neighborhoods = svg.find("class=\"neighborhoods\"").unwrap();
        let arteries = svg.find("class=\"arteries\"").unwrap();
        let vehicles = svg.find("class=\"vehicles\"").unwrap();
        assert!(neighborhoods < arteries);
        assert!(arteries < vehicles);
    }

    #[test]
    fn markers_carry_identity_and_style() {
        let mut scene = Scene::new(100.0, 100.0);
        scene
            .marker_layer("vehicles")
            .reconcile(vec![("1549".to_string(), marker(40.0, 60.0))], Duration::from_millis(900));

        let svg = scene.to_svg(&[]);
        assert!(svg.contains("id=\"veh-1549\""));
        assert!(svg.contains("class=\"route-N\""));
        assert!(svg.contains("cx=\"40\" cy=\"60\" r=\"3\" fill=\"#C04080\""));
        assert!(svg.contains("<title>N Judah</title>"));
        assert!(!svg.contains("<animate"));
    }

    #[test]
    fn moved_markers_animate_from_their_old_position() {
        let mut scene = Scene::new(100.0, 100.0);
        let dur = Duration::from_millis(900);
        scene
            .marker_layer("vehicles")
            .reconcile(vec![("1549".to_string(), marker(40.0, 60.0))], dur);
        scene
            .marker_layer("vehicles")
            .reconcile(vec![("1549".to_string(), marker(42.5, 58.0))], dur);

        let svg = scene.to_svg(&[]);
        assert!(svg
            .contains("<animate attributeName=\"cx\" from=\"40\" to=\"42.5\" dur=\"0.9s\" fill=\"freeze\"/>"));
        assert!(svg
            .contains("<animate attributeName=\"cy\" from=\"60\" to=\"58\" dur=\"0.9s\" fill=\"freeze\"/>"));
    }

    #[test]
    fn legend_wraps_three_per_row() {
        let scene = Scene::new(300.0, 100.0);
        let legend: Vec<(String, Color)> = vec![
            ("5 Fulton".to_string(), Color::RED),
            ("J Church".to_string(), Color::GREEN),
            ("K&T".to_string(), Color::BLUE),
            ("L Taraval".to_string(), Color::BLACK),
        ];
        let svg = scene.to_svg(&legend);

        // First row swatches sit at y=8, the wrapped fourth at y=24.
        assert!(svg.contains("cx=\"5\" cy=\"8\""));
        assert!(svg.contains("cx=\"5\" cy=\"24\""));
        assert!(svg.contains("K&amp;T"));
    }
}
