use std::collections::BTreeMap;

use anyhow::Result;

use crate::{GpsBounds, LonLat};

/// The parsed geometry of one map layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerGeometry {
    pub features: Vec<GeoFeature>,
}

/// One feature of a layer: a shape plus whatever string properties it carried.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub shape: Shape,
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A lone position, drawn as a marker.
    Point(LonLat),
    /// An open path.
    Line(Vec<LonLat>),
    /// Closed rings; the first is the outer boundary, the rest are holes.
    Polygon(Vec<Vec<LonLat>>),
}

impl LayerGeometry {
    /// Parses a GeoJSON feature collection (or a bare feature). Multi-part
    /// geometries become one feature per part, sharing properties. Geometry
    /// kinds we can't draw are skipped, not fatal.
    pub fn parse(raw: &[u8]) -> Result<LayerGeometry> {
        let raw_string = std::str::from_utf8(raw)?;
        let geojson = raw_string.parse::<geojson::GeoJson>()?;
        let features = match geojson {
            geojson::GeoJson::Feature(feature) => vec![feature],
            geojson::GeoJson::FeatureCollection(collection) => collection.features,
            _ => anyhow::bail!("root isn't a feature or feature collection"),
        };

        let mut result = Vec::new();
        for feature in features {
            let mut properties = BTreeMap::new();
            for (key, value) in feature.properties_iter() {
                if let Some(value) = value.as_str() {
                    properties.insert(key.to_string(), value.to_string());
                }
            }

            let geometry = match feature.geometry {
                Some(g) => g,
                None => {
                    continue;
                }
            };
            for shape in flatten(geometry.value) {
                result.push(GeoFeature {
                    shape,
                    properties: properties.clone(),
                });
            }
        }
        Ok(LayerGeometry { features: result })
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The bounding box over every coordinate in the layer.
    pub fn gps_bounds(&self) -> GpsBounds {
        let mut bounds = GpsBounds::new();
        for feature in &self.features {
            match &feature.shape {
                Shape::Point(pt) => bounds.update(*pt),
                Shape::Line(pts) => {
                    for pt in pts {
                        bounds.update(*pt);
                    }
                }
                Shape::Polygon(rings) => {
                    for ring in rings {
                        for pt in ring {
                            bounds.update(*pt);
                        }
                    }
                }
            }
        }
        bounds
    }
}

fn flatten(value: geojson::Value) -> Vec<Shape> {
    match value {
        geojson::Value::Point(pt) => vec![Shape::Point(lon_lat(&pt))],
        geojson::Value::MultiPoint(pts) => {
            pts.iter().map(|pt| Shape::Point(lon_lat(pt))).collect()
        }
        geojson::Value::LineString(pts) => vec![Shape::Line(line(&pts))],
        geojson::Value::MultiLineString(lines) => {
            lines.iter().map(|pts| Shape::Line(line(pts))).collect()
        }
        geojson::Value::Polygon(rings) => vec![Shape::Polygon(polygon(&rings))],
        geojson::Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| Shape::Polygon(polygon(rings)))
            .collect(),
        // GeometryCollection and anything newer
        _ => Vec::new(),
    }
}

fn lon_lat(pt: &[f64]) -> LonLat {
    LonLat::new(pt[0], pt[1])
}

fn line(pts: &[Vec<f64>]) -> Vec<LonLat> {
    pts.iter().map(|pt| lon_lat(pt)).collect()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Vec<Vec<LonLat>> {
    rings.iter().map(|ring| line(ring)).collect()
}
