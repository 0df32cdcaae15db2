use std::f64::consts::FRAC_PI_4;

use crate::{GpsBounds, LonLat, ScreenPt};

/// A spherical Mercator projection, scaled and translated once so that a
/// reference bounding box fills a fixed viewport. After calibration, every
/// layer shares the same transform, so geometry from different files lines up.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    scale: f64,
    translate_x: f64,
    translate_y: f64,
}

impl Projection {
    /// Calibrates the projection so `bounds` fits inside a `width` x `height`
    /// viewport: one uniform scale (whichever axis is tighter), centered along
    /// the other axis.
    pub fn fit(width: f64, height: f64, bounds: &GpsBounds) -> Projection {
        // Top-left screen corner is (min_lon, max_lat) -- Mercator y is
        // flipped below so north is up.
        let (x0, y0) = mercator(LonLat::new(bounds.min_lon, bounds.max_lat));
        let (x1, y1) = mercator(LonLat::new(bounds.max_lon, bounds.min_lat));
        let dx = x1 - x0;
        let dy = y1 - y0;
        // A degenerate reference (a single point, or an empty layer) can't
        // pick a scale; just center it unscaled.
        let scale = if dx > 0.0 && dy > 0.0 {
            (width / dx).min(height / dy)
        } else {
            1.0
        };
        Projection {
            scale,
            translate_x: (width - scale * (x0 + x1)) / 2.0,
            translate_y: (height - scale * (y0 + y1)) / 2.0,
        }
    }

    pub fn project(&self, pt: LonLat) -> ScreenPt {
        let (x, y) = mercator(pt);
        ScreenPt::new(
            self.scale * x + self.translate_x,
            self.scale * y + self.translate_y,
        )
    }
}

// Unit-sphere Mercator, with y negated to match screen orientation (northern
// latitudes come out smaller).
fn mercator(pt: LonLat) -> (f64, f64) {
    let x = pt.longitude.to_radians();
    let y = -(FRAC_PI_4 + pt.latitude.to_radians() / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;

    fn sf_bounds() -> GpsBounds {
        GpsBounds::from_points(vec![
            LonLat::new(-122.5247, 37.7083),
            LonLat::new(-122.3366, 37.8120),
        ])
    }

    #[test]
    fn reference_fills_viewport() {
        let (width, height) = (750.0, 700.0);
        let bounds = sf_bounds();
        let proj = Projection::fit(width, height, &bounds);

        let corners = Bounds::from_points(vec![
            proj.project(LonLat::new(bounds.min_lon, bounds.min_lat)),
            proj.project(LonLat::new(bounds.max_lon, bounds.max_lat)),
        ]);
        // Everything inside the viewport...
        assert!(corners.min_x >= -1e-9 && corners.max_x <= width + 1e-9);
        assert!(corners.min_y >= -1e-9 && corners.max_y <= height + 1e-9);
        // ...and the tighter axis spans it completely.
        let fills_x = (corners.width() - width).abs() < 1e-9;
        let fills_y = (corners.height() - height).abs() < 1e-9;
        assert!(fills_x || fills_y);
        // Whatever slack remains is split evenly (the fit is centered).
        let center = corners.center();
        assert!((center.x - width / 2.0).abs() < 1e-9);
        assert!((center.y - height / 2.0).abs() < 1e-9);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let proj = Projection::fit(750.0, 700.0, &sf_bounds());
        let downtown = proj.project(LonLat::new(-122.4194, 37.7749));
        let further_north = proj.project(LonLat::new(-122.4194, 37.8000));
        let further_east = proj.project(LonLat::new(-122.4000, 37.7749));
        assert!(further_north.y < downtown.y);
        assert!(further_east.x > downtown.x);
    }

    #[test]
    fn single_point_reference_doesnt_explode() {
        let bounds = GpsBounds::from_points(vec![LonLat::new(-122.4, 37.8)]);
        let proj = Projection::fit(750.0, 700.0, &bounds);
        let pt = proj.project(LonLat::new(-122.4, 37.8));
        assert!(pt.x.is_finite() && pt.y.is_finite());
        assert!((pt.x - 375.0).abs() < 1e-9);
        assert!((pt.y - 350.0).abs() < 1e-9);
    }
}
