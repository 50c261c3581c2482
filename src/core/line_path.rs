use kurbo::{BezPath, PathEl, Point, Shape};

use crate::core::entity::PageviewPoint;
use crate::core::scale_factory::ScaleSet;

const LENGTH_ACCURACY: f64 = 1e-3;

/// Builds the timeline path for `points` with a monotone-x cubic curve.
///
/// Points whose value is zero or not finite are treated as missing: they end
/// the current subpath and the next defined point starts a new one, so gaps
/// stay visible instead of being bridged by a straight connector.
#[must_use]
pub fn build_line_path(points: &[PageviewPoint], scales: &ScaleSet) -> BezPath {
    let mut path = BezPath::new();
    let mut curve = MonotoneX::default();

    for point in points {
        let defined = point.views_adjusted.is_finite() && point.views_adjusted != 0.0;
        if !defined {
            curve.line_end(&mut path);
            continue;
        }
        let (x, y) = scales.project(point);
        curve.point(&mut path, x, y);
    }
    curve.line_end(&mut path);
    path
}

/// Rendered arc length of `path`, used to size the stroke-dash reveal.
#[must_use]
pub fn path_length(path: &BezPath) -> f64 {
    path.perimeter(LENGTH_ACCURACY)
}

/// Interpolates two paths element by element.
///
/// Returns `None` when the paths do not share the same element structure;
/// callers snap to the target in that case.
#[must_use]
pub fn interpolate_paths(from: &BezPath, to: &BezPath, t: f64) -> Option<BezPath> {
    let from_elements = from.elements();
    let to_elements = to.elements();
    if from_elements.len() != to_elements.len() {
        return None;
    }

    let mut out = BezPath::new();
    for (a, b) in from_elements.iter().zip(to_elements) {
        let element = match (*a, *b) {
            (PathEl::MoveTo(p), PathEl::MoveTo(q)) => PathEl::MoveTo(p.lerp(q, t)),
            (PathEl::LineTo(p), PathEl::LineTo(q)) => PathEl::LineTo(p.lerp(q, t)),
            (PathEl::QuadTo(p1, p2), PathEl::QuadTo(q1, q2)) => {
                PathEl::QuadTo(p1.lerp(q1, t), p2.lerp(q2, t))
            }
            (PathEl::CurveTo(p1, p2, p3), PathEl::CurveTo(q1, q2, q3)) => {
                PathEl::CurveTo(p1.lerp(q1, t), p2.lerp(q2, t), p3.lerp(q3, t))
            }
            (PathEl::ClosePath, PathEl::ClosePath) => PathEl::ClosePath,
            _ => return None,
        };
        out.push(element);
    }
    Some(out)
}

/// Monotone cubic interpolation in x (Steffen-style slope limiting), which
/// never overshoots between samples.
#[derive(Debug, Default)]
struct MonotoneX {
    count: usize,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    t0: f64,
}

impl MonotoneX {
    fn point(&mut self, path: &mut BezPath, x: f64, y: f64) {
        if self.count > 0 && x == self.x1 && y == self.y1 {
            return;
        }

        let mut t1 = f64::NAN;
        match self.count {
            0 => {
                self.count = 1;
                path.move_to(Point::new(x, y));
            }
            1 => self.count = 2,
            2 => {
                self.count = 3;
                t1 = self.slope3(x, y);
                let t0 = self.slope2(t1);
                self.emit(path, t0, t1);
            }
            _ => {
                t1 = self.slope3(x, y);
                self.emit(path, self.t0, t1);
            }
        }

        self.x0 = self.x1;
        self.x1 = x;
        self.y0 = self.y1;
        self.y1 = y;
        self.t0 = t1;
    }

    fn line_end(&mut self, path: &mut BezPath) {
        match self.count {
            1 => path.close_path(),
            2 => path.line_to(Point::new(self.x1, self.y1)),
            3 => {
                let t1 = self.slope2(self.t0);
                self.emit(path, self.t0, t1);
            }
            _ => {}
        }
        *self = Self::default();
    }

    fn emit(&self, path: &mut BezPath, t0: f64, t1: f64) {
        let dx = (self.x1 - self.x0) / 3.0;
        path.curve_to(
            Point::new(self.x0 + dx, self.y0 + dx * t0),
            Point::new(self.x1 - dx, self.y1 - dx * t1),
            Point::new(self.x1, self.y1),
        );
    }

    fn slope3(&self, x2: f64, y2: f64) -> f64 {
        let h0 = self.x1 - self.x0;
        let h1 = x2 - self.x1;
        let s0 = (self.y1 - self.y0) / signed_divisor(h0, h1);
        let s1 = (y2 - self.y1) / signed_divisor(h1, h0);
        let p = (s0 * h1 + s1 * h0) / (h0 + h1);
        let slope = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
        if slope.is_nan() { 0.0 } else { slope }
    }

    fn slope2(&self, t: f64) -> f64 {
        let h = self.x1 - self.x0;
        if h != 0.0 {
            (3.0 * (self.y1 - self.y0) / h - t) / 2.0
        } else {
            t
        }
    }
}

fn signed_divisor(h: f64, other: f64) -> f64 {
    if h != 0.0 {
        h
    } else if other < 0.0 {
        -0.0
    } else {
        0.0
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 { -1.0 } else { 1.0 }
}
