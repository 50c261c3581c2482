use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

/// Clipped Voronoi partition of a set of optional sites.
///
/// Cells are computed by clipping the extent rectangle against the
/// perpendicular bisector of every other site. Absent sites and sites that
/// duplicate an earlier site's coordinates get no cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiDiagram {
    extent: Rect,
    sites: Vec<Option<Point>>,
    cells: Vec<Option<Vec<Point>>>,
}

impl VoronoiDiagram {
    #[must_use]
    pub fn new(sites: Vec<Option<Point>>, extent: Rect) -> Self {
        let extent = extent.abs();
        let mut unique: Vec<Option<Point>> = Vec::with_capacity(sites.len());
        for (index, site) in sites.iter().enumerate() {
            let kept = site.filter(|candidate| {
                candidate.is_finite()
                    && !sites[..index]
                        .iter()
                        .flatten()
                        .any(|earlier| earlier.distance(*candidate) <= EPSILON)
            });
            unique.push(kept);
        }

        let cells = unique
            .iter()
            .map(|site| site.map(|site| clip_cell(site, &unique, extent)))
            .map(|cell| cell.filter(|polygon| polygon.len() >= 3))
            .collect();

        Self {
            extent,
            sites,
            cells,
        }
    }

    #[must_use]
    pub fn extent(&self) -> Rect {
        self.extent
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&[Point]> {
        self.cells.get(index).and_then(|cell| cell.as_deref())
    }

    #[must_use]
    pub fn cells(&self) -> &[Option<Vec<Point>>] {
        &self.cells
    }

    /// Index of the cell containing `point`, if any.
    #[must_use]
    pub fn find(&self, point: Point) -> Option<usize> {
        self.cells.iter().position(|cell| {
            cell.as_deref()
                .is_some_and(|polygon| convex_contains(polygon, point))
        })
    }

    /// Indices of cells sharing an edge of positive length with `index`.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let (Some(Some(site)), Some(Some(polygon))) = (self.sites.get(index), self.cells.get(index))
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (other_index, other) in self.cells.iter().enumerate() {
            if other_index == index || other.is_none() {
                continue;
            }
            let Some(Some(other_site)) = self.sites.get(other_index) else {
                continue;
            };
            let on_bisector: Vec<&Point> = polygon
                .iter()
                .filter(|vertex| {
                    (vertex.distance(*site) - vertex.distance(*other_site)).abs() <= 1e-6
                })
                .collect();
            let shared_edge = on_bisector
                .iter()
                .enumerate()
                .any(|(i, a)| on_bisector[i + 1..].iter().any(|b| a.distance(**b) > 1e-6));
            if shared_edge {
                out.push(other_index);
            }
        }
        out
    }

    /// SVG path data per cell (`M..L..Z`), `None` for absent cells.
    #[must_use]
    pub fn svg_paths(&self) -> Vec<Option<String>> {
        self.cells
            .iter()
            .map(|cell| cell.as_deref().map(polygon_to_svg))
            .collect()
    }
}

fn clip_cell(site: Point, sites: &[Option<Point>], extent: Rect) -> Vec<Point> {
    let mut polygon = vec![
        Point::new(extent.x0, extent.y0),
        Point::new(extent.x1, extent.y0),
        Point::new(extent.x1, extent.y1),
        Point::new(extent.x0, extent.y1),
    ];

    for other in sites.iter().flatten() {
        if other.distance(site) <= EPSILON {
            continue;
        }
        polygon = clip_half_plane(&polygon, site, *other);
        if polygon.is_empty() {
            break;
        }
    }
    polygon
}

/// Keeps the part of `polygon` closer to `site` than to `other`.
fn clip_half_plane(polygon: &[Point], site: Point, other: Point) -> Vec<Point> {
    let normal = other - site;
    let midpoint = site.midpoint(other);
    let offset = |p: Point| (p - midpoint).dot(normal);

    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let current_offset = offset(*current);
        let next_offset = offset(next);
        let current_inside = current_offset <= 0.0;
        let next_inside = next_offset <= 0.0;

        if current_inside {
            out.push(*current);
        }
        if current_inside != next_inside {
            let t = current_offset / (current_offset - next_offset);
            out.push(current.lerp(next, t));
        }
    }
    out
}

fn convex_contains(polygon: &[Point], point: Point) -> bool {
    let mut sign = 0.0_f64;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let cross = (b - *a).cross(point - *a);
        if cross.abs() <= EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn polygon_to_svg(polygon: &[Point]) -> String {
    let body = polygon
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join("L");
    format!("M{body}Z")
}
