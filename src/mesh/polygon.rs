//! Polygonal domain outline used to clip the bounding rectangle

use crate::error::{PoroError, Result};

/// Simple (non self-intersecting) polygon in physical coordinates
///
/// Vertices may be listed clockwise or counter-clockwise; the closing edge
/// from the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<(f64, f64)>,
    tolerance: f64,
}

impl Polygon {
    /// Build a polygon from its vertices
    ///
    /// # Errors
    /// `Config` if fewer than three vertices are given, a coordinate is not
    /// finite, or the enclosed area vanishes.
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PoroError::config(format!(
                "domain polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|&(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(PoroError::config("domain polygon has non-finite coordinates"));
        }

        let (xmin, ymin, xmax, ymax) = bounds(&vertices);
        let scale = (xmax - xmin).hypot(ymax - ymin);
        let polygon = Self {
            vertices,
            tolerance: 1e-10 * scale.max(f64::MIN_POSITIVE),
        };
        if polygon.area() <= polygon.tolerance * scale {
            return Err(PoroError::config("domain polygon is degenerate (zero area)"));
        }
        Ok(polygon)
    }

    /// Axis-aligned rectangle [0, width] × [0, height]
    pub fn rectangle(width: f64, height: f64) -> Result<Self> {
        Self::new(vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)])
    }

    /// Enclosed area (shoelace formula, orientation independent)
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.vertices[i];
                let (x1, y1) = self.vertices[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        0.5 * twice.abs()
    }

    /// (xmin, ymin, xmax, ymax)
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        bounds(&self.vertices)
    }

    /// Point containment; points on an edge or vertex count as inside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            if self.on_segment((x, y), a, b) {
                return true;
            }
            // Crossing number, half-open in y so shared vertices count once
            if (a.1 > y) != (b.1 > y) {
                let x_cross = a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn on_segment(&self, p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return (p.0 - a.0).hypot(p.1 - a.1) <= self.tolerance;
        }
        let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
        let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
        (p.0 - qx).hypot(p.1 - qy) <= self.tolerance
    }
}

fn bounds(vertices: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    vertices.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
    )
}
