//! Structured grid with polygon clipping
//!
//! The bounding rectangle [0, width] × [0, height] is split into `nx` columns
//! and `ny` rows. Logical row 0 is the southern-most row and columns grow
//! eastward. Each physical quantity gets its own active-cell index map; active
//! entries are numbered in row-major order, which every stencil relies on for
//! neighbour lookup by logical offset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::FieldSet;
use super::polygon::Polygon;
use crate::error::{PoroError, Result};

/// Physical quantity carried by the coupled system, in block order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Horizontal displacement
    U,
    /// Vertical displacement
    V,
    /// Pore pressure
    P,
    /// Fracture (macro) pressure of a dual-porosity medium
    PMacro,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [Quantity::U, Quantity::V, Quantity::P, Quantity::PMacro];

    /// Column of the boundary table holding this quantity
    pub fn column(self) -> usize {
        match self {
            Quantity::U => 0,
            Quantity::V => 1,
            Quantity::P => 2,
            Quantity::PMacro => 3,
        }
    }

    /// Position among the pressure-like quantities
    pub fn pressure_slot(self) -> Option<usize> {
        match self {
            Quantity::P => Some(0),
            Quantity::PMacro => Some(1),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quantity::U => "u",
            Quantity::V => "v",
            Quantity::P => "p",
            Quantity::PMacro => "p_macro",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement of the unknowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    /// Every quantity at the cell centre
    Collocated,
    /// Pressure at cell centres, displacements on the faces normal to them
    Staggered,
}

impl FromStr for Arrangement {
    type Err = PoroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collocated" | "colocated" => Ok(Arrangement::Collocated),
            "staggered" => Ok(Arrangement::Staggered),
            other => Err(PoroError::config(format!(
                "unknown grid arrangement '{}' (expected collocated or staggered)",
                other
            ))),
        }
    }
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arrangement::Collocated => f.write_str("collocated"),
            Arrangement::Staggered => f.write_str("staggered"),
        }
    }
}

/// Location of a face relative to the active region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceStatus {
    /// Both adjoining cells are active
    Internal,
    /// Exactly one adjoining cell is active
    Boundary,
    /// No adjoining cell is active
    Outside,
}

impl FaceStatus {
    fn from_cells(a: bool, b: bool) -> Self {
        match (a, b) {
            (true, true) => FaceStatus::Internal,
            (false, false) => FaceStatus::Outside,
            _ => FaceStatus::Boundary,
        }
    }
}

/// Forward (logical position → variable index) map and its inverse
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    rows: usize,
    cols: usize,
    index: Vec<Option<usize>>,
    coords: Vec<(usize, usize)>,
}

impl IndexMap {
    /// Number active positions of a `rows × cols` lattice in row-major order
    pub fn from_mask<F>(rows: usize, cols: usize, mut active: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut index = vec![None; rows * cols];
        let mut coords = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if active(r, c) {
                    index[r * cols + c] = Some(coords.len());
                    coords.push((r, c));
                }
            }
        }
        Self {
            rows,
            cols,
            index,
            coords,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Active count N of this quantity
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Variable index at a logical position, `None` when inactive or off the lattice
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            self.index[row * self.cols + col]
        } else {
            None
        }
    }

    /// Variable index at a logical offset from `(row, col)`
    pub fn offset(&self, row: usize, col: usize, dr: isize, dc: isize) -> Option<usize> {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        self.get(r, c)
    }

    /// Logical position of an active variable
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        self.coords[idx]
    }

    pub fn coordinates(&self) -> &[(usize, usize)] {
        &self.coords
    }

    pub fn is_active(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// Verify that the forward map and coordinate table are mutual inverses
    pub fn check(&self) -> Result<()> {
        for (idx, &(r, c)) in self.coords.iter().enumerate() {
            if self.get(r, c) != Some(idx) {
                return Err(PoroError::IndexMap(format!(
                    "variable {} maps to ({}, {}) which points elsewhere",
                    idx, r, c
                )));
            }
        }
        let active = self.index.iter().filter(|i| i.is_some()).count();
        if active != self.coords.len() {
            return Err(PoroError::IndexMap(format!(
                "{} active positions but {} coordinates",
                active,
                self.coords.len()
            )));
        }
        Ok(())
    }
}

/// Immutable grid description shared by every assembly stage
#[derive(Debug, Clone)]
pub struct Mesh {
    pub nx: usize,
    pub ny: usize,
    pub width: f64,
    pub height: f64,
    pub dx: f64,
    pub dy: f64,
    /// Time-step size, total_time / (steps − 1)
    pub dt: f64,
    /// Number of time levels Nt, including the initial one
    pub steps: usize,
    pub total_time: f64,
    pub arrangement: Arrangement,
    polygon: Polygon,
    u_map: IndexMap,
    v_map: IndexMap,
    p_map: IndexMap,
    /// ny × (nx+1), between cells (r, c−1) and (r, c)
    vertical_faces: Vec<FaceStatus>,
    /// (ny+1) × nx, between cells (r−1, c) and (r, c)
    horizontal_faces: Vec<FaceStatus>,
}

impl Mesh {
    /// Index map of a quantity (the macro pressure shares the pressure map)
    pub fn map(&self, quantity: Quantity) -> &IndexMap {
        match quantity {
            Quantity::U => &self.u_map,
            Quantity::V => &self.v_map,
            Quantity::P | Quantity::PMacro => &self.p_map,
        }
    }

    pub fn active_count(&self, quantity: Quantity) -> usize {
        self.map(quantity).len()
    }

    /// Active cell (pressure control volume)
    pub fn cell_active(&self, row: usize, col: usize) -> bool {
        self.p_map.is_active(row, col)
    }

    /// Status of the vertical face west of cell (row, col); `col` ranges over 0..=nx
    pub fn vertical_face(&self, row: usize, col: usize) -> FaceStatus {
        if row < self.ny && col <= self.nx {
            self.vertical_faces[row * (self.nx + 1) + col]
        } else {
            FaceStatus::Outside
        }
    }

    /// Status of the horizontal face south of cell (row, col); `row` ranges over 0..=ny
    pub fn horizontal_face(&self, row: usize, col: usize) -> FaceStatus {
        if row <= self.ny && col < self.nx {
            self.horizontal_faces[row * self.nx + col]
        } else {
            FaceStatus::Outside
        }
    }

    /// Physical sample point of a quantity at a logical position
    pub fn position(&self, quantity: Quantity, row: usize, col: usize) -> (f64, f64) {
        let (r, c) = (row as f64, col as f64);
        match (self.arrangement, quantity) {
            (Arrangement::Staggered, Quantity::U) => (c * self.dx, (r + 0.5) * self.dy),
            (Arrangement::Staggered, Quantity::V) => ((c + 0.5) * self.dx, r * self.dy),
            _ => ((c + 0.5) * self.dx, (r + 0.5) * self.dy),
        }
    }

    /// Characteristic cell size
    pub fn h(&self) -> f64 {
        self.dx.max(self.dy)
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Zero-initialised field arrays for `pressures` pressure-like quantities
    pub fn zero_fields(&self, pressures: usize) -> FieldSet {
        FieldSet::zeros(
            (self.u_map.rows(), self.u_map.cols()),
            (self.v_map.rows(), self.v_map.cols()),
            (self.p_map.rows(), self.p_map.cols()),
            pressures > 1,
        )
    }
}

/// Builder for [`Mesh`]
///
/// # Example
/// ```
/// use poro_fvm::mesh::{Arrangement, MeshBuilder};
/// let mesh = MeshBuilder::new(4, 24, 1.0, 6.0)
///     .time(101, 10.0)
///     .arrangement(Arrangement::Staggered)
///     .build()
///     .unwrap();
/// assert_eq!(mesh.active_count(poro_fvm::mesh::Quantity::U), 5 * 24);
/// ```
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    nx: usize,
    ny: usize,
    width: f64,
    height: f64,
    steps: usize,
    total_time: f64,
    arrangement: Arrangement,
    polygon: Option<Vec<(f64, f64)>>,
}

impl MeshBuilder {
    /// # Arguments
    /// * `nx`, `ny` - Number of columns and rows
    /// * `width`, `height` - Physical extent of the bounding rectangle (m)
    pub fn new(nx: usize, ny: usize, width: f64, height: f64) -> Self {
        Self {
            nx,
            ny,
            width,
            height,
            steps: 2,
            total_time: 1.0,
            arrangement: Arrangement::Staggered,
            polygon: None,
        }
    }

    /// Number of time levels and the simulated horizon
    pub fn time(mut self, steps: usize, total_time: f64) -> Self {
        self.steps = steps;
        self.total_time = total_time;
        self
    }

    pub fn arrangement(mut self, arrangement: Arrangement) -> Self {
        self.arrangement = arrangement;
        self
    }

    /// Clip the rectangle to a polygon; defaults to the full rectangle
    pub fn polygon(mut self, vertices: Vec<(f64, f64)>) -> Self {
        self.polygon = Some(vertices);
        self
    }

    /// Classify every candidate position and number the active ones
    ///
    /// # Errors
    /// `Config` for an empty grid, non-positive extents or horizon, fewer than
    /// two time levels, a degenerate polygon, or a quantity left with no active
    /// position.
    pub fn build(self) -> Result<Mesh> {
        let (nx, ny) = (self.nx, self.ny);
        if nx == 0 || ny == 0 {
            return Err(PoroError::config(format!("grid must have cells, got {}x{}", nx, ny)));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(PoroError::config(format!(
                "domain extents must be positive, got {} x {}",
                self.width, self.height
            )));
        }
        if self.steps < 2 {
            return Err(PoroError::config(format!(
                "need at least 2 time levels, got {}",
                self.steps
            )));
        }
        if !(self.total_time > 0.0) {
            return Err(PoroError::config(format!(
                "total time must be positive, got {}",
                self.total_time
            )));
        }

        let polygon = match self.polygon {
            Some(vertices) => Polygon::new(vertices)?,
            None => Polygon::rectangle(self.width, self.height)?,
        };

        let dx = self.width / nx as f64;
        let dy = self.height / ny as f64;

        let p_map = IndexMap::from_mask(ny, nx, |r, c| {
            polygon.contains((c as f64 + 0.5) * dx, (r as f64 + 0.5) * dy)
        });
        if p_map.is_empty() {
            return Err(PoroError::config(
                "domain polygon contains no cell centre (zero active cells)",
            ));
        }

        let mut vertical_faces = Vec::with_capacity(ny * (nx + 1));
        for r in 0..ny {
            for c in 0..=nx {
                let west = c > 0 && p_map.is_active(r, c - 1);
                vertical_faces.push(FaceStatus::from_cells(west, p_map.is_active(r, c)));
            }
        }
        let mut horizontal_faces = Vec::with_capacity((ny + 1) * nx);
        for r in 0..=ny {
            for c in 0..nx {
                let south = r > 0 && p_map.is_active(r - 1, c);
                horizontal_faces.push(FaceStatus::from_cells(south, p_map.is_active(r, c)));
            }
        }

        let (u_map, v_map) = match self.arrangement {
            Arrangement::Collocated => (p_map.clone(), p_map.clone()),
            Arrangement::Staggered => (
                IndexMap::from_mask(ny, nx + 1, |r, c| {
                    vertical_faces[r * (nx + 1) + c] != FaceStatus::Outside
                }),
                IndexMap::from_mask(ny + 1, nx, |r, c| {
                    horizontal_faces[r * nx + c] != FaceStatus::Outside
                }),
            ),
        };

        Ok(Mesh {
            nx,
            ny,
            width: self.width,
            height: self.height,
            dx,
            dy,
            dt: self.total_time / (self.steps - 1) as f64,
            steps: self.steps,
            total_time: self.total_time,
            arrangement: self.arrangement,
            polygon,
            u_map,
            v_map,
            p_map,
            vertical_faces,
            horizontal_faces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangular_staggered_counts() {
        let mesh = MeshBuilder::new(3, 18, 1.0, 6.0)
            .time(11, 5.0)
            .arrangement(Arrangement::Staggered)
            .build()
            .unwrap();

        assert_eq!(mesh.active_count(Quantity::P), 54);
        assert_eq!(mesh.active_count(Quantity::U), 18 * 4);
        assert_eq!(mesh.active_count(Quantity::V), 19 * 3);
        assert_relative_eq!(mesh.dx, 1.0 / 3.0, epsilon = 1e-15);
        assert_relative_eq!(mesh.dy, 1.0 / 3.0, epsilon = 1e-15);
        assert_relative_eq!(mesh.dt, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_collocated_maps_share_cells() {
        let mesh = MeshBuilder::new(4, 2, 4.0, 2.0)
            .arrangement(Arrangement::Collocated)
            .build()
            .unwrap();
        assert_eq!(mesh.map(Quantity::U), mesh.map(Quantity::P));
        assert_eq!(mesh.map(Quantity::V), mesh.map(Quantity::P));
        assert_eq!(mesh.position(Quantity::U, 0, 0), (0.5, 0.5));
    }

    #[test]
    fn test_row_major_numbering() {
        let mesh = MeshBuilder::new(3, 2, 3.0, 2.0).build().unwrap();
        let p = mesh.map(Quantity::P);
        assert_eq!(p.get(0, 0), Some(0));
        assert_eq!(p.get(0, 2), Some(2));
        assert_eq!(p.get(1, 0), Some(3));
        assert_eq!(p.coords(4), (1, 1));
        assert_eq!(p.offset(0, 0, -1, 0), None);
        assert_eq!(p.offset(0, 0, 1, 1), Some(4));
    }

    #[test]
    fn test_face_status_of_clipped_domain() {
        // Triangle covering the lower-left half of a 4x4 square
        let mesh = MeshBuilder::new(4, 4, 4.0, 4.0)
            .polygon(vec![(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)])
            .build()
            .unwrap();

        // Centres (c+0.5, r+0.5) with c + r + 1 <= 4
        assert_eq!(mesh.active_count(Quantity::P), 4 + 3 + 2 + 1);
        assert!(mesh.cell_active(0, 3));
        assert!(!mesh.cell_active(1, 3));
        assert_eq!(mesh.vertical_face(0, 0), FaceStatus::Boundary);
        assert_eq!(mesh.vertical_face(0, 1), FaceStatus::Internal);
        assert_eq!(mesh.vertical_face(1, 3), FaceStatus::Boundary);
        assert_eq!(mesh.vertical_face(1, 4), FaceStatus::Outside);
        assert_eq!(mesh.horizontal_face(1, 3), FaceStatus::Boundary);

        // Every active cell owns its four faces in the staggered maps
        for &(r, c) in mesh.map(Quantity::P).coordinates() {
            assert!(mesh.map(Quantity::U).is_active(r, c));
            assert!(mesh.map(Quantity::U).is_active(r, c + 1));
            assert!(mesh.map(Quantity::V).is_active(r, c));
            assert!(mesh.map(Quantity::V).is_active(r + 1, c));
        }
    }

    #[test]
    fn test_configuration_errors() {
        assert!(MeshBuilder::new(0, 3, 1.0, 1.0).build().is_err());
        assert!(MeshBuilder::new(3, 3, 1.0, 1.0).time(1, 1.0).build().is_err());
        assert!(MeshBuilder::new(3, 3, -1.0, 1.0).build().is_err());

        let outside = MeshBuilder::new(3, 3, 3.0, 3.0)
            .polygon(vec![(10.0, 10.0), (11.0, 10.0), (11.0, 11.0)])
            .build();
        assert!(matches!(outside, Err(PoroError::Config(_))));
    }
}
