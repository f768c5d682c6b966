use super::form::Row;
use super::interpolation::Discretization;
use super::layout::SystemLayout;
use super::{collocated, staggered};
use crate::bc::{BoundaryConditions, Condition, Side};
use crate::error::{PoroError, Result};
use crate::mechanics::{Coefficients, PorosityModel};
use crate::mesh::{FieldSet, Mesh, Quantity};

/// Validated inputs of one run
///
/// Owns the mesh; assembly stages borrow it. Construction performs every
/// configuration check so that assembly never starts on an inconsistent setup.
#[derive(Debug, Clone)]
pub struct Problem {
    pub mesh: Mesh,
    pub discretization: Discretization,
    pub conditions: BoundaryConditions,
    pub coefficients: Coefficients,
    pub porosity: PorosityModel,
    layout: SystemLayout,
    pressures: Vec<Quantity>,
}

impl Problem {
    /// # Errors
    /// `Config` when the mesh arrangement disagrees with the discretization,
    /// the boundary table width does not match the number of quantities, or a
    /// material constant is invalid. `IndexMap` if an index map is corrupt.
    pub fn new(
        mesh: Mesh,
        discretization: Discretization,
        conditions: BoundaryConditions,
        coefficients: Coefficients,
        porosity: PorosityModel,
    ) -> Result<Self> {
        if mesh.arrangement != discretization.arrangement() {
            return Err(PoroError::config(format!(
                "mesh was built {} but the discretization is {}",
                mesh.arrangement, discretization
            )));
        }
        coefficients.validate()?;
        if let PorosityModel::Double(dual) = &porosity {
            dual.validate()?;
        }
        let pressure_count = porosity.pressure_count();
        conditions.validate(2 + pressure_count)?;

        let layout = SystemLayout::new(&mesh, pressure_count);
        for q in layout.quantities() {
            mesh.map(q).check()?;
        }
        let pressures = layout.quantities().filter(|q| q.pressure_slot().is_some()).collect();

        Ok(Self {
            mesh,
            discretization,
            conditions,
            coefficients,
            porosity,
            layout,
            pressures,
        })
    }

    pub fn layout(&self) -> &SystemLayout {
        &self.layout
    }

    /// Pressure-like quantities in slot order
    pub fn pressures(&self) -> &[Quantity] {
        &self.pressures
    }

    /// Zero-initialised fields matching this run
    pub fn zero_fields(&self) -> FieldSet {
        self.mesh.zero_fields(self.porosity.pressure_count())
    }

    /// Global unknown index of `quantity` at a logical position
    pub fn global(&self, quantity: Quantity, row: usize, col: usize) -> Option<usize> {
        let local = self.mesh.map(quantity).get(row, col)?;
        Some(self.layout.offset(quantity)? + local)
    }

    /// Global index at an offset from a position, `None` if inactive
    pub fn neighbour(
        &self,
        quantity: Quantity,
        row: usize,
        col: usize,
        dr: isize,
        dc: isize,
    ) -> Option<usize> {
        let local = self.mesh.map(quantity).offset(row, col, dr, dc)?;
        Some(self.layout.offset(quantity)? + local)
    }

    /// Like [`Problem::neighbour`] for positions the stencil guarantees active
    pub fn require(
        &self,
        quantity: Quantity,
        row: usize,
        col: usize,
        dr: isize,
        dc: isize,
    ) -> Result<usize> {
        self.neighbour(quantity, row, col, dr, dc).ok_or_else(|| {
            PoroError::IndexMap(format!(
                "'{}' expected active at ({}, {}) offset ({}, {})",
                quantity, row, col, dr, dc
            ))
        })
    }

    /// Condition of `quantity` on `side` at the physical point `at`
    pub fn condition(&self, side: Side, quantity: Quantity, at: (f64, f64)) -> Result<Condition> {
        let s = if side.is_horizontal() { at.0 } else { at.1 };
        self.conditions.condition(side, quantity, s)
    }

    /// Face area and normal spacing for a face on `side` of a control volume
    pub(crate) fn face_geometry(&self, side: Side) -> (f64, f64) {
        if side.is_horizontal() {
            (self.mesh.dx, self.mesh.dy)
        } else {
            (self.mesh.dy, self.mesh.dx)
        }
    }

    /// Balance equations of every unknown, in global order
    ///
    /// The arrangement/scheme pair is dispatched once here.
    pub fn rows(&self) -> Result<Vec<Row>> {
        let rows = match self.discretization {
            Discretization::Staggered => staggered::rows(self)?,
            Discretization::Collocated(scheme) => collocated::rows(self, scheme.interpolator())?,
        };
        if rows.len() != self.layout.total() {
            return Err(PoroError::DimensionMismatch {
                context: "assembled rows",
                expected: self.layout.total(),
                actual: rows.len(),
            });
        }
        Ok(rows)
    }

    /// One-line description used in reports and error messages
    pub fn describe(&self) -> String {
        format!(
            "{}x{} {} grid, {} unknowns, dt = {:.4e}",
            self.mesh.nx,
            self.mesh.ny,
            self.discretization,
            self.layout.total(),
            self.mesh.dt
        )
    }
}
