use std::ops::Range;

use nalgebra::DVector;

use crate::error::{PoroError, Result};
use crate::mesh::{FieldSet, Mesh, Quantity};

/// Block structure of the coupled system
///
/// Rows and unknowns are stacked quantity-major (u, v, p[, p_macro]) and,
/// within a block, in the row-major active order of that quantity's index map.
/// Global index = block offset + local index.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemLayout {
    blocks: Vec<(Quantity, Range<usize>)>,
    total: usize,
}

impl SystemLayout {
    /// # Arguments
    /// * `mesh` - Grid with the per-quantity index maps
    /// * `pressures` - Number of pressure-like quantities (1 or 2)
    pub fn new(mesh: &Mesh, pressures: usize) -> Self {
        let quantities = &Quantity::ALL[..2 + pressures.clamp(1, 2)];
        let mut blocks = Vec::with_capacity(quantities.len());
        let mut offset = 0;
        for &q in quantities {
            let n = mesh.active_count(q);
            blocks.push((q, offset..offset + n));
            offset += n;
        }
        Self {
            blocks,
            total: offset,
        }
    }

    /// Total number of unknowns N
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.blocks.iter().map(|(q, _)| *q)
    }

    pub fn pressure_count(&self) -> usize {
        self.blocks.len() - 2
    }

    /// Global row range of a quantity's block
    pub fn block(&self, quantity: Quantity) -> Option<Range<usize>> {
        self.blocks
            .iter()
            .find(|(q, _)| *q == quantity)
            .map(|(_, range)| range.clone())
    }

    pub fn offset(&self, quantity: Quantity) -> Option<usize> {
        self.block(quantity).map(|r| r.start)
    }

    /// Quantity and local index owning a global row
    pub fn locate(&self, row: usize) -> Option<(Quantity, usize)> {
        self.blocks
            .iter()
            .find(|(_, range)| range.contains(&row))
            .map(|(q, range)| (*q, row - range.start))
    }

    /// Flatten the field arrays into a solution-ordered vector
    pub fn gather(&self, mesh: &Mesh, fields: &FieldSet) -> Result<DVector<f64>> {
        let mut x = DVector::zeros(self.total);
        for (q, range) in &self.blocks {
            let field = fields.get(*q).ok_or_else(|| missing_field(*q))?;
            let map = mesh.map(*q);
            check_shape(field.shape(), (map.rows(), map.cols()))?;
            for (local, &(r, c)) in map.coordinates().iter().enumerate() {
                x[range.start + local] = field[(r, c)];
            }
        }
        Ok(x)
    }

    /// Write a solution-ordered vector back into the field arrays
    pub fn scatter(&self, mesh: &Mesh, x: &DVector<f64>, fields: &mut FieldSet) -> Result<()> {
        if x.len() != self.total {
            return Err(PoroError::DimensionMismatch {
                context: "solution scatter",
                expected: self.total,
                actual: x.len(),
            });
        }
        for (q, range) in &self.blocks {
            let map = mesh.map(*q);
            let field = fields.get_mut(*q).ok_or_else(|| missing_field(*q))?;
            check_shape(field.shape(), (map.rows(), map.cols()))?;
            for (local, &(r, c)) in map.coordinates().iter().enumerate() {
                field[(r, c)] = x[range.start + local];
            }
        }
        Ok(())
    }
}

fn missing_field(q: Quantity) -> PoroError {
    PoroError::IndexMap(format!("field set has no array for '{}'", q))
}

fn check_shape(actual: (usize, usize), expected: (usize, usize)) -> Result<()> {
    if actual != expected {
        return Err(PoroError::DimensionMismatch {
            context: "field array",
            expected: expected.0 * expected.1,
            actual: actual.0 * actual.1,
        });
    }
    Ok(())
}
