use nalgebra::DMatrix;

use super::grid::Quantity;
use crate::error::{PoroError, Result};

/// Dense field arrays, one per quantity
///
/// Entry (r, c) of each matrix holds the value at logical position (r, c) of
/// that quantity's index map; inactive positions hold an ignorable zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub u: DMatrix<f64>,
    pub v: DMatrix<f64>,
    pub p: DMatrix<f64>,
    /// Present only for dual-porosity runs
    pub p_macro: Option<DMatrix<f64>>,
}

impl FieldSet {
    /// Zero-filled arrays of the given (rows, cols) shapes
    pub fn zeros(
        u_shape: (usize, usize),
        v_shape: (usize, usize),
        p_shape: (usize, usize),
        dual: bool,
    ) -> Self {
        Self {
            u: DMatrix::zeros(u_shape.0, u_shape.1),
            v: DMatrix::zeros(v_shape.0, v_shape.1),
            p: DMatrix::zeros(p_shape.0, p_shape.1),
            p_macro: dual.then(|| DMatrix::zeros(p_shape.0, p_shape.1)),
        }
    }

    pub fn get(&self, quantity: Quantity) -> Option<&DMatrix<f64>> {
        match quantity {
            Quantity::U => Some(&self.u),
            Quantity::V => Some(&self.v),
            Quantity::P => Some(&self.p),
            Quantity::PMacro => self.p_macro.as_ref(),
        }
    }

    pub fn get_mut(&mut self, quantity: Quantity) -> Option<&mut DMatrix<f64>> {
        match quantity {
            Quantity::U => Some(&mut self.u),
            Quantity::V => Some(&mut self.v),
            Quantity::P => Some(&mut self.p),
            Quantity::PMacro => self.p_macro.as_mut(),
        }
    }

    /// Set every entry of one quantity to a constant
    pub fn fill(&mut self, quantity: Quantity, value: f64) -> Result<()> {
        let field = self.get_mut(quantity).ok_or_else(|| {
            PoroError::config(format!("field '{}' is not part of this run", quantity))
        })?;
        field.fill(value);
        Ok(())
    }

    /// Number of pressure-like fields (1 or 2)
    pub fn pressure_count(&self) -> usize {
        if self.p_macro.is_some() {
            2
        } else {
            1
        }
    }

    /// Largest absolute value over all fields
    pub fn max_abs(&self) -> f64 {
        let mut m = self.u.amax().max(self.v.amax()).max(self.p.amax());
        if let Some(pm) = &self.p_macro {
            m = m.max(pm.amax());
        }
        m
    }
}
