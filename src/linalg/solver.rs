//! Solve statistics and residual checks against the compressed operator

use nalgebra::DVector;
use sprs::CsMat;

/// What one linear solve reports back to the time loop
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// ||b − Ax||₂
    pub residual_norm: f64,
    /// residual_norm / ||b||₂, or the absolute norm for a zero RHS
    pub relative_residual: f64,
    /// Row carrying the largest residual entry
    pub worst_row: Option<usize>,
    pub converged: bool,
    /// Wall time of the triangular solves in seconds
    pub solve_time: f64,
}

/// Residual r = b − Ax of a solved step
#[derive(Debug, Clone)]
pub struct Residual {
    pub values: DVector<f64>,
    rhs_norm: f64,
}

impl Residual {
    /// Evaluate the residual with one pass over the CSR rows
    pub fn measure(matrix: &CsMat<f64>, x: &DVector<f64>, b: &DVector<f64>) -> Self {
        debug_assert_eq!(matrix.cols(), x.len());
        debug_assert_eq!(matrix.rows(), b.len());

        let mut values = b.clone();
        for (i, row) in matrix.outer_iterator().enumerate() {
            values[i] -= row.iter().map(|(j, &a)| a * x[j]).sum::<f64>();
        }
        Self {
            values,
            rhs_norm: b.norm(),
        }
    }

    pub fn norm(&self) -> f64 {
        self.values.norm()
    }

    /// Relative to the RHS; a homogeneous system falls back to the absolute norm
    pub fn relative(&self) -> f64 {
        if self.rhs_norm < 1e-14 {
            self.norm()
        } else {
            self.norm() / self.rhs_norm
        }
    }

    pub fn worst_row(&self) -> Option<usize> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iamax())
        }
    }
}
