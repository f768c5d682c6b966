//! Coefficient operator assembly
//!
//! Row contributions are accumulated in a dense working matrix (overlapping
//! stencil terms sum in place), then compressed to CSR for factorization
//! handoff; zeros are dropped in the compression.

use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

use super::form::Row;
use super::problem::Problem;
use crate::error::{PoroError, Result};

/// Assembled coefficient operator in both representations
#[derive(Debug, Clone)]
pub struct Operator {
    dense: DMatrix<f64>,
    sparse: CsMat<f64>,
    /// Grid and scheme, carried for error reporting
    pub nx: usize,
    pub ny: usize,
    pub discretization: String,
}

impl Operator {
    /// Dense working form
    pub fn dense(&self) -> &DMatrix<f64> {
        &self.dense
    }

    /// Compressed sparse row form
    pub fn sparse(&self) -> &CsMat<f64> {
        &self.sparse
    }

    /// Number of rows (= number of unknowns)
    pub fn dim(&self) -> usize {
        self.dense.nrows()
    }

    pub fn nnz(&self) -> usize {
        self.sparse.nnz()
    }

    /// (row, column, value) triplets, one per structurally nonzero entry
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        self.sparse
            .iter()
            .map(|(&v, (i, j))| (i, j, v))
            .collect()
    }

    /// Rebuild a dense matrix from the triplet list
    pub fn densify(&self) -> DMatrix<f64> {
        let n = self.dim();
        let mut out = DMatrix::zeros(n, n);
        for (i, j, v) in self.triplets() {
            out[(i, j)] += v;
        }
        out
    }

    /// Compress an accumulated dense matrix, dropping zeros
    pub(crate) fn from_dense(dense: DMatrix<f64>, nx: usize, ny: usize, discretization: String) -> Self {
        let n = dense.nrows();
        let mut triplets = TriMat::new((n, dense.ncols()));
        for j in 0..dense.ncols() {
            for i in 0..n {
                let v = dense[(i, j)];
                if v != 0.0 {
                    triplets.add_triplet(i, j, v);
                }
            }
        }
        Self {
            dense,
            sparse: triplets.to_csr(),
            nx,
            ny,
            discretization,
        }
    }

    pub(crate) fn into_parts(self) -> (DMatrix<f64>, CsMat<f64>) {
        (self.dense, self.sparse)
    }
}

/// Builds the operator from the implicit part of every balance equation
pub struct OperatorAssembler;

impl OperatorAssembler {
    /// Assemble the coefficient operator of a run
    ///
    /// # Returns
    /// N×N operator with N = Σ active counts, rows in block order
    pub fn assemble(problem: &Problem) -> Result<Operator> {
        let rows = problem.rows()?;
        Self::from_rows(problem, &rows)
    }

    /// Assemble from rows already built for this problem
    pub fn from_rows(problem: &Problem, rows: &[Row]) -> Result<Operator> {
        let n = problem.layout().total();
        if rows.len() != n {
            return Err(PoroError::DimensionMismatch {
                context: "operator rows",
                expected: n,
                actual: rows.len(),
            });
        }

        let mut dense = DMatrix::zeros(n, n);
        for (i, row) in rows.iter().enumerate() {
            for &(j, coef) in &row.lhs {
                if j >= n {
                    return Err(PoroError::IndexMap(format!(
                        "row {} references unknown {} (N = {})",
                        i, j, n
                    )));
                }
                dense[(i, j)] += coef;
            }
        }

        Ok(Operator::from_dense(
            dense,
            problem.mesh.nx,
            problem.mesh.ny,
            problem.discretization.to_string(),
        ))
    }
}
