//! Factorize-once direct solver
//!
//! The operator is LU-factorized a single time; every later step is a pair of
//! triangular solves against the stored factors. Lifecycle:
//! `Unfactored → factorize → Factored → solve_step* → finish → Done`.

use nalgebra::linalg::LU;
use nalgebra::{DVector, Dyn};
use sprs::CsMat;
use std::time::Instant;

use super::solver::{Residual, SolverStats};
use crate::error::{PoroError, Result};
use crate::fvm::Operator;

/// Relative residual below which a solve is reported as converged
const CONVERGED_RESIDUAL: f64 = 1e-8;

/// Lifecycle phase of a [`DirectSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPhase {
    Unfactored,
    Factored,
    Done,
}

enum State {
    Unfactored,
    Factored {
        lu: LU<f64, Dyn, Dyn>,
        /// Kept for residual checks
        matrix: CsMat<f64>,
        /// Scratch vector, zeroed around every solve
        work: DVector<f64>,
    },
    Done,
}

/// Dense LU solver with stored factors
pub struct DirectSolver {
    name: String,
    state: State,
    solves: usize,
}

impl DirectSolver {
    pub fn new() -> Self {
        Self {
            name: "Direct (dense LU, factorize once)".to_string(),
            state: State::Unfactored,
            solves: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> SolverPhase {
        match self.state {
            State::Unfactored => SolverPhase::Unfactored,
            State::Factored { .. } => SolverPhase::Factored,
            State::Done => SolverPhase::Done,
        }
    }

    /// Number of solves performed against the current factors
    pub fn solves(&self) -> usize {
        self.solves
    }

    /// Order of the factored system, `None` unless factored
    pub fn dim(&self) -> Option<usize> {
        match &self.state {
            State::Factored { work, .. } => Some(work.len()),
            _ => None,
        }
    }

    /// LU-factorize the operator, consuming it
    ///
    /// # Errors
    /// * `Singular` if a pivot is exactly zero (reports grid and scheme)
    /// * `Factorization` if the factors contain non-finite values, or if the
    ///   solver was already factored or finished
    pub fn factorize(&mut self, operator: Operator) -> Result<()> {
        if !matches!(self.state, State::Unfactored) {
            return Err(PoroError::Factorization(
                "factorize called on a solver that is not unfactored".to_string(),
            ));
        }

        let rows = operator.dim();
        let nx = operator.nx;
        let ny = operator.ny;
        let discretization = operator.discretization.clone();
        let (dense, matrix) = operator.into_parts();

        if dense.iter().any(|v| !v.is_finite()) {
            return Err(PoroError::Factorization(format!(
                "operator of {} rows has non-finite entries",
                rows
            )));
        }

        let lu = dense.lu();
        if !lu.is_invertible() {
            return Err(PoroError::Singular {
                rows,
                nx,
                ny,
                discretization,
            });
        }
        if lu.u().iter().any(|v| !v.is_finite()) {
            return Err(PoroError::Factorization(format!(
                "LU factors of the {}x{} {} operator are not finite",
                nx, ny, discretization
            )));
        }

        self.state = State::Factored {
            lu,
            matrix,
            work: DVector::zeros(rows),
        };
        self.solves = 0;
        Ok(())
    }

    /// Solve the factored system for one right-hand side
    ///
    /// # Arguments
    /// * `rhs` - Independent-terms vector of length N
    ///
    /// # Returns
    /// (x, statistics)
    ///
    /// # Errors
    /// `NotFactored` outside the factored phase, `DimensionMismatch` on a
    /// wrong-length RHS, `Factorization` if the triangular solve fails.
    pub fn solve_step(&mut self, rhs: &DVector<f64>) -> Result<(DVector<f64>, SolverStats)> {
        let State::Factored { lu, matrix, work } = &mut self.state else {
            return Err(PoroError::NotFactored);
        };
        if rhs.len() != work.len() {
            return Err(PoroError::DimensionMismatch {
                context: "right-hand side",
                expected: work.len(),
                actual: rhs.len(),
            });
        }

        let start = Instant::now();
        work.fill(0.0);
        work.copy_from(rhs);
        let solved = lu.solve_mut(work);
        let x = work.clone();
        work.fill(0.0);

        if !solved || x.iter().any(|v| !v.is_finite()) {
            return Err(PoroError::Factorization(
                "triangular solve produced no finite solution".to_string(),
            ));
        }
        let solve_time = start.elapsed().as_secs_f64();

        let residual = Residual::measure(matrix, &x, rhs);
        self.solves += 1;

        let relative_residual = residual.relative();
        let stats = SolverStats {
            residual_norm: residual.norm(),
            relative_residual,
            worst_row: residual.worst_row(),
            converged: relative_residual < CONVERGED_RESIDUAL,
            solve_time,
        };
        Ok((x, stats))
    }

    /// Release the factors; further solves fail with `NotFactored`
    pub fn finish(&mut self) {
        self.state = State::Done;
    }
}

impl Default for DirectSolver {
    fn default() -> Self {
        Self::new()
    }
}
