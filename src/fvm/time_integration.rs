//! Implicit time stepping against one factorized operator
//!
//! Backward Euler over `steps - 1` intervals of length `dt`. The operator does
//! not depend on the field, so it is assembled and factorized once; each step
//! only rebuilds the RHS from the previous fields and performs a triangular
//! solve.

use nalgebra::{DMatrix, DVector};
use std::time::Instant;

use super::operator::OperatorAssembler;
use super::problem::Problem;
use super::rhs::RhsAssembler;
use crate::error::{PoroError, Result};
use crate::linalg::{DirectSolver, SolverPhase};
use crate::mesh::{FieldSet, Quantity};

/// Statistics for a single time step
#[derive(Debug, Clone)]
pub struct TimeStepStats {
    /// Step index (1-based; step 0 is the initial state)
    pub step: usize,
    /// Simulation time after the step
    pub time: f64,
    /// Time step size used
    pub dt: f64,
    /// Residual norm of the linear solve
    pub residual: f64,
    /// Relative residual of the linear solve
    pub relative_residual: f64,
    /// Wall time of RHS assembly plus solve (seconds)
    pub solve_time: f64,
}

/// Drives a [`Problem`] through its time steps
///
/// Owns the fields for the whole run; callers read them between steps through
/// [`TimeStepper::fields`] or the observer passed to [`TimeStepper::run`].
pub struct TimeStepper {
    problem: Problem,
    rhs: Option<RhsAssembler>,
    solver: DirectSolver,
    fields: FieldSet,
    step: usize,
    time: f64,
    verbose: bool,
}

impl TimeStepper {
    /// # Arguments
    /// * `problem` - Validated run inputs
    /// * `fields` - Initial state; must match the problem's grid and porosity
    ///
    /// # Errors
    /// `DimensionMismatch` if the field set carries the wrong number of
    /// pressures or wrongly shaped arrays.
    pub fn new(problem: Problem, fields: FieldSet) -> Result<Self> {
        let expected = problem.porosity.pressure_count();
        if fields.pressure_count() != expected {
            return Err(PoroError::DimensionMismatch {
                context: "pressure fields",
                expected,
                actual: fields.pressure_count(),
            });
        }
        // Shape check through a round trip of the layout
        problem.layout().gather(&problem.mesh, &fields)?;

        Ok(Self {
            problem,
            rhs: None,
            solver: DirectSolver::new(),
            fields,
            step: 0,
            time: 0.0,
            verbose: false,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Assemble and factorize the operator, keeping the explicit row parts for the RHS
    pub fn factorize(&mut self) -> Result<()> {
        let start = Instant::now();
        let rows = self.problem.rows()?;
        let operator = OperatorAssembler::from_rows(&self.problem, &rows)?;
        let nnz = operator.nnz();
        self.rhs = Some(RhsAssembler::from_rows(&self.problem, &rows));
        self.solver.factorize(operator)?;

        if self.verbose {
            println!(
                "Factorized {} ({} nonzeros) in {:.3} s",
                self.problem.describe(),
                nnz,
                start.elapsed().as_secs_f64()
            );
        }
        Ok(())
    }

    /// Solve one step for an externally assembled RHS and store the result
    ///
    /// # Errors
    /// `NotFactored` before [`TimeStepper::factorize`] or after
    /// [`TimeStepper::finish`]; `DimensionMismatch` for a wrong-length RHS.
    pub fn solve_step(&mut self, rhs: &DVector<f64>) -> Result<TimeStepStats> {
        let (x, stats) = self.solver.solve_step(rhs)?;
        self.problem
            .layout()
            .scatter(&self.problem.mesh, &x, &mut self.fields)?;

        self.step += 1;
        self.time += self.problem.mesh.dt;
        Ok(TimeStepStats {
            step: self.step,
            time: self.time,
            dt: self.problem.mesh.dt,
            residual: stats.residual_norm,
            relative_residual: stats.relative_residual,
            solve_time: stats.solve_time,
        })
    }

    /// Advance one step: t_n → t_{n+1}
    pub fn advance(&mut self) -> Result<TimeStepStats> {
        let start = Instant::now();
        let rhs = match &self.rhs {
            Some(assembler) => assembler.assemble(&self.problem.mesh, &self.fields, self.step)?,
            None => return Err(PoroError::NotFactored),
        };
        let mut stats = self.solve_step(&rhs)?;
        stats.solve_time = start.elapsed().as_secs_f64();

        if self.verbose {
            println!(
                "  step {:4}  t = {:.4e}  |r| = {:.3e}  |r|/|b| = {:.3e}",
                stats.step, stats.time, stats.residual, stats.relative_residual
            );
        }
        Ok(stats)
    }

    /// Factorize if needed, then advance through every remaining step
    ///
    /// # Arguments
    /// * `observer` - Called with `(step, fields)` after each step
    ///
    /// # Returns
    /// Statistics of every step taken
    pub fn run<F>(&mut self, mut observer: F) -> Result<Vec<TimeStepStats>>
    where
        F: FnMut(usize, &FieldSet),
    {
        if self.solver.phase() == SolverPhase::Unfactored {
            self.factorize()?;
        }
        let last = self.problem.mesh.steps.saturating_sub(1);
        let mut history = Vec::with_capacity(last.saturating_sub(self.step));
        while self.step < last {
            let stats = self.advance()?;
            observer(stats.step, &self.fields);
            history.push(stats);
        }
        Ok(history)
    }

    /// Release the factorization; the fields stay readable
    pub fn finish(&mut self) {
        self.solver.finish();
        self.rhs = None;
    }

    pub fn phase(&self) -> SolverPhase {
        self.solver.phase()
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn into_fields(self) -> FieldSet {
        self.fields
    }

    /// Completed steps
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Overwrite one field array
    ///
    /// # Errors
    /// `DimensionMismatch` if the shape differs from the quantity's grid,
    /// `IndexMap` if the quantity is not part of this run.
    pub fn set_field(&mut self, quantity: Quantity, values: DMatrix<f64>) -> Result<()> {
        let map = self.problem.mesh.map(quantity);
        let field = self.fields.get_mut(quantity).ok_or_else(|| {
            PoroError::IndexMap(format!("no '{}' field in this run", quantity))
        })?;
        if values.shape() != (map.rows(), map.cols()) {
            return Err(PoroError::DimensionMismatch {
                context: "field assignment",
                expected: map.rows() * map.cols(),
                actual: values.len(),
            });
        }
        *field = values;
        Ok(())
    }

    /// Overwrite the fracture pressure of a dual-porosity run
    pub fn set_macro_field(&mut self, values: DMatrix<f64>) -> Result<()> {
        self.set_field(Quantity::PMacro, values)
    }

    /// Fracture pressure, `None` for a single-porosity run
    pub fn get_macro_field(&self) -> Option<&DMatrix<f64>> {
        self.fields.p_macro.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bc::{BoundaryConditions, BoundaryKind, BoundaryTable};
    use crate::fvm::Discretization;
    use crate::mechanics::{Coefficients, DualPorosity, PoroelasticProperties, PorosityModel};
    use crate::mesh::{Arrangement, MeshBuilder};
    use approx::assert_relative_eq;

    fn rock() -> PoroelasticProperties {
        PoroelasticProperties {
            shear_modulus: 1.0,
            bulk_modulus: 2.0,
            solid_bulk_modulus: 10.0,
            solid_density: 2.0,
            fluid_bulk_modulus: 1.0,
            porosity: 0.2,
            permeability: 1.0,
            fluid_viscosity: 1.0,
            fluid_density: 1.0,
            macro_porosity: Some(0.1),
            macro_permeability: Some(5.0),
        }
    }

    fn problem(model: PorosityModel, steps: usize) -> Problem {
        let mesh = MeshBuilder::new(3, 3, 1.0, 1.0)
            .time(steps, 1.0)
            .arrangement(Arrangement::Staggered)
            .build()
            .unwrap();
        let k = 2 + model.pressure_count();
        let conditions =
            BoundaryConditions::new(BoundaryTable::uniform(BoundaryKind::Dirichlet, 0.0, k));
        let coefficients = Coefficients::from_properties(&rock(), 0.0).unwrap();
        Problem::new(mesh, Discretization::Staggered, conditions, coefficients, model).unwrap()
    }

    #[test]
    fn test_advance_requires_factorization() {
        let problem = problem(PorosityModel::Single, 3);
        let fields = problem.zero_fields();
        let mut stepper = TimeStepper::new(problem, fields).unwrap();
        assert!(matches!(stepper.advance(), Err(PoroError::NotFactored)));
    }

    #[test]
    fn test_run_takes_steps_minus_one() {
        let problem = problem(PorosityModel::Single, 5);
        let fields = problem.zero_fields();
        let mut stepper = TimeStepper::new(problem, fields).unwrap();

        let mut seen = Vec::new();
        let history = stepper.run(|step, _| seen.push(step)).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_relative_eq!(stepper.time(), 1.0, epsilon = 1e-12);

        // Zero forcing keeps the zero state
        assert!(stepper.fields().max_abs() < 1e-12);
    }

    #[test]
    fn test_wrong_pressure_count_rejected() {
        let dual = DualPorosity::from_properties(&rock(), 1.0).unwrap();
        let problem = problem(PorosityModel::Double(dual), 3);
        let single = problem.mesh.zero_fields(1);
        assert!(matches!(
            TimeStepper::new(problem, single),
            Err(PoroError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_macro_field_accessors() {
        let dual = DualPorosity::from_properties(&rock(), 1.0).unwrap();
        let problem = problem(PorosityModel::Double(dual), 3);
        let fields = problem.zero_fields();
        let mut stepper = TimeStepper::new(problem, fields).unwrap();

        stepper.set_macro_field(DMatrix::from_element(3, 3, 2.5)).unwrap();
        assert_eq!(stepper.get_macro_field().unwrap()[(1, 1)], 2.5);
        assert!(stepper.set_macro_field(DMatrix::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_finish_blocks_further_steps() {
        let problem = problem(PorosityModel::Single, 4);
        let fields = problem.zero_fields();
        let mut stepper = TimeStepper::new(problem, fields).unwrap();
        stepper.factorize().unwrap();
        stepper.advance().unwrap();
        stepper.finish();
        assert_eq!(stepper.phase(), SolverPhase::Done);
        assert!(matches!(stepper.advance(), Err(PoroError::NotFactored)));
        assert_eq!(stepper.step(), 1);
    }
}
