use nalgebra::DVector;

use super::form::Row;
use super::layout::SystemLayout;
use super::problem::Problem;
use crate::error::{PoroError, Result};
use crate::mesh::{FieldSet, Mesh};

/// Explicit part of one balance equation
#[derive(Debug, Clone)]
struct RowSource {
    history: Vec<(usize, f64)>,
    source: f64,
    /// Added on the first step only
    start: Vec<(usize, f64)>,
    start_source: f64,
}

/// Independent-terms (RHS) assembler
///
/// Keeps the explicit part of every row: previous-step history coefficients
/// and the constant built from boundary values, gravity and traction loads.
/// The vector itself is rebuilt from scratch each step.
#[derive(Debug, Clone)]
pub struct RhsAssembler {
    layout: SystemLayout,
    rows: Vec<RowSource>,
}

impl RhsAssembler {
    pub fn new(problem: &Problem) -> Result<Self> {
        let rows = problem.rows()?;
        Ok(Self::from_rows(problem, &rows))
    }

    /// Reuse rows already built for this problem
    pub fn from_rows(problem: &Problem, rows: &[Row]) -> Self {
        Self {
            layout: problem.layout().clone(),
            rows: rows
                .iter()
                .map(|r| RowSource {
                    history: r.history.clone(),
                    source: r.source,
                    start: r.start.clone(),
                    start_source: r.start_source,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// RHS for the step following the state held in `fields`
    ///
    /// # Arguments
    /// * `mesh` - Grid the fields are laid out on
    /// * `fields` - Field arrays at the previous time level
    /// * `step` - Index of that level; level 0 adds the first-step correction
    ///
    /// # Returns
    /// Length-N vector aligned with the operator rows
    pub fn assemble(&self, mesh: &Mesh, fields: &FieldSet, step: usize) -> Result<DVector<f64>> {
        let previous = self.layout.gather(mesh, fields)?;
        if previous.len() != self.rows.len() {
            return Err(PoroError::DimensionMismatch {
                context: "RHS assembly",
                expected: self.rows.len(),
                actual: previous.len(),
            });
        }
        let apply = |terms: &[(usize, f64)]| terms.iter().map(|&(j, c)| c * previous[j]).sum::<f64>();
        let mut rhs = DVector::zeros(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            rhs[i] = apply(&row.history) + row.source;
            if step == 0 {
                rhs[i] += apply(&row.start) + row.start_source;
            }
        }
        Ok(rhs)
    }
}
