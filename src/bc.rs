//! Boundary Condition Module
//!
//! This module handles the boundary description of the rectangular domain:
//! - Side and condition-kind enumerations (integer codes 1 / 0 / −1)
//! - The 4×K type/value table, sides ordered north, west, south, east
//! - Patches overriding the table on part of a side (strip loads, drained spans)
//!
//! Operator and RHS assembly both read conditions through
//! [`BoundaryConditions::condition`], so patches act identically on both.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PoroError, Result};
use crate::mesh::Quantity;

/// Side of the bounding rectangle, in boundary-table row order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    West,
    South,
    East,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::West, Side::South, Side::East];

    /// Row of the boundary table
    pub fn row(self) -> usize {
        match self {
            Side::North => 0,
            Side::West => 1,
            Side::South => 2,
            Side::East => 3,
        }
    }

    /// Outward unit normal (nx, ny)
    pub fn normal(self) -> (f64, f64) {
        match self {
            Side::North => (0.0, 1.0),
            Side::West => (-1.0, 0.0),
            Side::South => (0.0, -1.0),
            Side::East => (1.0, 0.0),
        }
    }

    /// Logical (row, column) step towards this side
    pub fn offset(self) -> (isize, isize) {
        match self {
            Side::North => (1, 0),
            Side::West => (0, -1),
            Side::South => (-1, 0),
            Side::East => (0, 1),
        }
    }

    /// Sign of the outward normal along its axis
    pub fn sign(self) -> f64 {
        match self {
            Side::North | Side::East => 1.0,
            Side::West | Side::South => -1.0,
        }
    }

    /// North/south sides are normal to y
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::North | Side::South)
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::West => Side::East,
            Side::South => Side::North,
            Side::East => Side::West,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::North => "north",
            Side::West => "west",
            Side::South => "south",
            Side::East => "east",
        };
        f.write_str(name)
    }
}

/// Boundary condition types
///
/// Value meanings:
/// - `Dirichlet`: value of the quantity
/// - `Neumann`: outward normal derivative of the quantity
/// - `Stress`: traction component (σ·n) for displacements, outward Darcy flux
///   for pressures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Dirichlet,
    Neumann,
    Stress,
}

impl BoundaryKind {
    /// Parse the integer code used in boundary tables
    ///
    /// # Returns
    /// `1 → Dirichlet`, `0 → Neumann`, `−1 → Stress`, anything else a `Config` error
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(BoundaryKind::Dirichlet),
            0 => Ok(BoundaryKind::Neumann),
            -1 => Ok(BoundaryKind::Stress),
            other => Err(PoroError::config(format!(
                "unknown boundary type code {} (expected 1, 0 or -1)",
                other
            ))),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            BoundaryKind::Dirichlet => 1,
            BoundaryKind::Neumann => 0,
            BoundaryKind::Stress => -1,
        }
    }
}

/// Kind and value of the condition at one boundary location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub kind: BoundaryKind,
    pub value: f64,
}

/// Per-side, per-quantity condition table (4 × K)
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryTable {
    kinds: Vec<Vec<BoundaryKind>>,
    values: Vec<Vec<f64>>,
}

impl BoundaryTable {
    /// Build from integer type codes and a value table of the same shape
    ///
    /// # Arguments
    /// * `codes` - 4 rows (north, west, south, east) of K type codes
    /// * `values` - 4 rows of K prescribed values
    ///
    /// # Errors
    /// `Config` on wrong row count, K outside {3, 4}, shape mismatch between the
    /// tables, unknown codes or non-finite values.
    pub fn from_codes(codes: &[Vec<i32>], values: &[Vec<f64>]) -> Result<Self> {
        if codes.len() != 4 || values.len() != 4 {
            return Err(PoroError::config(format!(
                "boundary tables need 4 rows (north, west, south, east), got {} types and {} values",
                codes.len(),
                values.len()
            )));
        }
        let k = codes[0].len();
        if !(3..=4).contains(&k) {
            return Err(PoroError::config(format!(
                "boundary tables need 3 or 4 columns (u, v, p[, p_macro]), got {}",
                k
            )));
        }

        let mut kinds = Vec::with_capacity(4);
        for (side, (code_row, value_row)) in Side::ALL.iter().zip(codes.iter().zip(values)) {
            if code_row.len() != k || value_row.len() != k {
                return Err(PoroError::config(format!(
                    "{} boundary row has {} types and {} values, expected {}",
                    side,
                    code_row.len(),
                    value_row.len(),
                    k
                )));
            }
            if value_row.iter().any(|v| !v.is_finite()) {
                return Err(PoroError::config(format!("{} boundary row has non-finite values", side)));
            }
            let row = code_row
                .iter()
                .map(|&c| BoundaryKind::from_code(c))
                .collect::<Result<Vec<_>>>()?;
            kinds.push(row);
        }

        Ok(Self {
            kinds,
            values: values.to_vec(),
        })
    }

    /// Same condition on every side for every quantity
    pub fn uniform(kind: BoundaryKind, value: f64, quantities: usize) -> Self {
        Self {
            kinds: vec![vec![kind; quantities]; 4],
            values: vec![vec![value; quantities]; 4],
        }
    }

    /// Number of quantity columns K
    pub fn quantity_count(&self) -> usize {
        self.kinds[0].len()
    }

    pub fn get(&self, side: Side, quantity: Quantity) -> Option<Condition> {
        let col = quantity.column();
        (col < self.quantity_count()).then(|| Condition {
            kind: self.kinds[side.row()][col],
            value: self.values[side.row()][col],
        })
    }
}

/// Override of the table on part of one side
///
/// `from`/`to` are physical coordinates along the side (x for north/south,
/// y for west/east), both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundaryPatch {
    pub side: Side,
    pub quantity: Quantity,
    pub from: f64,
    pub to: f64,
    pub kind: BoundaryKind,
    pub value: f64,
}

impl BoundaryPatch {
    fn covers(&self, side: Side, quantity: Quantity, s: f64) -> bool {
        let scale = [self.from, self.to]
            .iter()
            .filter(|v| v.is_finite())
            .fold(1.0_f64, |m, v| m.max(v.abs()));
        let eps = 1e-9 * scale;
        self.side == side && self.quantity == quantity && s >= self.from - eps && s <= self.to + eps
    }
}

/// Base table plus ordered patches; later patches win
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConditions {
    table: BoundaryTable,
    patches: Vec<BoundaryPatch>,
}

impl BoundaryConditions {
    pub fn new(table: BoundaryTable) -> Self {
        Self {
            table,
            patches: Vec::new(),
        }
    }

    pub fn with_patch(mut self, patch: BoundaryPatch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Strip footing on the north side
    ///
    /// On x ∈ [0, width] the vertical traction equals `load` and every pressure
    /// is sealed; the rest of the north side is drained (pressure Dirichlet 0).
    pub fn with_strip_load(mut self, width: f64, load: f64) -> Self {
        let pressures = [Quantity::P, Quantity::PMacro];
        let count = self.table.quantity_count().saturating_sub(2);
        self.patches.push(BoundaryPatch {
            side: Side::North,
            quantity: Quantity::V,
            from: 0.0,
            to: width,
            kind: BoundaryKind::Stress,
            value: load,
        });
        for &q in pressures.iter().take(count) {
            self.patches.push(BoundaryPatch {
                side: Side::North,
                quantity: q,
                from: width,
                to: f64::INFINITY,
                kind: BoundaryKind::Dirichlet,
                value: 0.0,
            });
            self.patches.push(BoundaryPatch {
                side: Side::North,
                quantity: q,
                from: 0.0,
                to: width,
                kind: BoundaryKind::Stress,
                value: 0.0,
            });
        }
        self
    }

    pub fn table(&self) -> &BoundaryTable {
        &self.table
    }

    pub fn patches(&self) -> &[BoundaryPatch] {
        &self.patches
    }

    /// Check the conditions against the number of quantities of the run
    pub fn validate(&self, quantities: usize) -> Result<()> {
        if self.table.quantity_count() != quantities {
            return Err(PoroError::config(format!(
                "boundary table has {} quantity columns but the run solves for {}",
                self.table.quantity_count(),
                quantities
            )));
        }
        for patch in &self.patches {
            if patch.quantity.column() >= quantities {
                return Err(PoroError::config(format!(
                    "boundary patch on {} targets '{}' which is not solved for",
                    patch.side, patch.quantity
                )));
            }
            if !(patch.from <= patch.to) || !patch.value.is_finite() {
                return Err(PoroError::config(format!(
                    "boundary patch on {} has an invalid span [{}, {}] or value {}",
                    patch.side, patch.from, patch.to, patch.value
                )));
            }
        }
        Ok(())
    }

    /// Condition applying to `quantity` at coordinate `s` along `side`
    ///
    /// # Errors
    /// `Config` if the quantity has no column in the table.
    pub fn condition(&self, side: Side, quantity: Quantity, s: f64) -> Result<Condition> {
        if let Some(patch) = self.patches.iter().rev().find(|p| p.covers(side, quantity, s)) {
            return Ok(Condition {
                kind: patch.kind,
                value: patch.value,
            });
        }
        self.table.get(side, quantity).ok_or_else(|| {
            PoroError::config(format!("no boundary condition for '{}' on {}", quantity, side))
        })
    }
}
