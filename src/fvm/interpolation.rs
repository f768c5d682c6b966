//! Arrangement × scheme selection and collocated face interpolation
//!
//! The pair is parsed once into [`Discretization`]; invalid combinations are
//! configuration errors raised before any assembly work. Face interpolation is
//! a trait so collocated schemes can be swapped without touching the stencils.

use std::fmt;

use super::form::LinearForm;
use super::problem::Problem;
use crate::bc::Side;
use crate::error::{PoroError, Result};
use crate::mesh::{Arrangement, Quantity};

/// Face-value interpolation for the collocated arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationScheme {
    /// Arithmetic mean of the two adjoining cell values
    Centered,
    /// Mean corrected by a pressure-gradient difference (Rhie–Chow type)
    Stabilized,
}

impl InterpolationScheme {
    /// Strategy object for this scheme
    pub fn interpolator(self) -> &'static dyn FaceInterpolation {
        match self {
            InterpolationScheme::Centered => &Centered,
            InterpolationScheme::Stabilized => &Stabilized,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InterpolationScheme::Centered => "centered",
            InterpolationScheme::Stabilized => "stabilized",
        }
    }
}

/// Closed set of supported arrangement/scheme pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discretization {
    Staggered,
    Collocated(InterpolationScheme),
}

impl Discretization {
    /// Parse the arrangement and scheme strings
    ///
    /// # Errors
    /// `Config` for unknown names, a scheme under the staggered arrangement,
    /// or `none` under the collocated arrangement.
    pub fn parse(arrangement: &str, scheme: &str) -> Result<Self> {
        let arrangement: Arrangement = arrangement.parse()?;
        let scheme = match scheme.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "exact" => None,
            "centered" | "centred" | "cds" | "linear" => Some(InterpolationScheme::Centered),
            "stabilized" | "stabilised" | "rhie-chow" | "rhie_chow" => {
                Some(InterpolationScheme::Stabilized)
            }
            other => {
                return Err(PoroError::config(format!(
                    "unknown interpolation scheme '{}' (expected none, centered or stabilized)",
                    other
                )))
            }
        };

        match (arrangement, scheme) {
            (Arrangement::Staggered, None) => Ok(Discretization::Staggered),
            (Arrangement::Collocated, Some(s)) => Ok(Discretization::Collocated(s)),
            (Arrangement::Staggered, Some(s)) => Err(PoroError::config(format!(
                "interpolation scheme '{}' is not defined for the staggered arrangement (use none)",
                s.name()
            ))),
            (Arrangement::Collocated, None) => Err(PoroError::config(
                "the collocated arrangement needs an interpolation scheme (centered or stabilized)",
            )),
        }
    }

    pub fn arrangement(self) -> Arrangement {
        match self {
            Discretization::Staggered => Arrangement::Staggered,
            Discretization::Collocated(_) => Arrangement::Collocated,
        }
    }
}

impl fmt::Display for Discretization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discretization::Staggered => f.write_str("staggered"),
            Discretization::Collocated(s) => write!(f, "collocated/{}", s.name()),
        }
    }
}

/// Normal displacement on an internal face of the collocated grid
pub trait FaceInterpolation: Sync {
    /// Displacement component normal to the face between cell (row, col) and
    /// its neighbour across `side`; both cells are active.
    fn normal_displacement(&self, problem: &Problem, row: usize, col: usize, side: Side)
        -> Result<LinearForm>;
}

/// Component of displacement normal to a side
pub(crate) fn normal_component(side: Side) -> Quantity {
    if side.is_horizontal() {
        Quantity::V
    } else {
        Quantity::U
    }
}

pub struct Centered;

impl FaceInterpolation for Centered {
    fn normal_displacement(
        &self,
        problem: &Problem,
        row: usize,
        col: usize,
        side: Side,
    ) -> Result<LinearForm> {
        let q = normal_component(side);
        let (dr, dc) = side.offset();
        let own = problem.require(q, row, col, 0, 0)?;
        let nb = problem.require(q, row, col, dr, dc)?;
        let mut form = LinearForm::var(own, 0.5);
        form.add_var(nb, 0.5);
        Ok(form)
    }
}

/// Mean face value minus d·(g_f − ḡ_f)
///
/// g_f is the compact pressure gradient across the face, ḡ_f the mean of the
/// central gradients of the two cells, and d = α_k Δ² / (4M) per pressure.
/// Falls back to the plain mean unless both cells have neighbours on both
/// sides along the face normal.
pub struct Stabilized;

impl FaceInterpolation for Stabilized {
    fn normal_displacement(
        &self,
        problem: &Problem,
        row: usize,
        col: usize,
        side: Side,
    ) -> Result<LinearForm> {
        let mut form = Centered.normal_displacement(problem, row, col, side)?;

        // Order the two cells along the axis: lo has the smaller coordinate
        let (dr, dc) = side.offset();
        let (ar, ac) = (dr.abs(), dc.abs());
        let nb = shifted((row, col), dr, dc).ok_or_else(|| {
            PoroError::IndexMap(format!("cell ({}, {}) has no {} neighbour", row, col, side))
        })?;
        let (lo, hi) = if side.sign() > 0.0 {
            ((row, col), nb)
        } else {
            (nb, (row, col))
        };
        let (Some(lo_out), Some(hi_out)) = (shifted(lo, -ar, -ac), shifted(hi, ar, ac)) else {
            return Ok(form);
        };

        let delta = if side.is_horizontal() {
            problem.mesh.dy
        } else {
            problem.mesh.dx
        };
        let modulus = problem.coefficients.longitudinal_modulus();
        let weights = problem.porosity.biot_weights(&problem.coefficients);

        for (slot, &pq) in problem.pressures().iter().enumerate() {
            let cells = [
                problem.global(pq, lo.0, lo.1),
                problem.global(pq, hi.0, hi.1),
                problem.global(pq, lo_out.0, lo_out.1),
                problem.global(pq, hi_out.0, hi_out.1),
            ];
            let [Some(p_lo), Some(p_hi), Some(p_lo_out), Some(p_hi_out)] = cells else {
                return Ok(form);
            };

            // g_f − ḡ_f = [0.75 (p_hi − p_lo) + 0.25 (p_lo_out − p_hi_out)] / Δ
            let d = weights[slot] * delta * delta / (4.0 * modulus);
            let s = -d / delta;
            form.add_var(p_hi, 0.75 * s)
                .add_var(p_lo, -0.75 * s)
                .add_var(p_lo_out, 0.25 * s)
                .add_var(p_hi_out, -0.25 * s);
        }
        Ok(form)
    }
}

fn shifted(cell: (usize, usize), dr: isize, dc: isize) -> Option<(usize, usize)> {
    Some((cell.0.checked_add_signed(dr)?, cell.1.checked_add_signed(dc)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_pairs() {
        assert_eq!(
            Discretization::parse("staggered", "none").unwrap(),
            Discretization::Staggered
        );
        assert_eq!(
            Discretization::parse("Collocated", "centered").unwrap(),
            Discretization::Collocated(InterpolationScheme::Centered)
        );
        assert_eq!(
            Discretization::parse("collocated", "stabilized").unwrap(),
            Discretization::Collocated(InterpolationScheme::Stabilized)
        );
    }

    #[test]
    fn test_parse_rejects_undefined_pairs() {
        assert!(matches!(
            Discretization::parse("staggered", "centered"),
            Err(PoroError::Config(_))
        ));
        assert!(matches!(
            Discretization::parse("collocated", "none"),
            Err(PoroError::Config(_))
        ));
        assert!(Discretization::parse("hexagonal", "none").is_err());
        assert!(Discretization::parse("collocated", "quadratic").is_err());
    }

    #[test]
    fn test_display_names_scheme() {
        let d = Discretization::Collocated(InterpolationScheme::Stabilized);
        assert_eq!(d.to_string(), "collocated/stabilized");
        assert_eq!(d.arrangement(), Arrangement::Collocated);
    }
}
