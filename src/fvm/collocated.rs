//! Stencils of the collocated arrangement
//!
//! All unknowns live at cell centres. Normal derivatives across a face are
//! compact two-point differences; tangential derivatives and face pressures
//! come from averaging Green–Gauss cell gradients and cell values. The normal
//! displacement entering the mass balance is delegated to the
//! [`FaceInterpolation`] scheme.

use super::flow::{face_point, mass_row};
use super::form::{LinearForm, Row, RowBuilder};
use super::interpolation::{normal_component, FaceInterpolation};
use super::problem::Problem;
use crate::bc::{BoundaryKind, Side};
use crate::error::Result;
use crate::mesh::Quantity;

pub(crate) fn rows(problem: &Problem, scheme: &dyn FaceInterpolation) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(problem.layout().total());
    for q in problem.layout().quantities() {
        for &(r, c) in problem.mesh.map(q).coordinates() {
            let row = match q.pressure_slot() {
                Some(slot) => {
                    let (div, start) = divergence(problem, scheme, r, c)?;
                    mass_row(problem, slot, r, c, &div, &start)?
                }
                None => momentum_row(problem, q, r, c)?,
            };
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Value of `q` on the face of cell (r, c) towards `side`
///
/// Internal faces take the mean of the two cells. Boundary faces take the
/// Dirichlet value, extrapolate with the prescribed Neumann gradient, or (for
/// traction/flux conditions) extrapolate linearly for displacements and keep
/// the cell value for pressures.
fn face_value(problem: &Problem, q: Quantity, r: usize, c: usize, side: Side) -> Result<LinearForm> {
    let own = problem.require(q, r, c, 0, 0)?;
    let (dr, dc) = side.offset();
    if let Some(nb) = problem.neighbour(q, r, c, dr, dc) {
        let mut form = LinearForm::var(own, 0.5);
        form.add_var(nb, 0.5);
        return Ok(form);
    }

    let (_, spacing) = problem.face_geometry(side);
    let at = face_point(problem.mesh.position(q, r, c), side, spacing);
    let condition = problem.condition(side, q, at)?;
    let form = match condition.kind {
        BoundaryKind::Dirichlet => LinearForm::from_constant(condition.value),
        BoundaryKind::Neumann => {
            let mut form = LinearForm::var(own, 1.0);
            form.add_constant(0.5 * spacing * condition.value);
            form
        }
        BoundaryKind::Stress if q.pressure_slot().is_none() => extrapolated(problem, q, r, c, side)?,
        BoundaryKind::Stress => LinearForm::var(own, 1.0),
    };
    Ok(form)
}

/// Linear extrapolation of `q` from cell (r, c) and its inner neighbour to the
/// face on `side`; the cell value alone when there is no inner neighbour
fn extrapolated(problem: &Problem, q: Quantity, r: usize, c: usize, side: Side) -> Result<LinearForm> {
    let own = problem.require(q, r, c, 0, 0)?;
    let (dr, dc) = side.opposite().offset();
    Ok(match problem.neighbour(q, r, c, dr, dc) {
        Some(inner) => {
            let mut form = LinearForm::var(own, 1.5);
            form.add_var(inner, -0.5);
            form
        }
        None => LinearForm::var(own, 1.0),
    })
}

/// Green–Gauss gradient component of `q` in cell (r, c)
fn gradient(problem: &Problem, q: Quantity, r: usize, c: usize, along_x: bool) -> Result<LinearForm> {
    let (lo, hi, h) = if along_x {
        (Side::West, Side::East, problem.mesh.dx)
    } else {
        (Side::South, Side::North, problem.mesh.dy)
    };
    Ok(LinearForm::difference(
        &face_value(problem, q, r, c, hi)?,
        &face_value(problem, q, r, c, lo)?,
        1.0 / h,
    ))
}

/// Σ_k α_k p_k on a face
fn pressure_face(problem: &Problem, r: usize, c: usize, side: Side) -> Result<LinearForm> {
    let weights = problem.porosity.biot_weights(&problem.coefficients);
    let mut form = LinearForm::new();
    for (slot, &pq) in problem.pressures().iter().enumerate() {
        form.add(&face_value(problem, pq, r, c, side)?, weights[slot]);
    }
    Ok(form)
}

/// Σ_f u_n A over the faces of cell (r, c), and its first-step correction
///
/// A Dirichlet face holds the prescribed constant at every level after the
/// first. At the initial level it holds whatever the initial fields imply, taken
/// as the extrapolation from the adjoining cells, so the correction is
/// Σ (extrapolated − prescribed) A over those faces.
fn divergence(
    problem: &Problem,
    scheme: &dyn FaceInterpolation,
    r: usize,
    c: usize,
) -> Result<(LinearForm, LinearForm)> {
    let mut div = LinearForm::new();
    let mut start = LinearForm::new();
    for side in Side::ALL {
        let comp = normal_component(side);
        let (dr, dc) = side.offset();
        let (area, spacing) = problem.face_geometry(side);
        let un = match problem.neighbour(comp, r, c, dr, dc) {
            Some(_) => scheme.normal_displacement(problem, r, c, side)?,
            None => {
                let at = face_point(problem.mesh.position(comp, r, c), side, spacing);
                let condition = problem.condition(side, comp, at)?;
                if condition.kind == BoundaryKind::Dirichlet {
                    let mut initial = extrapolated(problem, comp, r, c, side)?;
                    initial.add_constant(-condition.value);
                    start.add(&initial, side.sign() * area);
                }
                face_value(problem, comp, r, c, side)?
            }
        };
        div.add(&un, side.sign() * area);
    }
    Ok((div, start))
}

fn momentum_row(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<Row> {
    let coefficients = &problem.coefficients;
    let own_x = comp == Quantity::U;
    let oc = if own_x { Quantity::V } else { Quantity::U };
    let own = problem.require(comp, r, c, 0, 0)?;

    let mut traction = LinearForm::new();
    for side in Side::ALL {
        let (area, spacing) = problem.face_geometry(side);
        let n = side.sign();
        let (dr, dc) = side.offset();
        let normal_face = side.is_horizontal() != own_x;

        // Derivative of the other component entering this face's stress:
        // transverse for normal stress (∂v/∂y in σ_xx), own axis for shear (∂v/∂x in σ_xy)
        let cross_along_x = if normal_face { !own_x } else { own_x };
        let mut cross = gradient(problem, oc, r, c, cross_along_x)?;
        let nb = problem.neighbour(comp, r, c, dr, dc);
        if nb.is_some() {
            let (nr, nc) = (r.wrapping_add_signed(dr), c.wrapping_add_signed(dc));
            cross = cross.scaled(0.5);
            cross.add(&gradient(problem, oc, nr, nc, cross_along_x)?, 0.5);
        }

        let (stiffness, mut coupling) = if normal_face {
            let mut coupling = cross.scaled(coefficients.lame);
            coupling.add(&pressure_face(problem, r, c, side)?, -1.0);
            (coefficients.longitudinal_modulus(), coupling)
        } else {
            (coefficients.shear_modulus, cross.scaled(coefficients.shear_modulus))
        };
        coupling = coupling.scaled(n);

        match nb {
            Some(nb) => {
                let mut stress = LinearForm::var(nb, stiffness / spacing);
                stress.add_var(own, -stiffness / spacing).add(&coupling, 1.0);
                traction.add(&stress, area);
            }
            None => {
                let at = face_point(problem.mesh.position(comp, r, c), side, spacing);
                let condition = problem.condition(side, comp, at)?;
                match condition.kind {
                    BoundaryKind::Stress => {
                        traction.add_constant(condition.value * area);
                    }
                    BoundaryKind::Dirichlet => {
                        let t = 2.0 * stiffness / spacing;
                        let mut stress = LinearForm::var(own, -t);
                        stress.add_constant(t * condition.value).add(&coupling, 1.0);
                        traction.add(&stress, area);
                    }
                    BoundaryKind::Neumann => {
                        let mut stress = coupling.clone();
                        stress.add_constant(stiffness * condition.value);
                        traction.add(&stress, area);
                    }
                }
            }
        }
    }

    let mut form = traction.scaled(-1.0);
    if comp == Quantity::V {
        let volume = problem.mesh.dx * problem.mesh.dy;
        form.add_constant(coefficients.bulk_density * coefficients.gravity * volume);
    }
    let mut builder = RowBuilder::new();
    builder.implicit(&form, 1.0);
    Ok(builder.finish())
}
