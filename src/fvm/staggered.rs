//! Stencils of the staggered arrangement
//!
//! Pressure lives at cell centres, u on vertical faces and v on horizontal
//! faces. Displacement control volumes are centred on their face; normal
//! stresses are evaluated at the adjoining cell centres and shear stresses at
//! the cell corners, so no interpolation is needed.

use super::flow::{face_point, mass_row};
use super::form::{LinearForm, Row, RowBuilder};
use super::problem::Problem;
use crate::bc::{BoundaryKind, Side};
use crate::error::Result;
use crate::mesh::{FaceStatus, Quantity};

pub(crate) fn rows(problem: &Problem) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(problem.layout().total());
    for q in problem.layout().quantities() {
        let map = problem.mesh.map(q);
        for &(r, c) in map.coordinates() {
            let row = match q.pressure_slot() {
                // Boundary faces are unknowns here, so the initial level needs no correction
                Some(slot) => {
                    let div = divergence(problem, r, c)?;
                    mass_row(problem, slot, r, c, &div, &LinearForm::new())?
                }
                None => momentum_row(problem, q, r, c)?,
            };
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Sides whose normal is parallel to the displacement component
fn low_high(comp: Quantity) -> (Side, Side) {
    match comp {
        Quantity::U => (Side::West, Side::East),
        _ => (Side::South, Side::North),
    }
}

fn other(comp: Quantity) -> Quantity {
    match comp {
        Quantity::U => Quantity::V,
        _ => Quantity::U,
    }
}

/// Offset from a cell to its face on `side` in the face-based index maps
fn face_offset(side: Side) -> (isize, isize) {
    if side.sign() > 0.0 {
        side.offset()
    } else {
        (0, 0)
    }
}

/// Spacing along the component's own axis
fn own_spacing(problem: &Problem, comp: Quantity) -> f64 {
    match comp {
        Quantity::U => problem.mesh.dx,
        _ => problem.mesh.dy,
    }
}

/// ∂comp/∂(own axis) at the centre of cell (r, c)
fn cell_strain(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<LinearForm> {
    let (_, high) = low_high(comp);
    let (dr, dc) = face_offset(high);
    let lo = problem.require(comp, r, c, 0, 0)?;
    let hi = problem.require(comp, r, c, dr, dc)?;
    let h = own_spacing(problem, comp);
    let mut form = LinearForm::var(hi, 1.0 / h);
    form.add_var(lo, -1.0 / h);
    Ok(form)
}

/// Total normal stress along the component's axis at the centre of cell (r, c)
fn normal_stress(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<LinearForm> {
    let coefficients = &problem.coefficients;
    let mut sigma = cell_strain(problem, comp, r, c)?.scaled(coefficients.longitudinal_modulus());
    sigma.add(&cell_strain(problem, other(comp), r, c)?, coefficients.lame);
    let weights = problem.porosity.biot_weights(coefficients);
    for (slot, &pq) in problem.pressures().iter().enumerate() {
        sigma.add_var(problem.require(pq, r, c, 0, 0)?, -weights[slot]);
    }
    Ok(sigma)
}

/// Σ_f u_n A over the faces of cell (r, c)
fn divergence(problem: &Problem, r: usize, c: usize) -> Result<LinearForm> {
    let mut div = LinearForm::new();
    for side in Side::ALL {
        let comp = if side.is_horizontal() { Quantity::V } else { Quantity::U };
        let (dr, dc) = face_offset(side);
        let (area, _) = problem.face_geometry(side);
        div.add_var(problem.require(comp, r, c, dr, dc)?, side.sign() * area);
    }
    Ok(div)
}

fn momentum_row(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<Row> {
    let status = match comp {
        Quantity::U => problem.mesh.vertical_face(r, c),
        _ => problem.mesh.horizontal_face(r, c),
    };
    let mut builder = RowBuilder::new();
    match status {
        FaceStatus::Boundary => builder.implicit(&boundary_form(problem, comp, r, c)?, 1.0),
        _ => builder.implicit(&interior_form(problem, comp, r, c)?, 1.0),
    };
    Ok(builder.finish())
}

/// Equation replacing momentum on a face lying on the domain boundary
fn boundary_form(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<LinearForm> {
    let (low, high) = low_high(comp);
    // The active cell is on the high side of the face when the face is a low-side boundary
    let side = if problem.mesh.cell_active(r, c) { low } else { high };
    let (ir, ic) = if side == low {
        (r, c)
    } else {
        let (dr, dc) = low.offset();
        (r.wrapping_add_signed(dr), c.wrapping_add_signed(dc))
    };

    let own = problem.require(comp, r, c, 0, 0)?;
    let at = problem.mesh.position(comp, r, c);
    let condition = problem.condition(side, comp, at)?;
    let (area, spacing) = problem.face_geometry(side);

    let mut form = LinearForm::new();
    match condition.kind {
        BoundaryKind::Dirichlet => {
            form.add_var(own, 1.0).add_constant(-condition.value);
        }
        BoundaryKind::Neumann => {
            let (dr, dc) = side.opposite().offset();
            let inner = problem.require(comp, r, c, dr, dc)?;
            form.add_var(own, 1.0)
                .add_var(inner, -1.0)
                .add_constant(-condition.value * spacing);
        }
        BoundaryKind::Stress => {
            // Traction balanced at the adjoining cell centre, half a cell inside
            let gravity = match comp {
                Quantity::V => {
                    0.5 * problem.coefficients.bulk_density * problem.coefficients.gravity * spacing
                }
                _ => 0.0,
            };
            form.add(&normal_stress(problem, comp, ir, ic)?, side.sign() * area)
                .add_constant(-(condition.value - gravity) * area);
        }
    }
    Ok(form)
}

/// −Σ_f (σ·n)_comp A (+ ρ g V for v) over the face-centred control volume
fn interior_form(problem: &Problem, comp: Quantity, r: usize, c: usize) -> Result<LinearForm> {
    let coefficients = &problem.coefficients;
    let (low, high) = low_high(comp);
    let own = problem.require(comp, r, c, 0, 0)?;
    let mut traction = LinearForm::new();

    // Normal faces pass through the centres of the two adjoining cells
    let (lr, lc) = low.offset();
    let (area, _) = problem.face_geometry(high);
    traction.add(&normal_stress(problem, comp, r, c)?, area);
    traction.add(
        &normal_stress(problem, comp, r.wrapping_add_signed(lr), c.wrapping_add_signed(lc))?,
        -area,
    );

    // Tangential faces pass through cell corners
    let oc = other(comp);
    let (own_r, own_c) = low.offset();
    for side in Side::ALL {
        if side == low || side == high {
            continue;
        }
        let (area, spacing) = problem.face_geometry(side);
        let n = side.sign();

        let (cr, cc) = face_offset(side);
        let corner_hi = problem.require(oc, r, c, cr, cc)?;
        let corner_lo = problem.require(oc, r, c, cr + own_r, cc + own_c)?;
        let mut cross = LinearForm::var(corner_hi, 1.0 / own_spacing(problem, comp));
        cross.add_var(corner_lo, -1.0 / own_spacing(problem, comp));

        let (dr, dc) = side.offset();
        let g = coefficients.shear_modulus;
        match problem.neighbour(comp, r, c, dr, dc) {
            Some(nb) => {
                let mut shear = LinearForm::var(nb, 1.0 / spacing);
                shear.add_var(own, -1.0 / spacing).add(&cross, n);
                traction.add(&shear, g * area);
            }
            None => {
                let at = face_point(problem.mesh.position(comp, r, c), side, spacing);
                let condition = problem.condition(side, comp, at)?;
                match condition.kind {
                    BoundaryKind::Dirichlet => {
                        let t = 2.0 / spacing;
                        let mut shear = LinearForm::var(own, -t);
                        shear.add_constant(t * condition.value).add(&cross, n);
                        traction.add(&shear, g * area);
                    }
                    BoundaryKind::Neumann => {
                        let mut shear = cross.scaled(n);
                        shear.add_constant(condition.value);
                        traction.add(&shear, g * area);
                    }
                    BoundaryKind::Stress => {
                        traction.add_constant(condition.value * area);
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
    Ok(form)
}
