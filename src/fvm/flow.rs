//! Mass balance of the pressure-like quantities
//!
//! Shared by both arrangements: storage, Biot coupling, two-point Darcy fluxes
//! with gravity, and the inter-porosity leak. Only the discrete divergence of
//! the displacement differs between arrangements and is passed in.

use super::form::{LinearForm, Row, RowBuilder};
use super::problem::Problem;
use crate::bc::{BoundaryKind, Side};
use crate::error::Result;

/// Point on the face of a control volume centred at `centre`
pub(crate) fn face_point(centre: (f64, f64), side: Side, spacing: f64) -> (f64, f64) {
    let (nx, ny) = side.normal();
    (centre.0 + 0.5 * spacing * nx, centre.1 + 0.5 * spacing * ny)
}

/// Backward-Euler mass balance of pressure `slot` in cell (row, col)
///
/// Integrated over the cell and the step:
/// Σ_l S_kl V Δp_l + α_k Δ(∫∇·u) + dt Σ_f q_f·n A ± dt β V (p1 − p2) = 0
///
/// # Arguments
/// * `divergence` - Σ_f u_n A over the cell faces, in terms of the unknowns
/// * `start` - Change of that sum at the initial level, for faces whose
///   previous value is a boundary constant after the first step
pub(crate) fn mass_row(
    problem: &Problem,
    slot: usize,
    row: usize,
    col: usize,
    divergence: &LinearForm,
    start: &LinearForm,
) -> Result<Row> {
    let mesh = &problem.mesh;
    let coefficients = &problem.coefficients;
    let model = &problem.porosity;
    let pressures = problem.pressures();
    let pq = pressures[slot];
    let dt = mesh.dt;
    let volume = mesh.dx * mesh.dy;
    let own = problem.require(pq, row, col, 0, 0)?;

    let mut builder = RowBuilder::new();

    for (l, &ql) in pressures.iter().enumerate() {
        let storage = model.storage(coefficients, slot, l);
        if storage != 0.0 {
            let p = LinearForm::var(problem.require(ql, row, col, 0, 0)?, 1.0);
            builder.rate(&p, storage * volume);
        }
    }

    let biot = model.biot_weights(coefficients)[slot];
    builder.rate(divergence, biot).start(start, biot);

    let mobility = model.mobility(coefficients, slot);
    let centre = mesh.position(pq, row, col);
    for side in Side::ALL {
        let (area, spacing) = problem.face_geometry(side);
        let gravity_head = coefficients.fluid_density * coefficients.gravity * side.normal().1;
        let (dr, dc) = side.offset();

        // Outward volumetric flux through the face
        let mut flux = LinearForm::new();
        match problem.neighbour(pq, row, col, dr, dc) {
            Some(nb) => {
                let t = mobility * area / spacing;
                flux.add_var(own, t)
                    .add_var(nb, -t)
                    .add_constant(-mobility * area * gravity_head);
            }
            None => {
                let condition = problem.condition(side, pq, face_point(centre, side, spacing))?;
                match condition.kind {
                    BoundaryKind::Dirichlet => {
                        let t = 2.0 * mobility * area / spacing;
                        flux.add_var(own, t)
                            .add_constant(-t * condition.value - mobility * area * gravity_head);
                    }
                    BoundaryKind::Neumann => {
                        flux.add_constant(-mobility * area * (condition.value + gravity_head));
                    }
                    BoundaryKind::Stress => {
                        flux.add_constant(condition.value * area);
                    }
                }
            }
        }
        builder.implicit(&flux, dt);
    }

    let beta = model.leak();
    if beta > 0.0 && pressures.len() == 2 {
        let sign = if slot == 0 { 1.0 } else { -1.0 };
        let mut leak = LinearForm::var(problem.require(pressures[0], row, col, 0, 0)?, 1.0);
        leak.add_var(problem.require(pressures[1], row, col, 0, 0)?, -1.0);
        builder.implicit(&leak, sign * dt * beta * volume);
    }

    Ok(builder.finish())
}
