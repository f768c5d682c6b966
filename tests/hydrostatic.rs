//! Drained column under gravity settles to hydrostatic pore pressure

use approx::assert_relative_eq;
use poro_fvm::{
    BoundaryConditions, BoundaryTable, Coefficients, Discretization, InterpolationScheme,
    MeshBuilder, PoroelasticProperties, PorosityModel, Problem, Quantity, TimeStepper,
};

const HEIGHT: f64 = 2.0;
const GRAVITY: f64 = 1.5;

fn rock() -> PoroelasticProperties {
    PoroelasticProperties {
        shear_modulus: 1.0,
        bulk_modulus: 2.0,
        solid_bulk_modulus: 10.0,
        solid_density: 2.5,
        fluid_bulk_modulus: 1.0,
        porosity: 0.2,
        permeability: 1.0,
        fluid_viscosity: 1.0,
        fluid_density: 1.2,
        macro_porosity: None,
        macro_permeability: None,
    }
}

fn column(discretization: Discretization) -> Problem {
    // dt far beyond the consolidation time H²/c
    let mesh = MeshBuilder::new(3, 8, 1.0, HEIGHT)
        .time(4, 3.0e6)
        .arrangement(discretization.arrangement())
        .build()
        .unwrap();
    // north: free surface, drained; west/east: rollers, sealed; south: fixed, sealed
    let codes = vec![
        vec![1, -1, 1],
        vec![1, -1, -1],
        vec![1, 1, -1],
        vec![1, -1, -1],
    ];
    let values = vec![vec![0.0; 3]; 4];
    let table = BoundaryTable::from_codes(&codes, &values).unwrap();
    let coefficients = Coefficients::from_properties(&rock(), GRAVITY).unwrap();
    Problem::new(
        mesh,
        discretization,
        BoundaryConditions::new(table),
        coefficients,
        PorosityModel::Single,
    )
    .unwrap()
}

fn check_hydrostatic(discretization: Discretization) {
    let problem = column(discretization);
    let fields = problem.zero_fields();
    let mut stepper = TimeStepper::new(problem, fields).unwrap();
    stepper.run(|_, _| {}).unwrap();

    let problem = stepper.problem();
    let rho_g = problem.coefficients.fluid_density * GRAVITY;
    let p = &stepper.fields().p;
    for &(r, c) in problem.mesh.map(Quantity::P).coordinates() {
        let (_, y) = problem.mesh.position(Quantity::P, r, c);
        assert_relative_eq!(
            p[(r, c)],
            rho_g * (HEIGHT - y),
            epsilon = 1e-6 * rho_g * HEIGHT
        );
    }
}

#[test]
fn test_hydrostatic_staggered() {
    check_hydrostatic(Discretization::Staggered);
}

#[test]
fn test_hydrostatic_collocated_centered() {
    check_hydrostatic(Discretization::Collocated(InterpolationScheme::Centered));
}

#[test]
fn test_hydrostatic_collocated_stabilized() {
    check_hydrostatic(Discretization::Collocated(InterpolationScheme::Stabilized));
}

#[test]
fn test_base_carries_column_weight() {
    // The settled column compresses: the top moves down
    let problem = column(Discretization::Staggered);
    let fields = problem.zero_fields();
    let mut stepper = TimeStepper::new(problem, fields).unwrap();
    stepper.run(|_, _| {}).unwrap();

    let v = &stepper.fields().v;
    let top = v.nrows() - 1;
    for c in 0..v.ncols() {
        assert!(v[(top, c)] < 0.0);
        assert_relative_eq!(v[(0, c)], 0.0, epsilon = 1e-12);
    }
}
