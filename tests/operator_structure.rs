use poro_fvm::{
    Arrangement, BoundaryConditions, BoundaryKind, BoundaryTable, Coefficients, Discretization,
    DualPorosity, InterpolationScheme, MeshBuilder, OperatorAssembler, PoroelasticProperties,
    PorosityModel, Problem, Quantity, RhsAssembler,
};

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
        macro_permeability: Some(3.0),
    }
}

/// Mixed boundary table exercising every kind: 1 Dirichlet, 0 Neumann, -1 stress/flux
fn mixed_table(pressures: usize) -> BoundaryTable {
    let base = [[-1, -1, 1], [1, 0, -1], [1, 1, 0], [1, -1, -1]];
    let codes: Vec<Vec<i32>> = base
        .iter()
        .map(|row| {
            let mut row = row.to_vec();
            if pressures == 2 {
                row.push(row[2]);
            }
            row
        })
        .collect();
    let values = vec![vec![0.0; 2 + pressures]; 4];
    BoundaryTable::from_codes(&codes, &values).unwrap()
}

fn problem(discretization: Discretization, polygon: bool, model: PorosityModel) -> Problem {
    let mut builder = MeshBuilder::new(5, 4, 5.0, 4.0)
        .time(3, 1.0)
        .arrangement(discretization.arrangement());
    if polygon {
        builder = builder.polygon(vec![(0.0, 0.0), (5.0, 0.0), (5.0, 2.5), (2.5, 4.0), (0.0, 4.0)]);
    }
    let mesh = builder.build().unwrap();
    let conditions = BoundaryConditions::new(mixed_table(model.pressure_count()));
    let coefficients = Coefficients::from_properties(&rock(), 1.0).unwrap();
    Problem::new(mesh, discretization, conditions, coefficients, model).unwrap()
}

fn all_discretizations() -> [Discretization; 3] {
    [
        Discretization::Staggered,
        Discretization::Collocated(InterpolationScheme::Centered),
        Discretization::Collocated(InterpolationScheme::Stabilized),
    ]
}

#[test]
fn test_triplets_reproduce_dense_form() {
    for discretization in all_discretizations() {
        for polygon in [false, true] {
            let problem = problem(discretization, polygon, PorosityModel::Single);
            let operator = OperatorAssembler::assemble(&problem).unwrap();
            assert_eq!(&operator.densify(), operator.dense(), "{}", discretization);

            // Zeros are elided and (row, column) pairs are unique
            let triplets = operator.triplets();
            assert!(triplets.iter().all(|&(_, _, v)| v != 0.0));
            let mut keys: Vec<_> = triplets.iter().map(|&(i, j, _)| (i, j)).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), triplets.len());
            assert_eq!(operator.nnz(), triplets.len());
        }
    }
}

#[test]
fn test_row_count_is_sum_of_active_counts() {
    for discretization in all_discretizations() {
        for polygon in [false, true] {
            let problem = problem(discretization, polygon, PorosityModel::Single);
            let mesh = &problem.mesh;
            let expected = mesh.active_count(Quantity::U)
                + mesh.active_count(Quantity::V)
                + mesh.active_count(Quantity::P);

            let operator = OperatorAssembler::assemble(&problem).unwrap();
            assert_eq!(operator.dim(), expected);
            assert_eq!(problem.layout().total(), expected);

            // Every row is an equation and no column lies outside the unknowns
            let dense = operator.dense();
            for i in 0..expected {
                assert!(dense.row(i).iter().any(|&v| v != 0.0), "empty row {}", i);
            }
            assert!(operator.triplets().iter().all(|&(_, j, _)| j < expected));
        }
    }
}

#[test]
fn test_block_order_follows_quantities() {
    let problem = problem(Discretization::Staggered, true, PorosityModel::Single);
    let layout = problem.layout();
    let mesh = &problem.mesh;
    let nu = mesh.active_count(Quantity::U);
    let nv = mesh.active_count(Quantity::V);
    let np = mesh.active_count(Quantity::P);

    assert_eq!(layout.block(Quantity::U), Some(0..nu));
    assert_eq!(layout.block(Quantity::V), Some(nu..nu + nv));
    assert_eq!(layout.block(Quantity::P), Some(nu + nv..nu + nv + np));
    assert_eq!(layout.block(Quantity::PMacro), None);

    // The global index of a position is block offset + row-major local index
    let (r, c) = mesh.map(Quantity::V).coords(3);
    assert_eq!(problem.global(Quantity::V, r, c), Some(nu + 3));
}

#[test]
fn test_dual_porosity_adds_macro_block() {
    let dual = DualPorosity::from_properties(&rock(), 1.0).unwrap();
    for discretization in all_discretizations() {
        let problem = problem(discretization, false, PorosityModel::Double(dual));
        let np = problem.mesh.active_count(Quantity::P);
        let operator = OperatorAssembler::assemble(&problem).unwrap();
        let single = OperatorAssembler::assemble(&self::problem(
            discretization,
            false,
            PorosityModel::Single,
        ))
        .unwrap();
        assert_eq!(operator.dim(), single.dim() + np);

        // Leak term couples each pore row to the fracture pressure of the same cell
        let p = problem.layout().offset(Quantity::P).unwrap();
        let pm = problem.layout().offset(Quantity::PMacro).unwrap();
        assert!(operator.dense()[(p, pm)] < 0.0);
        assert!(operator.dense()[(pm, p)] < 0.0);
    }
}

#[test]
fn test_rhs_aligned_with_operator_rows() {
    for discretization in all_discretizations() {
        let problem = problem(discretization, true, PorosityModel::Single);
        let operator = OperatorAssembler::assemble(&problem).unwrap();
        let rhs = RhsAssembler::new(&problem)
            .unwrap()
            .assemble(&problem.mesh, &problem.zero_fields(), 0)
            .unwrap();
        assert_eq!(rhs.len(), operator.dim());
    }
}

#[test]
fn test_arrangement_mismatch_is_config_error() {
    let mesh = MeshBuilder::new(3, 3, 1.0, 1.0)
        .arrangement(Arrangement::Staggered)
        .build()
        .unwrap();
    let result = Problem::new(
        mesh,
        Discretization::Collocated(InterpolationScheme::Centered),
        BoundaryConditions::new(mixed_table(1)),
        Coefficients::from_properties(&rock(), 0.0).unwrap(),
        PorosityModel::Single,
    );
    assert!(matches!(result, Err(poro_fvm::PoroError::Config(_))));
}

#[test]
fn test_table_width_must_match_pressures() {
    let dual = DualPorosity::from_properties(&rock(), 1.0).unwrap();
    let mesh = MeshBuilder::new(3, 3, 1.0, 1.0).build().unwrap();
    let result = Problem::new(
        mesh,
        Discretization::Staggered,
        BoundaryConditions::new(BoundaryTable::uniform(BoundaryKind::Dirichlet, 0.0, 3)),
        Coefficients::from_properties(&rock(), 0.0).unwrap(),
        PorosityModel::Double(dual),
    );
    assert!(matches!(result, Err(poro_fvm::PoroError::Config(_))));
}
