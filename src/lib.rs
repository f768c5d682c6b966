pub mod error;
pub mod mesh;
pub mod mechanics;
pub mod bc;     // Boundary conditions
pub mod fvm;
pub mod linalg;
pub mod config;

pub use error::{PoroError, Result};
pub use mesh::{Arrangement, FaceStatus, FieldSet, IndexMap, Mesh, MeshBuilder, Polygon, Quantity};
pub use mechanics::{Coefficients, DualPorosity, PoroelasticProperties, PorosityModel};
pub use bc::{BoundaryConditions, BoundaryKind, BoundaryPatch, BoundaryTable, Condition, Side};
pub use fvm::{Discretization, InterpolationScheme, Operator, OperatorAssembler, Problem, RhsAssembler, SystemLayout, TimeStepStats, TimeStepper};
pub use linalg::{DirectSolver, SolverPhase, SolverStats};
pub use config::RunConfig;
