pub mod solver;
pub mod direct;

pub use solver::{Residual, SolverStats};
pub use direct::{DirectSolver, SolverPhase};
