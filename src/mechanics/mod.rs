pub mod poroelastic;
pub mod dual_porosity;

pub use poroelastic::{Coefficients, PoroelasticProperties};
pub use dual_porosity::{DualPorosity, PorosityModel};
