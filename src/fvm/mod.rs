pub mod form;
pub mod layout;
pub mod interpolation;
pub mod problem;
pub(crate) mod flow;
pub(crate) mod staggered;
pub(crate) mod collocated;
pub mod operator;
pub mod rhs;
pub mod time_integration;

pub use form::{LinearForm, Row};
pub use layout::SystemLayout;
pub use interpolation::{Discretization, FaceInterpolation, InterpolationScheme};
pub use problem::Problem;
pub use operator::{Operator, OperatorAssembler};
pub use rhs::RhsAssembler;
pub use time_integration::{TimeStepStats, TimeStepper};
