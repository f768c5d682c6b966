pub mod polygon;
pub mod grid;
pub mod fields;

pub use polygon::Polygon;
pub use grid::{Arrangement, FaceStatus, IndexMap, Mesh, MeshBuilder, Quantity};
pub use fields::FieldSet;
