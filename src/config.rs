//! Run configuration
//!
//! Reads a TOML file describing one poroelastic run (grid, time horizon,
//! discretization, material, boundary tables and initial state) and turns it
//! into the validated inputs of the time stepper.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bc::{BoundaryConditions, BoundaryPatch, BoundaryTable};
use crate::error::{PoroError, Result};
use crate::fvm::{Discretization, Problem};
use crate::mechanics::{Coefficients, DualPorosity, PoroelasticProperties, PorosityModel};
use crate::mesh::{FieldSet, Mesh, MeshBuilder, Quantity};

/// Main run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Print the factorization report and one line per step
    #[serde(default)]
    pub verbose: bool,
    pub grid: GridConfig,
    pub time: TimeConfig,
    #[serde(default)]
    pub discretization: DiscretizationConfig,
    pub properties: PoroelasticProperties,
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub initial: InitialConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    /// Number of columns
    pub nx: usize,
    /// Number of rows
    pub ny: usize,
    /// Domain width (m)
    pub width: f64,
    /// Domain height (m)
    pub height: f64,
    /// Domain outline as [x, y] vertices; the full rectangle when absent
    #[serde(default)]
    pub polygon: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeConfig {
    /// Number of time levels (the run takes steps - 1 steps)
    pub steps: usize,
    /// Simulated horizon (s)
    pub total_time: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscretizationConfig {
    #[serde(default = "default_arrangement")]
    pub arrangement: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_arrangement() -> String { "staggered".to_string() }
fn default_scheme() -> String { "none".to_string() }

impl Default for DiscretizationConfig {
    fn default() -> Self {
        Self {
            arrangement: default_arrangement(),
            scheme: default_scheme(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoundaryConfig {
    /// 4×K codes (north, west, south, east): 1 Dirichlet, 0 Neumann, -1 stress/flux
    pub types: Vec<Vec<i32>>,
    /// 4×K prescribed values, same shape as `types`
    pub values: Vec<Vec<f64>>,
    /// Span overrides applied after the table, in order
    #[serde(default)]
    pub patches: Vec<BoundaryPatch>,
    /// Strip footing on the north side, applied after the patches
    #[serde(default)]
    pub strip: Option<StripLoad>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct StripLoad {
    /// Loaded width from x = 0 (m)
    pub width: f64,
    /// Vertical traction on the loaded span (Pa, negative in compression)
    pub load: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PhysicsConfig {
    /// Gravitational acceleration (m/s²), acting in -y
    #[serde(default)]
    pub gravity: f64,
    /// Enables the pore + fracture model when present
    #[serde(default)]
    pub dual_porosity: Option<DualPorosityConfig>,
}

/// Dual-porosity constants: explicit, or derived from the property bundle
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DualPorosityConfig {
    /// Leak shape factor (1/m²) used when deriving the constants
    #[serde(default)]
    pub shape_factor: Option<f64>,
    #[serde(default)]
    pub constants: Option<DualPorosity>,
}

/// Uniform initial values
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InitialConfig {
    #[serde(default)]
    pub u: f64,
    #[serde(default)]
    pub v: f64,
    /// Initial pore pressure (Pa)
    #[serde(default)]
    pub pressure: Option<f64>,
    /// Initial fracture pressure; defaults to the pore pressure
    #[serde(default)]
    pub macro_pressure: Option<f64>,
    /// Start from the undrained response of a confined column to this vertical
    /// load: pressure replaces `pressure`, the strain is added to `v`
    #[serde(default)]
    pub undrained_load: Option<f64>,
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn discretization(&self) -> Result<Discretization> {
        Discretization::parse(&self.discretization.arrangement, &self.discretization.scheme)
    }

    /// Build the mesh with the arrangement implied by the discretization
    pub fn build_mesh(&self) -> Result<Mesh> {
        let discretization = self.discretization()?;
        let mut builder = MeshBuilder::new(
            self.grid.nx,
            self.grid.ny,
            self.grid.width,
            self.grid.height,
        )
        .time(self.time.steps, self.time.total_time)
        .arrangement(discretization.arrangement());
        if let Some(vertices) = &self.grid.polygon {
            builder = builder.polygon(vertices.iter().map(|v| (v[0], v[1])).collect());
        }
        builder.build()
    }

    pub fn coefficients(&self) -> Result<Coefficients> {
        if !self.physics.gravity.is_finite() || self.physics.gravity < 0.0 {
            return Err(PoroError::config(format!(
                "gravity must be a non-negative magnitude, got {}",
                self.physics.gravity
            )));
        }
        Coefficients::from_properties(&self.properties, self.physics.gravity)
    }

    pub fn porosity_model(&self) -> Result<PorosityModel> {
        let Some(dual) = &self.physics.dual_porosity else {
            return Ok(PorosityModel::Single);
        };
        let constants = match (&dual.constants, dual.shape_factor) {
            (Some(constants), _) => {
                constants.validate()?;
                *constants
            }
            (None, shape_factor) => {
                DualPorosity::from_properties(&self.properties, shape_factor.unwrap_or(1.0))?
            }
        };
        Ok(PorosityModel::Double(constants))
    }

    pub fn boundary_conditions(&self) -> Result<BoundaryConditions> {
        let table = BoundaryTable::from_codes(&self.boundary.types, &self.boundary.values)?;
        let mut conditions = BoundaryConditions::new(table);
        for patch in &self.boundary.patches {
            conditions = conditions.with_patch(*patch);
        }
        if let Some(strip) = self.boundary.strip {
            if !(strip.width > 0.0) {
                return Err(PoroError::config(format!(
                    "strip width must be positive, got {}",
                    strip.width
                )));
            }
            conditions = conditions.with_strip_load(strip.width, strip.load);
        }
        Ok(conditions)
    }

    /// Validate everything and assemble the inputs of one run
    pub fn problem(&self) -> Result<Problem> {
        Problem::new(
            self.build_mesh()?,
            self.discretization()?,
            self.boundary_conditions()?,
            self.coefficients()?,
            self.porosity_model()?,
        )
    }

    /// Uniform initial state for a problem built from this configuration
    pub fn initial_fields(&self, problem: &Problem) -> Result<FieldSet> {
        let mut fields = problem.zero_fields();
        fields.fill(Quantity::U, self.initial.u)?;
        fields.fill(Quantity::V, self.initial.v)?;

        let pressure = match (self.initial.undrained_load, self.initial.pressure) {
            (Some(load), _) => problem.coefficients.undrained_pressure(load),
            (None, Some(p)) => p,
            (None, None) => 0.0,
        };
        if let Some(load) = self.initial.undrained_load {
            // Column compressed against a fixed base at y = 0
            let strain = problem.coefficients.undrained_strain(load);
            for &(r, c) in problem.mesh.map(Quantity::V).coordinates() {
                let (_, y) = problem.mesh.position(Quantity::V, r, c);
                fields.v[(r, c)] += strain * y;
            }
        }
        fields.fill(Quantity::P, pressure)?;
        if fields.pressure_count() == 2 {
            fields.fill(Quantity::PMacro, self.initial.macro_pressure.unwrap_or(pressure))?;
        }
        Ok(fields)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("═══════════════════════════════════════════════════════════════");
        println!("  Poroelastic Run Configuration");
        println!("═══════════════════════════════════════════════════════════════");
        println!("Grid:");
        println!("  Size: {:.3} × {:.3} m", self.grid.width, self.grid.height);
        println!(
            "  Resolution: {} × {} cells (dx = {:.4}, dy = {:.4} m)",
            self.grid.nx,
            self.grid.ny,
            self.grid.width / self.grid.nx.max(1) as f64,
            self.grid.height / self.grid.ny.max(1) as f64
        );
        if let Some(polygon) = &self.grid.polygon {
            println!("  Polygon: {} vertices", polygon.len());
        }

        println!("\nTime:");
        println!("  Levels: {}", self.time.steps);
        println!("  Horizon: {:.4e} s", self.time.total_time);
        if self.time.steps > 1 {
            println!("  dt: {:.4e} s", self.time.total_time / (self.time.steps - 1) as f64);
        }

        println!("\nDiscretization:");
        println!(
            "  {} / {}",
            self.discretization.arrangement, self.discretization.scheme
        );

        println!("\nMaterial:");
        println!(
            "  G = {:.3e} Pa, K = {:.3e} Pa, φ = {:.3}",
            self.properties.shear_modulus, self.properties.bulk_modulus, self.properties.porosity
        );
        println!(
            "  k = {:.3e} m², μ = {:.3e} Pa·s",
            self.properties.permeability, self.properties.fluid_viscosity
        );
        if let Ok(c) = self.coefficients() {
            println!(
                "  α = {:.3}, 1/Q = {:.3e} 1/Pa, c = {:.3e} m²/s",
                c.biot,
                c.storage,
                c.consolidation_coefficient()
            );
        }
        if self.physics.dual_porosity.is_some() {
            println!("  Dual porosity: enabled");
        }

        println!("\nBoundary:");
        for (row, name) in ["north", "west", "south", "east"].iter().enumerate() {
            if let (Some(types), Some(values)) =
                (self.boundary.types.get(row), self.boundary.values.get(row))
            {
                println!("  {:5}: types {:?} values {:?}", name, types, values);
            }
        }
        if !self.boundary.patches.is_empty() {
            println!("  {} patch override(s)", self.boundary.patches.len());
        }
        if let Some(strip) = self.boundary.strip {
            println!("  Strip load {:.3e} Pa over {:.3} m", strip.load, strip.width);
        }

        println!("═══════════════════════════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bc::{BoundaryKind, Side};
    use approx::assert_relative_eq;

    const TERZAGHI: &str = r#"
        [grid]
        nx = 1
        ny = 12
        width = 1.0
        height = 6.0

        [time]
        steps = 11
        total_time = 100.0

        [discretization]
        arrangement = "staggered"
        scheme = "none"

        [properties]
        shear_modulus = 6.0e9
        bulk_modulus = 8.0e9
        solid_bulk_modulus = 36.0e9
        solid_density = 2650.0
        fluid_bulk_modulus = 2.2e9
        porosity = 0.19
        permeability = 1.9e-13
        fluid_viscosity = 1.0e-3
        fluid_density = 1000.0

        [boundary]
        types = [[-1, -1, 1], [1, -1, -1], [-1, 1, 0], [1, -1, -1]]
        values = [[0.0, -1.0e4, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]

        [initial]
        undrained_load = -1.0e4
    "#;

    #[test]
    fn test_parse_and_build() {
        let config = RunConfig::from_toml_str(TERZAGHI).unwrap();
        assert!(!config.verbose);

        let problem = config.problem().unwrap();
        assert_eq!(problem.mesh.ny, 12);
        assert_relative_eq!(problem.mesh.dt, 10.0, epsilon = 1e-12);
        assert_eq!(problem.discretization, Discretization::Staggered);
        assert_eq!(problem.porosity, PorosityModel::Single);

        let north_v = problem.conditions.condition(Side::North, Quantity::V, 0.5).unwrap();
        assert_eq!(north_v.kind, BoundaryKind::Stress);
        assert_eq!(north_v.value, -1.0e4);

        let fields = config.initial_fields(&problem).unwrap();
        let p0 = problem.coefficients.undrained_pressure(-1.0e4);
        assert_relative_eq!(fields.p[(3, 0)], p0, max_relative = 1e-12);
        let strain = problem.coefficients.undrained_strain(-1.0e4);
        assert_eq!(fields.v[(0, 0)], 0.0);
        assert_relative_eq!(fields.v[(12, 0)], 6.0 * strain, max_relative = 1e-12);
    }

    #[test]
    fn test_unknown_boundary_code_rejected() {
        let text = TERZAGHI.replace("[[-1, -1, 1]", "[[2, -1, 1]");
        let config = RunConfig::from_toml_str(&text).unwrap();
        assert!(matches!(config.problem(), Err(PoroError::Config(_))));
    }

    #[test]
    fn test_scheme_under_staggered_rejected() {
        let text = TERZAGHI.replace("scheme = \"none\"", "scheme = \"centered\"");
        let config = RunConfig::from_toml_str(&text).unwrap();
        assert!(matches!(config.problem(), Err(PoroError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            RunConfig::from_toml_str("[grid\nnx = 1"),
            Err(PoroError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            RunConfig::from_file("/nonexistent/run.toml"),
            Err(PoroError::Io(_))
        ));
    }

    #[test]
    fn test_dual_porosity_and_strip() {
        let text = TERZAGHI
            .replace(
                "types = [[-1, -1, 1], [1, -1, -1], [-1, 1, 0], [1, -1, -1]]",
                "types = [[-1, -1, 1, 1], [1, -1, -1, -1], [-1, 1, 0, 0], [1, -1, -1, -1]]",
            )
            .replace(
                "values = [[0.0, -1.0e4, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]",
                "values = [[0.0, -1.0e4, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]]\n\
                 strip = { width = 0.5, load = -2.0e4 }",
            )
            .replace(
                "fluid_density = 1000.0",
                "fluid_density = 1000.0\nmacro_porosity = 0.05\nmacro_permeability = 1.0e-12\n\n[physics]\ndual_porosity = { shape_factor = 2.0 }",
            );
        let config = RunConfig::from_toml_str(&text).unwrap();
        let problem = config.problem().unwrap();
        assert_eq!(problem.porosity.pressure_count(), 2);

        let loaded = problem.conditions.condition(Side::North, Quantity::V, 0.25).unwrap();
        assert_eq!(loaded.value, -2.0e4);
        let drained = problem.conditions.condition(Side::North, Quantity::PMacro, 0.75).unwrap();
        assert_eq!(drained.kind, BoundaryKind::Dirichlet);

        let fields = config.initial_fields(&problem).unwrap();
        assert_eq!(fields.pressure_count(), 2);
        assert_eq!(fields.p_macro.as_ref().unwrap()[(0, 0)], fields.p[(0, 0)]);
    }
}
