//! Poroelastic material model
//!
//! Raw property bundle (as supplied by the problem setup) and the derived
//! coupling constants consumed by the operator and RHS assemblers.

use serde::{Deserialize, Serialize};

use crate::error::{PoroError, Result};

/// Material/property bundle of a saturated porous medium
///
/// All moduli in Pa, densities in kg/m³, permeability in m², viscosity in Pa·s.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoroelasticProperties {
    pub shear_modulus: f64,
    /// Drained bulk modulus of the skeleton
    pub bulk_modulus: f64,
    pub solid_bulk_modulus: f64,
    pub solid_density: f64,
    pub fluid_bulk_modulus: f64,
    pub porosity: f64,
    pub permeability: f64,
    pub fluid_viscosity: f64,
    pub fluid_density: f64,
    /// Fracture ("macro") porosity for dual-porosity media
    #[serde(default)]
    pub macro_porosity: Option<f64>,
    /// Fracture ("macro") permeability for dual-porosity media
    #[serde(default)]
    pub macro_permeability: Option<f64>,
}

impl PoroelasticProperties {
    /// Gulf of Mexico sandstone, water saturated
    pub fn gulf_sand() -> Self {
        Self {
            shear_modulus: 6.0e9,
            bulk_modulus: 8.0e9,
            solid_bulk_modulus: 36.0e9,
            solid_density: 2650.0,
            fluid_bulk_modulus: 2.2e9,
            porosity: 0.19,
            permeability: 1.9e-13,
            fluid_viscosity: 1.0e-3,
            fluid_density: 1000.0,
            macro_porosity: None,
            macro_permeability: None,
        }
    }

    /// Reject zero or negative moduli, permeability, viscosity and densities
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("shear_modulus", self.shear_modulus),
            ("bulk_modulus", self.bulk_modulus),
            ("solid_bulk_modulus", self.solid_bulk_modulus),
            ("fluid_bulk_modulus", self.fluid_bulk_modulus),
            ("permeability", self.permeability),
            ("fluid_viscosity", self.fluid_viscosity),
            ("solid_density", self.solid_density),
            ("fluid_density", self.fluid_density),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(PoroError::config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.porosity > 0.0 && self.porosity < 1.0) {
            return Err(PoroError::config(format!(
                "porosity must be in (0, 1), got {}",
                self.porosity
            )));
        }
        if let Some(k) = self.macro_permeability {
            if !(k > 0.0) {
                return Err(PoroError::config(format!(
                    "macro_permeability must be positive, got {}",
                    k
                )));
            }
        }
        if let Some(phi) = self.macro_porosity {
            if !(phi > 0.0 && phi + self.porosity < 1.0) {
                return Err(PoroError::config(format!(
                    "macro_porosity must be positive and leave room for the solid, got {}",
                    phi
                )));
            }
        }
        Ok(())
    }

    /// Biot coefficient α = 1 − K_b / K_s
    pub fn biot_coefficient(&self) -> f64 {
        1.0 - self.bulk_modulus / self.solid_bulk_modulus
    }

    /// Lamé's first parameter λ = K_b − 2G/3
    pub fn lame_parameter(&self) -> f64 {
        self.bulk_modulus - 2.0 * self.shear_modulus / 3.0
    }
}

/// Material and coupling constants of the discretized balance equations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// G (Pa)
    pub shear_modulus: f64,
    /// λ (Pa)
    pub lame: f64,
    /// α (-)
    pub biot: f64,
    /// K (m²)
    pub permeability: f64,
    /// μ_f (Pa·s)
    pub viscosity: f64,
    /// 1/Q (1/Pa)
    pub storage: f64,
    /// ρ = φρ_f + (1−φ)ρ_s (kg/m³)
    pub bulk_density: f64,
    /// ρ_f (kg/m³)
    pub fluid_density: f64,
    /// g (m/s²), acting in −y
    pub gravity: f64,
}

impl Coefficients {
    /// Derive the coupling constants from a validated property bundle
    pub fn from_properties(props: &PoroelasticProperties, gravity: f64) -> Result<Self> {
        props.validate()?;

        let alpha = props.biot_coefficient();
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(PoroError::config(format!(
                "Biot coefficient must be in (0, 1], got {} (bulk modulus exceeds solid bulk modulus?)",
                alpha
            )));
        }

        let c_f = 1.0 / props.fluid_bulk_modulus;
        let c_s = 1.0 / props.solid_bulk_modulus;
        let phi = props.porosity;

        let coefficients = Self {
            shear_modulus: props.shear_modulus,
            lame: props.lame_parameter(),
            biot: alpha,
            permeability: props.permeability,
            viscosity: props.fluid_viscosity,
            storage: phi * c_f + (alpha - phi) * c_s,
            bulk_density: phi * props.fluid_density + (1.0 - phi) * props.solid_density,
            fluid_density: props.fluid_density,
            gravity,
        };
        coefficients.validate()?;
        Ok(coefficients)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.shear_modulus > 0.0) {
            return Err(PoroError::config("shear modulus must be positive"));
        }
        if !(self.longitudinal_modulus() > 0.0) {
            return Err(PoroError::config("longitudinal modulus λ + 2G must be positive"));
        }
        if !(self.permeability > 0.0) || !(self.viscosity > 0.0) {
            return Err(PoroError::config("permeability and viscosity must be positive"));
        }
        if self.storage < 0.0 {
            return Err(PoroError::config("storage coefficient must be non-negative"));
        }
        Ok(())
    }

    /// Longitudinal (oedometric) modulus M = λ + 2G
    pub fn longitudinal_modulus(&self) -> f64 {
        self.lame + 2.0 * self.shear_modulus
    }

    /// Mobility K / μ_f
    pub fn mobility(&self) -> f64 {
        self.permeability / self.viscosity
    }

    /// Consolidation coefficient c = (K/μ) / (1/Q + α²/M)
    pub fn consolidation_coefficient(&self) -> f64 {
        self.mobility() / (self.storage + self.biot * self.biot / self.longitudinal_modulus())
    }

    /// Pore pressure generated by an instantaneous one-dimensional load
    ///
    /// `load` is the vertical traction (negative in compression); the result is
    /// positive for a compressive load.
    pub fn undrained_pressure(&self, load: f64) -> f64 {
        -load * self.biot / (self.biot * self.biot + self.storage * self.longitudinal_modulus())
    }

    /// Vertical strain of a laterally confined column right after the load
    /// is applied, with no fluid drained
    pub fn undrained_strain(&self, load: f64) -> f64 {
        load * self.storage / (self.biot * self.biot + self.storage * self.longitudinal_modulus())
    }

    /// Smallest time step advised for the collocated schemes, h² / (6c)
    pub fn minimum_time_step(&self, h: f64) -> f64 {
        h * h / (6.0 * self.consolidation_coefficient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gulf_sand() -> PoroelasticProperties {
        PoroelasticProperties::gulf_sand()
    }

    #[test]
    fn test_derived_constants() {
        let props = gulf_sand();
        let c = Coefficients::from_properties(&props, 9.81).unwrap();

        assert_relative_eq!(c.biot, 1.0 - 8.0 / 36.0, epsilon = 1e-14);
        assert_relative_eq!(c.lame, 8.0e9 - 4.0e9, epsilon = 1e-3);
        assert_relative_eq!(c.longitudinal_modulus(), 16.0e9, epsilon = 1e-3);

        let storage = 0.19 / 2.2e9 + (c.biot - 0.19) / 36.0e9;
        assert_relative_eq!(c.storage, storage, max_relative = 1e-12);
        assert_relative_eq!(c.bulk_density, 0.19 * 1000.0 + 0.81 * 2650.0, epsilon = 1e-9);
    }

    #[test]
    fn test_undrained_pressure_balances_load() {
        let c = Coefficients::from_properties(&gulf_sand(), 0.0).unwrap();
        let load = -10.0e3;
        let p0 = c.undrained_pressure(load);
        assert!(p0 > 0.0);

        // Undrained: zero fluid content change, total stress equals the load
        let strain = c.undrained_strain(load);
        assert_relative_eq!(c.storage * p0 + c.biot * strain, 0.0, epsilon = 1e-20);
        let total = c.longitudinal_modulus() * strain - c.biot * p0;
        assert_relative_eq!(total, load, max_relative = 1e-12);
    }

    #[test]
    fn test_non_positive_permeability_rejected() {
        let mut props = gulf_sand();
        props.permeability = 0.0;
        assert!(Coefficients::from_properties(&props, 0.0).is_err());

        let mut props = gulf_sand();
        props.fluid_viscosity = -1.0;
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_bulk_stiffer_than_grains_rejected() {
        let mut props = gulf_sand();
        props.bulk_modulus = 40.0e9;
        assert!(Coefficients::from_properties(&props, 0.0).is_err());
    }
}
